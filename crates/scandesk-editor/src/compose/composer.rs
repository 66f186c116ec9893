// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composer: places session pages on the output page and applies the
// toolbar commands (rotate, duplicate, delete) on top of the pointer state
// machine.

use scandesk_core::config::ComposerConfig;
use scandesk_core::error::{Result, ScanError};
use scandesk_core::{ItemId, OutputPage, PlacedItem, Point};
use scandesk_document::ProcessedPage;
use tracing::{debug, info, warn};

use crate::compose::interaction::{self, ComposerState, Effect, PointerEvent, Viewport};
use crate::session::Session;

/// Owns the composition and keeps it consistent with a `Session`.
#[derive(Debug, Clone)]
pub struct Composer {
    state: ComposerState,
}

impl Composer {
    pub fn new(page: OutputPage, config: ComposerConfig) -> Self {
        Self {
            state: ComposerState::new(page, config),
        }
    }

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    pub fn page(&self) -> &OutputPage {
        &self.state.page
    }

    pub fn items(&self) -> &[PlacedItem] {
        &self.state.items
    }

    pub fn item(&self, id: ItemId) -> Option<&PlacedItem> {
        self.state.item(id)
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.state.selected
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
    }

    /// Feed one pointer event through the state machine.
    pub fn handle(&mut self, event: PointerEvent) -> Vec<Effect> {
        let (next, effects) = interaction::step(&self.state, event);
        self.state = next;
        effects
    }

    /// Bring items in line with `session`: drop items whose page is gone and
    /// place every page that has no item yet. Returns the ids of new items.
    pub fn sync(&mut self, session: &Session) -> Vec<ItemId> {
        let before = self.state.items.len();
        self.state.items.retain(|item| session.contains(item.page));
        let stale = before - self.state.items.len();
        if stale > 0 {
            warn!(stale, "Dropped items whose page left the session");
            let selected = self.state.selected;
            if selected.is_some_and(|id| self.state.item(id).is_none()) {
                self.state.selected = None;
            }
        }

        let mut added = Vec::new();
        for page in session.pages() {
            if self.state.items.iter().any(|item| item.page == page.id) {
                continue;
            }
            let item = self.placement(page, self.state.items.len());
            added.push(item.id);
            self.state.items.push(item);
        }
        if !added.is_empty() {
            info!(added = added.len(), total = self.state.items.len(), "Placed new pages");
        }
        added
    }

    /// Default box for `page` as the `index`th item: a fixed fraction of the
    /// page width, aspect kept, centered horizontally and stacked downward.
    fn placement(&self, page: &ProcessedPage, index: usize) -> PlacedItem {
        let config = &self.state.config;
        let out = &self.state.page;
        let (pw, ph) = page.display_dimensions();
        let width = out.width_px as f64 * config.default_width_fraction;
        let height = if pw == 0 {
            width
        } else {
            width * ph as f64 / pw as f64
        };

        let stacked = config.stack_start_y + index as f64 * config.stack_step_y;
        let y = if stacked > out.height_px as f64 - height {
            config.overflow_y
        } else {
            stacked
        };

        PlacedItem {
            id: ItemId::new(),
            page: page.id,
            x: (out.width_px as f64 - width) / 2.0,
            y,
            width,
            height,
            rotation: 0.0,
            z_index: index as i32 + 1,
        }
    }

    pub fn select(&mut self, id: ItemId) -> Result<()> {
        if self.state.item(id).is_none() {
            return Err(ScanError::ItemNotFound(id));
        }
        self.state.selected = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.state.selected = None;
    }

    /// Turn the selected item by `degrees`, normalised to [0, 360).
    /// Returns `false` when nothing is selected.
    pub fn rotate_selected(&mut self, degrees: f64) -> bool {
        let Some(id) = self.state.selected else {
            return false;
        };
        let Some(item) = self.state.items.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        item.rotation = (item.rotation + degrees).rem_euclid(360.0);
        debug!(%id, rotation = item.rotation, "Rotated item");
        true
    }

    /// Copy the selected item and its page. The copy is offset, stacked on
    /// top of everything and becomes the selection.
    pub fn duplicate_selected(&mut self, session: &mut Session) -> Result<Option<ItemId>> {
        let Some(id) = self.state.selected else {
            return Ok(None);
        };
        let original = *self.state.item(id).ok_or(ScanError::ItemNotFound(id))?;
        let page = session.get(original.page)?.duplicate();

        let offset = self.state.config.duplicate_offset;
        let top = self.state.items.iter().map(|i| i.z_index).max().unwrap_or(0);
        let copy = PlacedItem {
            id: ItemId::new(),
            page: session.add(page),
            x: original.x + offset,
            y: original.y + offset,
            z_index: top + 1,
            ..original
        };
        self.state.items.push(copy);
        self.state.selected = Some(copy.id);
        debug!(from = %id, to = %copy.id, "Duplicated item");
        Ok(Some(copy.id))
    }

    /// Remove the selected item together with its page.
    pub fn delete_selected(&mut self, session: &mut Session) -> Result<Option<ProcessedPage>> {
        let Some(id) = self.state.selected.take() else {
            return Ok(None);
        };
        let position = self
            .state
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(ScanError::ItemNotFound(id))?;
        let item = self.state.items.remove(position);
        if self.state.interaction.item() == Some(id) {
            self.state.interaction = interaction::Interaction::Idle;
        }
        let page = session.remove(item.page)?;
        debug!(%id, page = %item.page, "Deleted item and its page");
        Ok(Some(page))
    }

    /// Items in on-screen paint order: ascending z-index, the selection last.
    pub fn view_order(&self) -> Vec<&PlacedItem> {
        let mut ordered: Vec<&PlacedItem> = self.state.items.iter().collect();
        let selected = self.state.selected;
        ordered.sort_by_key(|item| (Some(item.id) == selected, item.z_index));
        ordered
    }

    /// Items in export paint order: ascending z-index, ties by insertion.
    pub fn export_order(&self) -> Vec<&PlacedItem> {
        let mut ordered: Vec<&PlacedItem> = self.state.items.iter().collect();
        ordered.sort_by_key(|item| item.z_index);
        ordered
    }

    /// Where the rotate handle and the item center sit on screen.
    pub fn screen_center(&self, id: ItemId) -> Option<Point> {
        self.state
            .item(id)
            .map(|item| self.state.viewport.to_screen(item.center()))
    }
}
