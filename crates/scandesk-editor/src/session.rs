// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session arena: every ProcessedPage of the current session, keyed by id.
// Placed items refer to pages by id only, so removing a page can never leave
// a dangling reference; lookups just start failing.

use std::collections::HashMap;

use scandesk_core::PageId;
use scandesk_core::error::{Result, ScanError};
use scandesk_document::ProcessedPage;
use tracing::debug;

/// In-memory page store with stable insertion order.
#[derive(Debug, Default, Clone)]
pub struct Session {
    pages: HashMap<PageId, ProcessedPage>,
    order: Vec<PageId>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `page` and return its id.
    pub fn add(&mut self, page: ProcessedPage) -> PageId {
        let id = page.id;
        if self.pages.insert(id, page).is_none() {
            self.order.push(id);
        }
        debug!(%id, pages = self.order.len(), "Page added to session");
        id
    }

    pub fn get(&self, id: PageId) -> Result<&ProcessedPage> {
        self.pages.get(&id).ok_or(ScanError::PageNotFound(id))
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.pages.contains_key(&id)
    }

    /// Swap in new contents for an existing page, keeping its id and slot.
    pub fn replace(&mut self, id: PageId, mut page: ProcessedPage) -> Result<()> {
        let slot = self.pages.get_mut(&id).ok_or(ScanError::PageNotFound(id))?;
        page.id = id;
        *slot = page;
        Ok(())
    }

    pub fn remove(&mut self, id: PageId) -> Result<ProcessedPage> {
        let page = self.pages.remove(&id).ok_or(ScanError::PageNotFound(id))?;
        self.order.retain(|p| *p != id);
        debug!(%id, pages = self.order.len(), "Page removed from session");
        Ok(page)
    }

    /// Pages in insertion order.
    pub fn pages(&self) -> impl Iterator<Item = &ProcessedPage> {
        self.order.iter().filter_map(|id| self.pages.get(id))
    }

    pub fn ids(&self) -> &[PageId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
