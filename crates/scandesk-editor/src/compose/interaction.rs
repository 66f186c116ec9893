// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composer pointer interaction as a pure transition function.
//
// The host turns device events into `PointerEvent`s (screen coordinates),
// calls `step`, stores the returned state and performs the effects
// (pointer capture, guide lines, repaint). Nothing here touches a UI.

use scandesk_core::config::ComposerConfig;
use scandesk_core::{Corner, ItemId, OutputPage, PlacedItem, Point};
use tracing::{debug, trace, warn};

/// Page-to-screen mapping: `screen = origin + page * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub origin: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin: Point::new(0.0, 0.0),
        }
    }
}

impl Viewport {
    const MARGIN: f64 = 40.0;
    const MOBILE_BREAKPOINT: f64 = 768.0;

    /// Zoom that fits `page` into a container of the given size. Narrow
    /// containers fit the width at 85%; wider ones fit the whole page at
    /// 90%. Never zooms past 1:1.
    pub fn fit(page: &OutputPage, container_width: f64, container_height: f64, origin: Point) -> Self {
        let fit_w = (container_width - Self::MARGIN) / page.width_px as f64;
        let fit_h = (container_height - Self::MARGIN) / page.height_px as f64;
        let scale = if container_width < Self::MOBILE_BREAKPOINT {
            (fit_w * 0.85).min(1.0)
        } else {
            fit_h.min(fit_w).min(1.0) * 0.9
        };
        Self {
            scale: scale.max(f64::EPSILON),
            origin,
        }
    }

    pub fn to_screen(&self, page: Point) -> Point {
        Point::new(
            self.origin.x + page.x * self.scale,
            self.origin.y + page.y * self.scale,
        )
    }
}

/// The part of an item the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Body,
    Resize(Corner),
    Rotate,
}

/// Device-agnostic pointer input, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { item: ItemId, handle: Handle, at: Point },
    Move { at: Point },
    Up,
    /// Press on the empty page or outside it.
    BackgroundDown,
}

/// Center guide lines shown while dragging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guides {
    /// Vertical line through the page's horizontal center.
    pub x: bool,
    /// Horizontal line through the page's vertical center.
    pub y: bool,
}

/// Work the host must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Selected(Option<ItemId>),
    CapturePointer,
    ReleasePointer,
    Guides(Guides),
    ItemChanged(ItemId),
}

/// The one pointer interaction in flight, with the item as it was at
/// pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Drag {
        start: Point,
        initial: PlacedItem,
    },
    Resize {
        corner: Corner,
        start: Point,
        initial: PlacedItem,
    },
    Rotate {
        center: Point,
        start_angle: f64,
        initial: PlacedItem,
    },
}

impl Interaction {
    pub fn item(&self) -> Option<ItemId> {
        match self {
            Self::Idle => None,
            Self::Drag { initial, .. }
            | Self::Resize { initial, .. }
            | Self::Rotate { initial, .. } => Some(initial.id),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Everything the transition function reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerState {
    pub page: OutputPage,
    pub config: ComposerConfig,
    pub viewport: Viewport,
    pub items: Vec<PlacedItem>,
    pub selected: Option<ItemId>,
    pub interaction: Interaction,
    pub guides: Guides,
}

impl ComposerState {
    pub fn new(page: OutputPage, config: ComposerConfig) -> Self {
        Self {
            page,
            config,
            viewport: Viewport::default(),
            items: Vec::new(),
            selected: None,
            interaction: Interaction::Idle,
            guides: Guides::default(),
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&PlacedItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut PlacedItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }
}

/// Advance the composer by one pointer event.
pub fn step(state: &ComposerState, event: PointerEvent) -> (ComposerState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match event {
        PointerEvent::Down { item, handle, at } => {
            let Some(placed) = state.item(item).copied() else {
                warn!(%item, "Pointer down on an item that is no longer placed");
                return (next, effects);
            };
            next.interaction = begin(&state.viewport, placed, handle, at);
            next.guides = Guides::default();
            if next.selected != Some(item) {
                next.selected = Some(item);
                effects.push(Effect::Selected(Some(item)));
            }
            effects.push(Effect::CapturePointer);
            trace!(%item, ?handle, "Interaction started");
        }
        PointerEvent::Move { at } => {
            let Some(id) = state.interaction.item() else {
                return (next, effects);
            };
            let interaction = state.interaction;
            let (config, page, viewport) = (&state.config, &state.page, state.viewport);
            let Some(target) = next.item_mut(id) else {
                warn!(%id, "Dragged item vanished mid-interaction");
                next.interaction = Interaction::Idle;
                next.guides = Guides::default();
                effects.push(Effect::ReleasePointer);
                effects.push(Effect::Guides(Guides::default()));
                return (next, effects);
            };

            let guides = match interaction {
                Interaction::Idle => Guides::default(),
                Interaction::Drag { start, initial } => {
                    let (dx, dy) = page_delta(&viewport, start, at);
                    drag(target, &initial, dx, dy, page, config)
                }
                Interaction::Resize {
                    corner,
                    start,
                    initial,
                } => {
                    let (dx, dy) = page_delta(&viewport, start, at);
                    resize(target, &initial, corner, dx, dy, config);
                    Guides::default()
                }
                Interaction::Rotate {
                    center,
                    start_angle,
                    initial,
                } => {
                    rotate(target, &initial, center, start_angle, at, config);
                    Guides::default()
                }
            };

            if guides != next.guides {
                next.guides = guides;
                effects.push(Effect::Guides(guides));
            }
            effects.push(Effect::ItemChanged(id));
        }
        PointerEvent::Up => {
            if next.interaction.is_active() {
                next.interaction = Interaction::Idle;
                effects.push(Effect::ReleasePointer);
                if next.guides != Guides::default() {
                    next.guides = Guides::default();
                    effects.push(Effect::Guides(Guides::default()));
                }
            }
        }
        PointerEvent::BackgroundDown => {
            next.interaction = Interaction::Idle;
            next.guides = Guides::default();
            if next.selected.take().is_some() {
                effects.push(Effect::Selected(None));
            }
        }
    }

    (next, effects)
}

fn begin(viewport: &Viewport, initial: PlacedItem, handle: Handle, at: Point) -> Interaction {
    match handle {
        Handle::Body => Interaction::Drag { start: at, initial },
        Handle::Resize(corner) => Interaction::Resize {
            corner,
            start: at,
            initial,
        },
        Handle::Rotate => {
            let center = viewport.to_screen(initial.center());
            Interaction::Rotate {
                center,
                start_angle: (at.y - center.y).atan2(at.x - center.x),
                initial,
            }
        }
    }
}

/// Screen delta since pointer-down, in page pixels.
fn page_delta(viewport: &Viewport, start: Point, at: Point) -> (f64, f64) {
    (
        (at.x - start.x) / viewport.scale,
        (at.y - start.y) / viewport.scale,
    )
}

fn drag(
    item: &mut PlacedItem,
    initial: &PlacedItem,
    dx: f64,
    dy: f64,
    page: &OutputPage,
    config: &ComposerConfig,
) -> Guides {
    let target = page.center();
    let mut x = initial.x + dx;
    let mut y = initial.y + dy;
    let mut guides = Guides::default();

    if (x + item.width / 2.0 - target.x).abs() < config.snap_tolerance {
        x = target.x - item.width / 2.0;
        guides.x = true;
    }
    if (y + item.height / 2.0 - target.y).abs() < config.snap_tolerance {
        y = target.y - item.height / 2.0;
        guides.y = true;
    }

    item.x = x;
    item.y = y;
    if guides != Guides::default() {
        debug!(?guides, "Snapped to page center");
    }
    guides
}

fn resize(
    item: &mut PlacedItem,
    initial: &PlacedItem,
    corner: Corner,
    dx: f64,
    dy: f64,
    config: &ComposerConfig,
) {
    let (sin, cos) = initial.rotation.to_radians().sin_cos();
    // Pointer delta in the item's unrotated frame.
    let local_dx = dx * cos + dy * sin;

    let ratio = initial.aspect_ratio();
    let grown = match corner {
        Corner::BottomRight | Corner::TopRight => initial.width + local_dx,
        Corner::TopLeft | Corner::BottomLeft => initial.width - local_dx,
    };
    let width = grown.max(config.min_item_width);
    let height = width / ratio;

    let half_dw = (width - initial.width) / 2.0;
    let half_dh = (height - initial.height) / 2.0;
    let (shift_x, shift_y) = match corner {
        Corner::BottomRight => (half_dw, half_dh),
        Corner::TopLeft => (-half_dw, -half_dh),
        Corner::TopRight => (half_dw, -half_dh),
        Corner::BottomLeft => (-half_dw, half_dh),
    };

    // Moving the center by the rotated half-delta pins the opposite corner.
    let origin = initial.center();
    let center = Point::new(
        origin.x + shift_x * cos - shift_y * sin,
        origin.y + shift_x * sin + shift_y * cos,
    );
    item.width = width;
    item.height = height;
    item.set_center(center);
}

fn rotate(
    item: &mut PlacedItem,
    initial: &PlacedItem,
    center: Point,
    start_angle: f64,
    at: Point,
    config: &ComposerConfig,
) {
    let current = (at.y - center.y).atan2(at.x - center.x);
    let mut delta = (current - start_angle).to_degrees();
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta <= -180.0 {
        delta += 360.0;
    }
    item.rotation = snap_rotation(initial.rotation + delta, config.rotate_snap_degrees);
}

/// Snap `degrees` to the nearest multiple of 90 when strictly within
/// `tolerance` of it.
pub fn snap_rotation(degrees: f64, tolerance: f64) -> f64 {
    let nearest = (degrees / 90.0).round() * 90.0;
    if (degrees - nearest).abs() < tolerance {
        nearest
    } else {
        degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scandesk_core::PageId;

    fn item(x: f64, y: f64, w: f64, h: f64, rotation: f64) -> PlacedItem {
        PlacedItem {
            id: ItemId::new(),
            page: PageId::new(),
            x,
            y,
            width: w,
            height: h,
            rotation,
            z_index: 1,
        }
    }

    fn state_with(items: Vec<PlacedItem>) -> ComposerState {
        let mut state = ComposerState::new(OutputPage::a4(), ComposerConfig::default());
        state.items = items;
        state
    }

    fn run(state: ComposerState, events: &[PointerEvent]) -> (ComposerState, Vec<Effect>) {
        events.iter().fold((state, Vec::new()), |(s, mut all), e| {
            let (next, effects) = step(&s, *e);
            all.extend(effects);
            (next, all)
        })
    }

    fn corner_position(item: &PlacedItem, corner: Corner) -> Point {
        let (sin, cos) = item.rotation.to_radians().sin_cos();
        let (lx, ly) = match corner {
            Corner::TopLeft => (-item.width / 2.0, -item.height / 2.0),
            Corner::TopRight => (item.width / 2.0, -item.height / 2.0),
            Corner::BottomRight => (item.width / 2.0, item.height / 2.0),
            Corner::BottomLeft => (-item.width / 2.0, item.height / 2.0),
        };
        let c = item.center();
        Point::new(c.x + lx * cos - ly * sin, c.y + lx * sin + ly * cos)
    }

    #[test]
    fn down_selects_and_captures() {
        let placed = item(0.0, 0.0, 100.0, 100.0, 0.0);
        let (state, effects) = step(
            &state_with(vec![placed]),
            PointerEvent::Down {
                item: placed.id,
                handle: Handle::Body,
                at: Point::new(5.0, 5.0),
            },
        );
        assert_eq!(state.selected, Some(placed.id));
        assert_eq!(
            effects,
            vec![Effect::Selected(Some(placed.id)), Effect::CapturePointer]
        );
        assert!(state.interaction.is_active());
    }

    #[test]
    fn drag_divides_by_zoom() {
        let placed = item(100.0, 100.0, 200.0, 100.0, 0.0);
        let mut start = state_with(vec![placed]);
        start.viewport.scale = 0.25;
        let (state, _) = run(
            start,
            &[
                PointerEvent::Down {
                    item: placed.id,
                    handle: Handle::Body,
                    at: Point::new(50.0, 50.0),
                },
                PointerEvent::Move {
                    at: Point::new(60.0, 45.0),
                },
            ],
        );
        let moved = state.item(placed.id).unwrap();
        assert_eq!((moved.x, moved.y), (140.0, 80.0));
        assert_eq!(state.guides, Guides::default());
    }

    #[test]
    fn drag_near_center_snaps_exactly_on_both_axes() {
        // Center starts at (1100, 1600); page center is (1240, 1754).
        let placed = item(1000.0, 1500.0, 200.0, 200.0, 0.0);
        let (state, effects) = run(
            state_with(vec![placed]),
            &[
                PointerEvent::Down {
                    item: placed.id,
                    handle: Handle::Body,
                    at: Point::new(0.0, 0.0),
                },
                PointerEvent::Move {
                    at: Point::new(128.0, 166.0),
                },
            ],
        );
        let snapped = state.item(placed.id).unwrap();
        assert_eq!(snapped.center(), Point::new(1240.0, 1754.0));
        assert_eq!(state.guides, Guides { x: true, y: true });
        assert!(effects.contains(&Effect::Guides(Guides { x: true, y: true })));
    }

    #[test]
    fn snapping_is_per_axis_and_strict() {
        let placed = item(1000.0, 1000.0, 200.0, 200.0, 0.0);
        let (state, _) = run(
            state_with(vec![placed]),
            &[
                PointerEvent::Down {
                    item: placed.id,
                    handle: Handle::Body,
                    at: Point::new(0.0, 0.0),
                },
                // Center x lands 20 px off (not snapped), center y 600 px off.
                PointerEvent::Move {
                    at: Point::new(160.0, 0.0),
                },
            ],
        );
        assert_eq!(state.guides, Guides::default());
        assert_eq!(state.item(placed.id).unwrap().x, 1160.0);

        let (state, _) = step(
            &state,
            PointerEvent::Move {
                at: Point::new(145.0, 0.0),
            },
        );
        assert_eq!(state.guides, Guides { x: true, y: false });
        assert_eq!(state.item(placed.id).unwrap().center().x, 1240.0);
        assert_eq!(state.item(placed.id).unwrap().y, 1000.0);
    }

    #[test]
    fn resize_keeps_aspect_and_pins_opposite_corner() {
        for rotation in [0.0, 30.0, 90.0, 217.0] {
            for corner in Corner::ALL {
                let placed = item(800.0, 900.0, 400.0, 300.0, rotation);
                let opposite = match corner {
                    Corner::TopLeft => Corner::BottomRight,
                    Corner::TopRight => Corner::BottomLeft,
                    Corner::BottomRight => Corner::TopLeft,
                    Corner::BottomLeft => Corner::TopRight,
                };
                let pinned = corner_position(&placed, opposite);

                let (state, _) = run(
                    state_with(vec![placed]),
                    &[
                        PointerEvent::Down {
                            item: placed.id,
                            handle: Handle::Resize(corner),
                            at: Point::new(0.0, 0.0),
                        },
                        PointerEvent::Move {
                            at: Point::new(73.0, -41.0),
                        },
                        PointerEvent::Move {
                            at: Point::new(120.0, 95.0),
                        },
                    ],
                );
                let resized = state.item(placed.id).unwrap();
                assert!(
                    (resized.aspect_ratio() - 4.0 / 3.0).abs() < 1e-9,
                    "aspect drifted at {rotation} deg {corner:?}"
                );
                assert!(
                    corner_position(resized, opposite).distance(&pinned) < 1e-9,
                    "opposite corner moved at {rotation} deg {corner:?}"
                );
            }
        }
    }

    #[test]
    fn resize_clamps_to_min_width() {
        let placed = item(0.0, 0.0, 200.0, 100.0, 0.0);
        let (state, _) = run(
            state_with(vec![placed]),
            &[
                PointerEvent::Down {
                    item: placed.id,
                    handle: Handle::Resize(Corner::BottomRight),
                    at: Point::new(0.0, 0.0),
                },
                PointerEvent::Move {
                    at: Point::new(-500.0, 0.0),
                },
            ],
        );
        let resized = state.item(placed.id).unwrap();
        assert_eq!(resized.width, 50.0);
        assert_eq!(resized.height, 25.0);
        assert_eq!((resized.x, resized.y), (0.0, 0.0));
    }

    #[test]
    fn rotate_follows_pointer_angle_and_snaps() {
        // Screen center of the item at 1:1 is (200, 200).
        let placed = item(100.0, 100.0, 200.0, 200.0, 0.0);
        let down = PointerEvent::Down {
            item: placed.id,
            handle: Handle::Rotate,
            at: Point::new(200.0, 100.0),
        };
        let angle_to = |deg: f64| {
            let rad = (deg - 90.0).to_radians();
            PointerEvent::Move {
                at: Point::new(200.0 + 100.0 * rad.cos(), 200.0 + 100.0 * rad.sin()),
            }
        };

        let (state, _) = run(state_with(vec![placed]), &[down, angle_to(30.0)]);
        assert!((state.item(placed.id).unwrap().rotation - 30.0).abs() < 1e-9);

        let (state, _) = run(state_with(vec![placed]), &[down, angle_to(86.0)]);
        assert_eq!(state.item(placed.id).unwrap().rotation, 90.0);

        let (state, _) = run(state_with(vec![placed]), &[down, angle_to(-3.0)]);
        assert_eq!(state.item(placed.id).unwrap().rotation, 0.0);
    }

    #[test]
    fn snap_rotation_boundaries() {
        assert_eq!(snap_rotation(184.9, 5.0), 180.0);
        assert_eq!(snap_rotation(-94.0, 5.0), -90.0);
        assert_eq!(snap_rotation(275.0, 5.0), 275.0);
        assert_eq!(snap_rotation(45.0, 5.0), 45.0);
    }

    #[test]
    fn up_ends_interaction_and_clears_guides() {
        let placed = item(1000.0, 1500.0, 200.0, 200.0, 0.0);
        let (state, effects) = run(
            state_with(vec![placed]),
            &[
                PointerEvent::Down {
                    item: placed.id,
                    handle: Handle::Body,
                    at: Point::new(0.0, 0.0),
                },
                PointerEvent::Move {
                    at: Point::new(140.0, 154.0),
                },
                PointerEvent::Up,
            ],
        );
        assert_eq!(state.interaction, Interaction::Idle);
        assert_eq!(state.guides, Guides::default());
        assert!(effects.ends_with(&[Effect::ReleasePointer, Effect::Guides(Guides::default())]));

        // Moves after release do nothing.
        let (after, effects) = step(&state, PointerEvent::Move { at: Point::new(0.0, 0.0) });
        assert!(effects.is_empty());
        assert_eq!(after, state);
    }

    #[test]
    fn background_clears_selection() {
        let placed = item(0.0, 0.0, 10.0, 10.0, 0.0);
        let (state, effects) = run(
            state_with(vec![placed]),
            &[
                PointerEvent::Down {
                    item: placed.id,
                    handle: Handle::Body,
                    at: Point::new(0.0, 0.0),
                },
                PointerEvent::Up,
                PointerEvent::BackgroundDown,
            ],
        );
        assert_eq!(state.selected, None);
        assert_eq!(effects.last(), Some(&Effect::Selected(None)));
    }

    #[test]
    fn vanished_item_aborts_interaction() {
        let placed = item(0.0, 0.0, 10.0, 10.0, 0.0);
        let (mut state, _) = step(
            &state_with(vec![placed]),
            PointerEvent::Down {
                item: placed.id,
                handle: Handle::Body,
                at: Point::new(0.0, 0.0),
            },
        );
        state.items.clear();
        let (state, effects) = step(&state, PointerEvent::Move { at: Point::new(9.0, 9.0) });
        assert_eq!(state.interaction, Interaction::Idle);
        assert!(effects.contains(&Effect::ReleasePointer));
    }

    #[test]
    fn viewport_fit_matches_container() {
        let page = OutputPage::a4();
        let desktop = Viewport::fit(&page, 1440.0, 900.0, Point::new(0.0, 0.0));
        assert!((desktop.scale - (860.0 / 3508.0) * 0.9).abs() < 1e-12);

        let phone = Viewport::fit(&page, 390.0, 800.0, Point::new(0.0, 0.0));
        assert!((phone.scale - (350.0 / 2480.0) * 0.85).abs() < 1e-12);
    }
}
