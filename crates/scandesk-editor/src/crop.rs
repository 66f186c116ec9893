// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interactive crop editor: four draggable corner handles in normalized
// image coordinates, one pointer at a time.

use scandesk_core::{Corner, Corners, Point};
use tracing::{debug, trace};

/// Hit radius around a handle, in screen pixels.
pub const HANDLE_RADIUS: f64 = 24.0;

/// Inset of the default quadrilateral, as a fraction of each side.
pub const DEFAULT_INSET: f64 = 0.1;

/// Host-assigned pointer identifier.
pub type PointerId = u64;

/// Where the image is drawn on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ImageBox {
    /// Screen point to normalized image coordinates, clamped to the unit
    /// square.
    pub fn normalize(&self, screen: Point) -> Point {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Point::new(0.0, 0.0);
        }
        Point::new(
            (screen.x - self.left) / self.width,
            (screen.y - self.top) / self.height,
        )
        .clamp_unit()
    }

    pub fn to_screen(&self, normalized: Point) -> Point {
        Point::new(
            self.left + normalized.x * self.width,
            self.top + normalized.y * self.height,
        )
    }
}

/// Normalized corners to absolute pixels of a `width` x `height` image.
pub fn to_absolute(normalized: &Corners, width: u32, height: u32) -> Corners {
    normalized.scaled(width as f64, height as f64)
}

/// Absolute corners to normalized coordinates, clamped to the unit square.
pub fn from_absolute(absolute: &Corners, width: u32, height: u32) -> Corners {
    if width == 0 || height == 0 {
        return Corners::inset(1.0, 1.0, DEFAULT_INSET);
    }
    let scaled = absolute.scaled(1.0 / width as f64, 1.0 / height as f64);
    Corners::from_array(scaled.to_array().map(Point::clamp_unit))
}

type Observer = Box<dyn FnMut(&Corners) + Send>;

/// Corner-drag state machine.
///
/// Corners are `None` until the image loads or the host supplies them. At
/// most one corner is dragged at a time, by the pointer that grabbed it.
pub struct CropEditor {
    corners: Option<Corners>,
    dragging: Option<(Corner, PointerId)>,
    image_box: Option<ImageBox>,
    observer: Option<Observer>,
}

impl std::fmt::Debug for CropEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CropEditor")
            .field("corners", &self.corners)
            .field("dragging", &self.dragging)
            .field("image_box", &self.image_box)
            .finish_non_exhaustive()
    }
}

impl CropEditor {
    /// An editor with optional starting corners (normalized).
    pub fn new(initial: Option<Corners>) -> Self {
        Self {
            corners: initial.map(|c| Corners::from_array(c.to_array().map(Point::clamp_unit))),
            dragging: None,
            image_box: None,
            observer: None,
        }
    }

    /// Register the callback invoked whenever corners change.
    pub fn on_change(&mut self, observer: impl FnMut(&Corners) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn corners(&self) -> Option<&Corners> {
        self.corners.as_ref()
    }

    pub fn dragging(&self) -> Option<Corner> {
        self.dragging.map(|(corner, _)| corner)
    }

    /// Replace the corners wholesale (for instance from the estimator).
    pub fn set_corners(&mut self, corners: Corners) {
        let corners = Corners::from_array(corners.to_array().map(Point::clamp_unit));
        self.corners = Some(corners);
        self.notify();
    }

    /// The image finished loading and is drawn at `image_box`. Without
    /// corners this installs the default inset rectangle and notifies.
    pub fn image_loaded(&mut self, image_box: ImageBox) {
        self.image_box = Some(image_box);
        if self.corners.is_none() {
            debug!("No corners supplied; using default inset");
            self.corners = Some(Corners::inset(1.0, 1.0, DEFAULT_INSET));
            self.notify();
        }
    }

    /// The image was laid out again (window resize and the like).
    pub fn image_resized(&mut self, image_box: ImageBox) {
        self.image_box = Some(image_box);
    }

    /// The handle under `screen`, if any. Nearest wins on overlap.
    pub fn handle_at(&self, screen: Point) -> Option<Corner> {
        let (corners, image_box) = (self.corners.as_ref()?, self.image_box.as_ref()?);
        Corner::ALL
            .iter()
            .map(|&c| (c, image_box.to_screen(corners.get(c)).distance(&screen)))
            .filter(|&(_, d)| d <= HANDLE_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }

    /// Start dragging `corner` with `pointer`. Refused (returns `false`)
    /// while another drag is active or before corners exist.
    pub fn pointer_down(&mut self, corner: Corner, pointer: PointerId) -> bool {
        if self.dragging.is_some() || self.corners.is_none() {
            return false;
        }
        trace!(?corner, pointer, "Corner captured");
        self.dragging = Some((corner, pointer));
        true
    }

    /// Move the dragged corner to `screen`. Moves from any other pointer,
    /// or with no drag active, are ignored. Returns whether corners changed.
    pub fn pointer_move(&mut self, pointer: PointerId, screen: Point) -> bool {
        let Some((corner, owner)) = self.dragging else {
            return false;
        };
        if owner != pointer {
            return false;
        }
        let (Some(image_box), Some(corners)) = (self.image_box, self.corners.as_mut()) else {
            return false;
        };
        corners.set(corner, image_box.normalize(screen));
        self.notify();
        true
    }

    /// Release the capture held by `pointer`.
    pub fn pointer_up(&mut self, pointer: PointerId) -> bool {
        match self.dragging {
            Some((_, owner)) if owner == pointer => {
                self.dragging = None;
                true
            }
            _ => false,
        }
    }

    /// Current corners in absolute pixels of a `width` x `height` image.
    pub fn absolute_corners(&self, width: u32, height: u32) -> Option<Corners> {
        self.corners.map(|c| to_absolute(&c, width, height))
    }

    fn notify(&mut self) {
        if let (Some(observer), Some(corners)) = (self.observer.as_mut(), self.corners.as_ref()) {
            observer(corners);
        }
    }
}
