// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scandesk scanning pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a processed page held by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an item placed on the output page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// -- Geometry -----------------------------------------------------------------

/// A 2D coordinate, either in absolute pixels or normalized to [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Clamp both coordinates into the unit square.
    pub fn clamp_unit(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One of the four corners of a quadrilateral or of a placed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// All corners in quadrilateral order (TL, TR, BR, BL).
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];
}

/// An ordered quadrilateral: top-left, top-right, bottom-right, bottom-left.
///
/// The ordering is load-bearing: the homography solver, the warp engine and
/// the crop editor all read corners positionally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Corners {
    pub fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Build from an array in TL, TR, BR, BL order.
    pub fn from_array(points: [Point; 4]) -> Self {
        Self::new(points[0], points[1], points[2], points[3])
    }

    /// Corners in TL, TR, BR, BL order.
    pub fn to_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Axis-aligned rectangle from `(0,0)` to `(width,height)`.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::new(
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        )
    }

    /// Rectangle inset by `fraction` of each dimension on every side.
    pub fn inset(width: f64, height: f64, fraction: f64) -> Self {
        let mx = width * fraction;
        let my = height * fraction;
        Self::new(
            Point::new(mx, my),
            Point::new(width - mx, my),
            Point::new(width - mx, height - my),
            Point::new(mx, height - my),
        )
    }

    pub fn get(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomRight => self.bottom_right,
            Corner::BottomLeft => self.bottom_left,
        }
    }

    pub fn set(&mut self, corner: Corner, point: Point) {
        match corner {
            Corner::TopLeft => self.top_left = point,
            Corner::TopRight => self.top_right = point,
            Corner::BottomRight => self.bottom_right = point,
            Corner::BottomLeft => self.bottom_left = point,
        }
    }

    /// Multiply every x by `sx` and every y by `sy`.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        let scale = |p: Point| Point::new(p.x * sx, p.y * sy);
        Self::new(
            scale(self.top_left),
            scale(self.top_right),
            scale(self.bottom_right),
            scale(self.bottom_left),
        )
    }

    pub fn top_edge(&self) -> f64 {
        self.top_left.distance(&self.top_right)
    }

    pub fn bottom_edge(&self) -> f64 {
        self.bottom_left.distance(&self.bottom_right)
    }

    pub fn left_edge(&self) -> f64 {
        self.top_left.distance(&self.bottom_left)
    }

    pub fn right_edge(&self) -> f64 {
        self.top_right.distance(&self.bottom_right)
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(Point::is_finite)
    }

    /// Axis-aligned bounding box as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.to_array().iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    }
}

// -- Edit state ---------------------------------------------------------------

/// Page rotation restricted to quarter turns (clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuarterTurn {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl QuarterTurn {
    pub fn degrees(self) -> u16 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Accepts any multiple of 90, negative values included.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Self::R0),
            90 => Some(Self::R90),
            180 => Some(Self::R180),
            _ => Some(Self::R270),
        }
    }

    /// The next quarter turn clockwise.
    pub fn clockwise(self) -> Self {
        match self {
            Self::R0 => Self::R90,
            Self::R90 => Self::R180,
            Self::R180 => Self::R270,
            Self::R270 => Self::R0,
        }
    }

    /// Whether rotating by this amount swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::R90 | Self::R270)
    }
}

/// Pixel adjustments applied when a page is baked.
///
/// Application order is fixed: auto-enhance, then brightness/contrast/grayscale,
/// then threshold, then rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// -100..=100, 0 is neutral.
    pub brightness: i32,
    /// -100..=100, 0 is neutral.
    pub contrast: i32,
    /// 0..=100 percent.
    pub grayscale: u8,
    /// Binarization level, 0 disables it.
    pub threshold: u8,
    /// The "magic" background whitening pass.
    pub auto_enhance: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        FilterPreset::Original.settings()
    }
}

impl FilterSettings {
    /// Clamp every field into its documented range.
    pub fn clamped(self) -> Self {
        Self {
            brightness: self.brightness.clamp(-100, 100),
            contrast: self.contrast.clamp(-100, 100),
            grayscale: self.grayscale.min(100),
            threshold: self.threshold,
            auto_enhance: self.auto_enhance,
        }
    }

    /// True when applying these settings leaves pixels untouched.
    pub fn is_identity(&self) -> bool {
        !self.auto_enhance && !self.has_tone_adjustment() && self.threshold == 0
    }

    /// Whether the brightness/contrast/grayscale pass has anything to do.
    pub fn has_tone_adjustment(&self) -> bool {
        self.brightness != 0 || self.contrast != 0 || self.grayscale != 0
    }
}

/// Named filter combinations offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterPreset {
    Original,
    Magic,
    BlackWhite,
    Gray,
}

impl FilterPreset {
    pub fn settings(self) -> FilterSettings {
        let (brightness, contrast, grayscale, threshold, auto_enhance) = match self {
            Self::Original => (0, 0, 0, 0, false),
            Self::Magic => (20, 30, 0, 0, true),
            Self::BlackWhite => (0, 15, 100, 135, false),
            Self::Gray => (0, 5, 100, 0, false),
        };
        FilterSettings {
            brightness,
            contrast,
            grayscale,
            threshold,
            auto_enhance,
        }
    }
}

// -- Output page --------------------------------------------------------------

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

const MM_PER_INCH: f64 = 25.4;

/// The fixed-size raster every composition is flattened into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPage {
    pub paper: PaperSize,
    pub dpi: u32,
    pub width_px: u32,
    pub height_px: u32,
}

impl OutputPage {
    /// Page of `paper` rasterised at `dpi`.
    pub fn new(paper: PaperSize, dpi: u32) -> Self {
        let (w_mm, h_mm) = paper.dimensions_mm();
        let to_px = |mm: u32| (mm as f64 / MM_PER_INCH * dpi as f64).round() as u32;
        Self {
            paper,
            dpi,
            width_px: to_px(w_mm),
            height_px: to_px(h_mm),
        }
    }

    /// A4 at 300 DPI: 2480 x 3508 px.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4, 300)
    }

    /// Convert a pixel length on this page to millimetres.
    pub fn px_to_mm(&self, px: f64) -> f64 {
        px / self.dpi as f64 * MM_PER_INCH
    }

    pub fn center(&self) -> Point {
        Point::new(self.width_px as f64 / 2.0, self.height_px as f64 / 2.0)
    }
}

impl Default for OutputPage {
    fn default() -> Self {
        Self::a4()
    }
}

// -- Composition --------------------------------------------------------------

/// One processed page positioned on the output page.
///
/// `x`/`y` are the top-left of the unrotated box in page pixels; rotation is
/// applied about the box center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: ItemId,
    pub page: PageId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, clockwise, unbounded while interacting.
    pub rotation: f64,
    pub z_index: i32,
}

impl PlacedItem {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Move the box so its center lands on `center`, keeping its size.
    pub fn set_center(&mut self, center: Point) {
        self.x = center.x - self.width / 2.0;
        self.y = center.y - self.height / 2.0;
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}
