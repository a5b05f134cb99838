//! Conversion between page-point space and rendered-pixel space.
//!
//! Page space is measured in PDF points (72 per inch). The layout detector
//! runs on a raster rendered at some DPI, so its boxes live in pixel space
//! with the origin at the top-left corner.

use super::Rect;
use serde::{Deserialize, Serialize};

/// Native resolution of page space.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Render resolution used when none is configured.
pub const DEFAULT_DPI: f64 = 300.0;

/// Where the page coordinate system puts its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOrigin {
    /// PDF user space: y grows upwards. Mapping to pixels flips the y axis.
    #[default]
    BottomLeft,
    /// Parser already reports y growing downwards. Mapping only scales.
    TopLeft,
}

/// Maps rectangles between page space and pixel space for one page.
///
/// # Examples
///
/// ```
/// use layout_oxide::geometry::{CoordinateMapper, Rect};
///
/// // US Letter page rendered at 144 DPI
/// let mapper = CoordinateMapper::from_dpi(792.0, 144.0);
/// let px = mapper.to_pixel(&Rect::new(72.0, 700.0, 144.0, 720.0));
/// assert_eq!(px, Rect::new(144.0, 144.0, 288.0, 184.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateMapper {
    /// Page height in points
    pub page_height_pts: f64,
    /// Pixels per point
    pub scale: f64,
    /// Origin convention of the page-space input
    #[serde(default)]
    pub origin: PageOrigin,
}

impl CoordinateMapper {
    /// Create a mapper for a bottom-left origin page.
    pub fn new(page_height_pts: f64, scale: f64) -> Self {
        Self {
            page_height_pts,
            scale,
            origin: PageOrigin::BottomLeft,
        }
    }

    /// Create a mapper for a page rendered at `dpi`.
    pub fn from_dpi(page_height_pts: f64, dpi: f64) -> Self {
        Self::new(page_height_pts, scale_for_dpi(dpi))
    }

    /// Use a different origin convention for page-space input.
    pub fn with_origin(mut self, origin: PageOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Map a page-space rectangle into pixel space.
    ///
    /// With a bottom-left origin the page rectangle `(x0, y0, x1, y1)` becomes
    /// `(x0*s, (H-y1)*s, x1*s, (H-y0)*s)`. A normalized input yields a
    /// normalized output.
    pub fn to_pixel(&self, rect: &Rect) -> Rect {
        let s = self.scale;
        match self.origin {
            PageOrigin::BottomLeft => Rect::new(
                rect.x1 * s,
                (self.page_height_pts - rect.y2) * s,
                rect.x2 * s,
                (self.page_height_pts - rect.y1) * s,
            ),
            PageOrigin::TopLeft => Rect::new(rect.x1 * s, rect.y1 * s, rect.x2 * s, rect.y2 * s),
        }
    }

    /// Map a pixel-space rectangle back into page space. Inverse of
    /// [`CoordinateMapper::to_pixel`].
    pub fn to_page(&self, rect: &Rect) -> Rect {
        let s = self.scale;
        match self.origin {
            PageOrigin::BottomLeft => Rect::new(
                rect.x1 / s,
                self.page_height_pts - rect.y2 / s,
                rect.x2 / s,
                self.page_height_pts - rect.y1 / s,
            ),
            PageOrigin::TopLeft => Rect::new(rect.x1 / s, rect.y1 / s, rect.x2 / s, rect.y2 / s),
        }
    }

    /// Raster size in pixels of a page of the given size in points.
    pub fn page_size_px(&self, width_pts: f64) -> (u32, u32) {
        let w = (width_pts * self.scale).round().max(0.0);
        let h = (self.page_height_pts * self.scale).round().max(0.0);
        (w as u32, h as u32)
    }
}

/// Pixels per point at `dpi`.
pub fn scale_for_dpi(dpi: f64) -> f64 {
    dpi / POINTS_PER_INCH
}
