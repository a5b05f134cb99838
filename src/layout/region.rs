//! Region, layout and text span types.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::labels::Label;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Coordinate system a rectangle is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// PDF points, 72 per inch
    Page,
    /// Pixels of the rendered page image
    #[default]
    Pixel,
}

/// A labelled, scored rectangle on a page.
///
/// Regions are values: every resolution stage builds new regions instead of
/// editing the ones it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Bounding box
    pub bbox: Rect,
    /// Detector confidence
    #[serde(default)]
    pub score: f64,
    /// Class assigned by the detector
    pub label: Label,
    /// Coordinate system of `bbox`
    #[serde(default)]
    pub space: CoordinateSpace,
    /// Text attached to the region, each fragment followed by a space
    #[serde(default)]
    pub text: String,
}

impl Region {
    /// Create a pixel-space region.
    ///
    /// Fails with [`Error::InvalidRegion`] for a rectangle without positive
    /// width and height, or a negative or non-finite score.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    /// use layout_oxide::layout::{Label, Region};
    ///
    /// let ok = Region::new(Rect::new(0.0, 0.0, 10.0, 10.0), 0.9, Label::Text);
    /// assert!(ok.is_ok());
    ///
    /// let flat = Region::new(Rect::new(0.0, 5.0, 10.0, 5.0), 0.9, Label::Text);
    /// assert!(flat.is_err());
    /// ```
    pub fn new(bbox: Rect, score: f64, label: Label) -> Result<Self> {
        Self::in_space(bbox, score, label, CoordinateSpace::Pixel)
    }

    /// Create a region in an explicit coordinate space.
    pub fn in_space(bbox: Rect, score: f64, label: Label, space: CoordinateSpace) -> Result<Self> {
        if !bbox.is_valid() {
            return Err(Error::invalid_region(bbox.coords(), "non-positive width or height"));
        }
        if !score.is_finite() || score < 0.0 {
            return Err(Error::invalid_region(bbox.coords(), format!("unusable score {}", score)));
        }
        Ok(Self {
            bbox,
            score,
            label,
            space,
            text: String::new(),
        })
    }

    /// True when the box has positive extent and the score is finite and
    /// non-negative. Regions built with [`Region::new`] always are; regions
    /// deserialized from JSON may not be.
    pub fn is_valid(&self) -> bool {
        self.bbox.is_valid() && self.score.is_finite() && self.score >= 0.0
    }

    /// Area of the bounding box.
    pub fn area(&self) -> f64 {
        self.bbox.area()
    }

    /// Same region with a different bounding box, or `None` if the new box
    /// is degenerate.
    pub fn with_bbox(&self, bbox: Rect) -> Option<Self> {
        if !bbox.is_valid() {
            return None;
        }
        Some(Self {
            bbox,
            ..self.clone()
        })
    }

    /// Same region with `fragment` appended to its text.
    pub fn with_text_appended(&self, fragment: &str) -> Self {
        let mut text = String::with_capacity(self.text.len() + fragment.len() + 1);
        text.push_str(&self.text);
        text.push_str(fragment);
        text.push(' ');
        Self {
            text,
            ..self.clone()
        }
    }
}

/// An ordered sequence of regions for one page.
///
/// Order is the detection order (or the order a stage produced) and is used
/// only for deterministic tie-breaking; it is not reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    regions: Vec<Region>,
}

impl Layout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True when there are no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterate over the regions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    /// Regions as a slice.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Consume the layout, returning its regions.
    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    /// Keep only regions scoring at least `min_score`.
    pub fn filter_by_score(&self, min_score: f64) -> Layout {
        self.iter().filter(|r| r.score >= min_score).cloned().collect()
    }

    /// Total pairwise overlap area. Zero for a disjoint layout.
    pub fn overlap_area(&self) -> f64 {
        let mut total = 0.0;
        for (i, a) in self.regions.iter().enumerate() {
            for b in &self.regions[i + 1..] {
                total += a.bbox.intersection_area(&b.bbox);
            }
        }
        total
    }
}

impl From<Vec<Region>> for Layout {
    fn from(regions: Vec<Region>) -> Self {
        Self { regions }
    }
}

impl FromIterator<Region> for Layout {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        Self {
            regions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Layout {
    type Item = Region;
    type IntoIter = std::vec::IntoIter<Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}

impl<'a> IntoIterator for &'a Layout {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

impl Index<usize> for Layout {
    type Output = Region;

    fn index(&self, index: usize) -> &Region {
        &self.regions[index]
    }
}

/// A run of text reported by the PDF parser, in page space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Bounding box in page points
    pub bbox: Rect,
    /// Text content
    pub text: String,
}

impl TextSpan {
    /// Create a new span.
    pub fn new(bbox: Rect, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }
}
