//! Overlap resolution by ordered rectangle subtraction.
//!
//! After suppression regions may still overlap a little. The resolver makes
//! them strictly disjoint: smaller regions are placed first and kept intact,
//! larger ones are clipped against everything already placed.
//!
//! Clipping is always vertical. If the placed region starts inside the
//! current one, the current region keeps its top part; otherwise it keeps
//! the part below the placed region. Regions are never split into several
//! pieces, so side-by-side overlaps can leave thin slivers or drop a region.

use crate::geometry::Rect;
use crate::layout::region::{Layout, Region};

/// Enforces pairwise disjointness over a set of regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapResolver;

impl OverlapResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve overlaps in `layout`.
    ///
    /// The output is ordered by ascending original area (detection order
    /// breaks ties) and no two output regions intersect. Labels and scores
    /// are preserved; only bounding boxes shrink.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    /// use layout_oxide::layout::{Label, Layout, OverlapResolver, Region};
    ///
    /// let header = Region::new(Rect::new(0.0, 0.0, 100.0, 50.0), 0.9, Label::Title).unwrap();
    /// let body = Region::new(Rect::new(0.0, 0.0, 100.0, 100.0), 0.8, Label::Text).unwrap();
    ///
    /// let resolved = OverlapResolver::new().resolve(&Layout::from(vec![body, header]));
    /// assert_eq!(resolved[0].bbox, Rect::new(0.0, 0.0, 100.0, 50.0));
    /// assert_eq!(resolved[1].bbox, Rect::new(0.0, 50.0, 100.0, 100.0));
    /// ```
    pub fn resolve(&self, layout: &Layout) -> Layout {
        let mut ordered: Vec<&Region> = layout.iter().collect();
        ordered.sort_by(|a, b| a.area().total_cmp(&b.area()));

        let mut accepted: Vec<Region> = Vec::with_capacity(ordered.len());
        for region in ordered {
            match clip_against(region.bbox, &accepted) {
                Some(rect) => {
                    if let Some(clipped) = region.with_bbox(rect) {
                        accepted.push(clipped);
                    }
                },
                None => {
                    log::debug!(
                        "dropped {} {:?}: nothing left after overlap subtraction",
                        region.label,
                        region.bbox.coords()
                    );
                },
            }
        }
        Layout::from(accepted)
    }
}

/// Clip `rect` against every accepted region in order. `None` once nothing
/// of it remains.
fn clip_against(mut rect: Rect, accepted: &[Region]) -> Option<Rect> {
    for other in accepted {
        if rect.intersects(&other.bbox) {
            rect = subtract_overlap(&rect, &other.bbox)?;
        }
    }
    Some(rect)
}

/// Remove the overlap with `other` from `src` by a single horizontal cut.
///
/// Returns `src` unchanged when the rectangles do not intersect and `None`
/// when the cut leaves no positive area.
pub fn subtract_overlap(src: &Rect, other: &Rect) -> Option<Rect> {
    if !src.intersects(other) {
        return Some(*src);
    }
    let cut = if src.y1 < other.y1 && other.y1 < src.y2 {
        Rect::new(src.x1, src.y1, src.x2, other.y1)
    } else {
        Rect::new(src.x1, other.y2, src.x2, src.y2)
    };
    cut.is_valid().then_some(cut)
}
