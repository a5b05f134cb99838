//! Attaching parser text spans to resolved regions.

use crate::geometry::CoordinateMapper;
use crate::layout::region::{CoordinateSpace, Layout, TextSpan};
use serde::{Deserialize, Serialize};

/// Counters describing one attachment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachStats {
    /// Spans whose text went into a region
    pub attached: usize,
    /// Spans that intersected no region
    pub unmatched: usize,
    /// Spans with only whitespace
    pub skipped_empty: usize,
}

/// Assigns page-space text spans to pixel-space regions.
///
/// Each span goes to the first region (in layout order) whose rectangle
/// intersects the span's rectangle. Pixel-space regions are compared with
/// the mapped span, page-space regions with the span as given. Spans
/// straddling two regions are not split.
#[derive(Debug, Clone, Copy)]
pub struct TextAttacher {
    mapper: CoordinateMapper,
}

impl TextAttacher {
    /// Create an attacher for a page described by `mapper`.
    pub fn new(mapper: CoordinateMapper) -> Self {
        Self { mapper }
    }

    /// The page mapping in use.
    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Attach `spans` to `regions`, returning a new layout and counters.
    ///
    /// Span text is trimmed and appended followed by a single space.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::{CoordinateMapper, Rect};
    /// use layout_oxide::layout::{Label, Layout, Region, TextAttacher, TextSpan};
    ///
    /// // 100pt tall page at 1 pixel per point
    /// let attacher = TextAttacher::new(CoordinateMapper::new(100.0, 1.0));
    /// let title = Region::new(Rect::new(0.0, 0.0, 100.0, 20.0), 0.9, Label::Title).unwrap();
    /// let span = TextSpan::new(Rect::new(10.0, 85.0, 60.0, 95.0), " Introduction ");
    ///
    /// let (layout, stats) = attacher.attach(&Layout::from(vec![title]), &[span]);
    /// assert_eq!(layout[0].text, "Introduction ");
    /// assert_eq!(stats.attached, 1);
    /// ```
    pub fn attach(&self, regions: &Layout, spans: &[TextSpan]) -> (Layout, AttachStats) {
        let mut out = regions.clone().into_regions();
        let mut stats = AttachStats::default();

        for span in spans {
            let text = span.text.trim();
            if text.is_empty() {
                stats.skipped_empty += 1;
                continue;
            }
            let span_px = self.mapper.to_pixel(&span.bbox);
            let hit = out.iter().position(|r| match r.space {
                CoordinateSpace::Pixel => r.bbox.intersects(&span_px),
                CoordinateSpace::Page => r.bbox.intersects(&span.bbox),
            });
            match hit {
                Some(idx) => {
                    out[idx] = out[idx].with_text_appended(text);
                    stats.attached += 1;
                },
                None => {
                    log::trace!("span {:?} matched no region", text);
                    stats.unmatched += 1;
                },
            }
        }

        log::debug!(
            "attached {} spans ({} unmatched, {} empty) to {} regions",
            stats.attached,
            stats.unmatched,
            stats.skipped_empty,
            out.len()
        );
        (Layout::from(out), stats)
    }
}
