//! Page and document resolution pipeline.
//!
//! ```text
//! Detector output (pixel space)
//!     ↓
//! [detections_to_layout] (labels resolved, degenerate boxes dropped)
//!     ↓
//! [score filter]                       ── Simple stops here
//!     ↓
//! [HierarchicalSuppressor]             ── Hierarchical stops here
//!     ↓
//! [OverlapResolver]
//!     ↓
//! [TextAttacher] ← parser spans (page space)
//!     ↓
//! PageLayout
//! ```
//!
//! Every stage is a pure function of its input, so pages can be processed
//! independently and in parallel (see [`document`]).

pub mod document;

pub use document::{DocumentProcessor, DocumentReport, PageOutcome};

use crate::config::{AnalysisMode, ResolverConfig};
use crate::detection::{detections_to_layout, LayoutDetector, PageImage};
use crate::error::Result;
use crate::geometry::CoordinateMapper;
use crate::layout::{
    AttachStats, HierarchicalSuppressor, Label, Layout, OverlapResolver, Region, TextAttacher, TextSpan,
};
use serde::{Deserialize, Serialize};

/// Parser-side description of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInput {
    /// Zero-based page number
    pub page_number: usize,
    /// Page width in points
    pub width_pts: f64,
    /// Page height in points
    pub height_pts: f64,
    /// Text spans in page space
    #[serde(default)]
    pub spans: Vec<TextSpan>,
}

impl PageInput {
    /// Create a page without text.
    pub fn new(page_number: usize, width_pts: f64, height_pts: f64) -> Self {
        Self {
            page_number,
            width_pts,
            height_pts,
            spans: Vec::new(),
        }
    }

    /// Attach parser spans.
    pub fn with_spans(mut self, spans: Vec<TextSpan>) -> Self {
        self.spans = spans;
        self
    }
}

/// Region counts after each stage for one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    /// Valid candidates handed to the pipeline
    pub candidates: usize,
    /// Regions after the score threshold or suppression
    pub after_filter: usize,
    /// Regions after overlap resolution
    pub after_resolution: usize,
    /// Text attachment counters
    pub text: AttachStats,
}

/// Final regions for one page, in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Zero-based page number
    pub page_number: usize,
    /// Resolved regions
    pub regions: Layout,
    /// Stage counters
    pub stats: PageStats,
}

/// Runs the resolution stages configured by a [`ResolverConfig`].
#[derive(Debug, Clone, Default)]
pub struct LayoutPipeline {
    config: ResolverConfig,
}

impl LayoutPipeline {
    /// Create a pipeline with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with a custom configuration.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Coordinate mapper for `page` at the configured DPI.
    pub fn mapper_for(&self, page: &PageInput) -> CoordinateMapper {
        CoordinateMapper::from_dpi(page.height_pts, self.config.dpi).with_origin(self.config.origin)
    }

    /// Detect and resolve one page.
    ///
    /// Detector failures and label mismatches are returned as errors; the
    /// caller decides whether to skip the page.
    pub fn analyze_page(&self, detector: &dyn LayoutDetector, page: &PageInput) -> Result<PageLayout> {
        let mapper = self.mapper_for(page);
        let (width_px, height_px) = mapper.page_size_px(page.width_pts);
        let image = PageImage {
            page_number: page.page_number,
            width_px,
            height_px,
        };
        let detections = detector.detect(&image)?;
        let candidates = detections_to_layout(detector.model(), &detections)?;
        log::debug!(
            "page {}: {} detections, {} usable candidates",
            page.page_number,
            detections.len(),
            candidates.len()
        );
        Ok(self.resolve_candidates(&candidates, page))
    }

    /// Resolve already detected pixel-space candidates for `page`.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    /// use layout_oxide::layout::{Label, Layout, Region, TextSpan};
    /// use layout_oxide::pipeline::{LayoutPipeline, PageInput};
    ///
    /// // 72 DPI keeps one pixel per point
    /// let config = layout_oxide::ResolverConfig::default().with_dpi(72.0);
    /// let pipeline = LayoutPipeline::with_config(config);
    ///
    /// let candidates = Layout::from(vec![
    ///     Region::new(Rect::new(0.0, 0.0, 100.0, 50.0), 0.9, Label::TextRegion).unwrap(),
    ///     Region::new(Rect::new(0.0, 40.0, 100.0, 100.0), 0.6, Label::TableRegion).unwrap(),
    /// ]);
    /// let page = PageInput::new(0, 100.0, 100.0)
    ///     .with_spans(vec![TextSpan::new(Rect::new(10.0, 60.0, 90.0, 70.0), "Header")]);
    ///
    /// let result = pipeline.resolve_candidates(&candidates, &page);
    /// assert_eq!(result.regions.len(), 2);
    /// assert_eq!(result.regions[0].text, "Header ");
    /// assert_eq!(result.regions[1].bbox, Rect::new(0.0, 50.0, 100.0, 100.0));
    /// ```
    pub fn resolve_candidates(&self, candidates: &Layout, page: &PageInput) -> PageLayout {
        let valid: Layout = candidates.iter().filter(|r| r.is_valid()).cloned().collect();
        let mut stats = PageStats {
            candidates: valid.len(),
            ..PageStats::default()
        };

        let regions = match self.config.mode {
            AnalysisMode::Simple => {
                let kept = valid.filter_by_score(self.config.simple_score_threshold);
                stats.after_filter = kept.len();
                stats.after_resolution = kept.len();
                kept
            },
            AnalysisMode::Hierarchical => {
                let kept = HierarchicalSuppressor::new(self.config.suppression).filter(&valid);
                stats.after_filter = kept.len();
                stats.after_resolution = kept.len();
                kept
            },
            AnalysisMode::Resolved => {
                let kept = HierarchicalSuppressor::new(self.config.suppression).filter(&valid);
                stats.after_filter = kept.len();
                let disjoint = OverlapResolver::new().resolve(&kept);
                stats.after_resolution = disjoint.len();
                let (annotated, text_stats) = TextAttacher::new(self.mapper_for(page)).attach(&disjoint, &page.spans);
                stats.text = text_stats;
                annotated
            },
        };

        log::info!(
            "page {}: {} candidates -> {} regions ({:?})",
            page.page_number,
            stats.candidates,
            regions.len(),
            self.config.mode
        );
        PageLayout {
            page_number: page.page_number,
            regions,
            stats,
        }
    }
}

impl PageLayout {
    /// Regions carrying a given label.
    pub fn regions_with_label(&self, label: Label) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(move |r| r.label == label)
    }

    /// Concatenated text of all regions in layout order.
    pub fn text(&self) -> String {
        self.regions.iter().map(|r| r.text.as_str()).collect::<String>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Detection, DetectionLabel, ModelConfig, RecordedDetector};
    use crate::geometry::Rect;
    use crate::layout::SuppressionParams;
    use std::collections::BTreeMap;

    fn region(coords: [f64; 4], score: f64, label: Label) -> Region {
        Region::new(Rect::from(coords), score, label).unwrap()
    }

    fn overlapping_candidates() -> Layout {
        Layout::from(vec![
            region([0.0, 0.0, 100.0, 100.0], 0.9, Label::TextRegion),
            region([10.0, 10.0, 50.0, 50.0], 0.3, Label::TextRegion),
            region([0.0, 90.0, 100.0, 150.0], 0.7, Label::TableRegion),
            region([200.0, 0.0, 300.0, 10.0], 0.1, Label::OtherRegion),
        ])
    }

    #[test]
    fn test_simple_mode_only_thresholds() {
        let pipeline = LayoutPipeline::with_config(ResolverConfig::simple(0.5));
        let out = pipeline.resolve_candidates(&overlapping_candidates(), &PageInput::new(0, 100.0, 100.0));
        assert_eq!(out.regions.len(), 2);
        assert!(out.regions.overlap_area() > 0.0);
    }

    #[test]
    fn test_hierarchical_mode_keeps_overlap() {
        let config = ResolverConfig::hierarchical().with_suppression(SuppressionParams::default());
        let out = LayoutPipeline::with_config(config)
            .resolve_candidates(&overlapping_candidates(), &PageInput::new(0, 100.0, 100.0));
        // nested box suppressed, low score dropped, table overlaps the text region by 10px
        assert_eq!(out.regions.len(), 2);
        assert_eq!(out.stats.after_filter, 2);
        assert!(out.regions.overlap_area() > 0.0);
    }

    #[test]
    fn test_resolved_mode_is_disjoint() {
        let config = ResolverConfig::resolved().with_suppression(SuppressionParams::default().with_min_score(0.05));
        let out = LayoutPipeline::with_config(config)
            .resolve_candidates(&overlapping_candidates(), &PageInput::new(0, 100.0, 100.0));
        assert_eq!(out.stats.candidates, 4);
        assert_eq!(out.regions.overlap_area(), 0.0);
        assert_eq!(out.regions.len(), out.stats.after_resolution);
    }

    #[test]
    fn test_analyze_page_uses_detector() {
        let model = ModelConfig::preset("prima", "weights").unwrap();
        let mut pages = BTreeMap::new();
        pages.insert(
            0,
            vec![Detection {
                bbox: [0.0, 0.0, 300.0, 100.0],
                score: 0.95,
                label: DetectionLabel::Id(1),
            }],
        );
        let detector = RecordedDetector::new(model, pages);
        let pipeline = LayoutPipeline::with_config(ResolverConfig::default().with_dpi(72.0));
        let page = PageInput::new(0, 300.0, 400.0)
            .with_spans(vec![TextSpan::new(Rect::new(10.0, 320.0, 200.0, 340.0), "Abstract")]);
        let out = pipeline.analyze_page(&detector, &page).unwrap();
        assert_eq!(out.regions.len(), 1);
        assert_eq!(out.regions[0].label, Label::TextRegion);
        assert_eq!(out.text(), "Abstract ");
        assert_eq!(out.regions_with_label(Label::TextRegion).count(), 1);

        assert!(pipeline.analyze_page(&detector, &PageInput::new(1, 300.0, 400.0)).is_err());
    }

    #[test]
    fn test_empty_candidates() {
        let out = LayoutPipeline::new().resolve_candidates(&Layout::new(), &PageInput::new(3, 612.0, 792.0));
        assert_eq!(out.page_number, 3);
        assert!(out.regions.is_empty());
    }

    #[test]
    fn test_deserialized_bad_scores_are_skipped() {
        let candidates: Layout = serde_json::from_str(
            r#"[
                {"bbox": [0, 0, 50, 50], "score": 0.7, "label": "TextRegion"},
                {"bbox": [60, 0, 90, 50], "score": -0.3, "label": "TextRegion"}
            ]"#,
        )
        .unwrap();
        // Even a threshold that admits everything must not keep the negative score
        let pipeline = LayoutPipeline::with_config(ResolverConfig::simple(-1.0));
        let out = pipeline.resolve_candidates(&candidates, &PageInput::new(0, 100.0, 100.0));
        assert_eq!(out.stats.candidates, 1);
        assert_eq!(out.regions.len(), 1);
        assert_eq!(out.regions[0].score, 0.7);
    }
}
