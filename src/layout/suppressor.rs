//! Hierarchical suppression of redundant detector candidates.
//!
//! Candidates are visited from most to least confident. A candidate is
//! dropped when an already selected region makes it redundant, and an
//! accepted candidate evicts selected regions it makes redundant in turn.
//! Three independent rules decide redundancy:
//!
//! - **containment**: the smaller box lies inside the other (with tolerance)
//! - **containment ratio**: most of the smaller box is covered by the other
//! - **IoU**: the two boxes are similar in size and position
//!
//! Unlike plain NMS, a lower scoring candidate can still evict a region
//! accepted before it, but a rejected candidate is never reconsidered.

use crate::layout::region::{Layout, Region};
use serde::{Deserialize, Serialize};

/// Thresholds for [`HierarchicalSuppressor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionParams {
    /// Candidates scoring below this are discarded up front
    pub min_score: f64,
    /// Containment ratio at or above which the smaller box is redundant
    pub containment_threshold: f64,
    /// IoU at or above which the lower ranked box is redundant
    pub iou_threshold: f64,
    /// Slack in pixels for the strict containment rule
    pub tolerance: f64,
}

impl Default for SuppressionParams {
    fn default() -> Self {
        Self {
            min_score: 0.2,
            containment_threshold: 0.9,
            iou_threshold: 0.4,
            tolerance: 0.0,
        }
    }
}

impl SuppressionParams {
    /// Thresholds for stand-alone hierarchical analysis.
    pub fn hierarchical() -> Self {
        Self {
            min_score: 0.2,
            containment_threshold: 0.8,
            iou_threshold: 0.9,
            tolerance: 5.0,
        }
    }

    /// Thresholds used ahead of overlap resolution and text attachment.
    ///
    /// Keeps low-confidence candidates because the resolver will carve
    /// them down rather than let them overlap.
    pub fn resolved() -> Self {
        Self {
            min_score: 0.05,
            containment_threshold: 0.8,
            iou_threshold: 0.9,
            tolerance: 2.0,
        }
    }

    /// Set the minimum score.
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Set the containment ratio threshold.
    pub fn with_containment_threshold(mut self, threshold: f64) -> Self {
        self.containment_threshold = threshold;
        self
    }

    /// Set the IoU threshold.
    pub fn with_iou_threshold(mut self, threshold: f64) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the containment tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Greedy, score-ordered duplicate and overlap elimination.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalSuppressor {
    params: SuppressionParams,
}

impl HierarchicalSuppressor {
    /// Create a suppressor with the given thresholds.
    pub fn new(params: SuppressionParams) -> Self {
        Self { params }
    }

    /// The thresholds in use.
    pub fn params(&self) -> &SuppressionParams {
        &self.params
    }

    /// Filter `candidates` down to a set of mutually non-redundant regions.
    ///
    /// The result is ordered by descending score, then descending area, with
    /// detection order breaking remaining ties.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::geometry::Rect;
    /// use layout_oxide::layout::{HierarchicalSuppressor, Label, Layout, Region, SuppressionParams};
    ///
    /// let outer = Region::new(Rect::new(0.0, 0.0, 100.0, 100.0), 0.9, Label::Table).unwrap();
    /// let nested = Region::new(Rect::new(10.0, 10.0, 50.0, 50.0), 0.3, Label::Text).unwrap();
    /// let layout = Layout::from(vec![outer.clone(), nested]);
    ///
    /// let kept = HierarchicalSuppressor::new(SuppressionParams::default()).filter(&layout);
    /// assert_eq!(kept.regions(), &[outer]);
    /// ```
    pub fn filter(&self, candidates: &Layout) -> Layout {
        let p = &self.params;
        let ranked = rank_by_score_then_area(
            candidates
                .iter()
                .filter(|c| c.score >= p.min_score)
                .collect(),
        );

        let mut selected: Vec<&Region> = Vec::with_capacity(ranked.len());
        for candidate in ranked {
            if selected.iter().any(|s| self.is_redundant(candidate, s)) {
                log::trace!(
                    "suppressed {} {:?} (score {:.3})",
                    candidate.label,
                    candidate.bbox.coords(),
                    candidate.score
                );
                continue;
            }
            selected.retain(|s| {
                let superseded = self.is_redundant(s, candidate);
                if superseded {
                    log::trace!(
                        "{} {:?} superseded by {} {:?}",
                        s.label,
                        s.bbox.coords(),
                        candidate.label,
                        candidate.bbox.coords()
                    );
                }
                !superseded
            });
            selected.push(candidate);
        }

        log::debug!(
            "hierarchical filter kept {} of {} candidates",
            selected.len(),
            candidates.len()
        );
        selected.into_iter().cloned().collect()
    }

    /// Whether `inner` is made redundant by `outer` under any of the three
    /// rules.
    pub fn is_redundant(&self, inner: &Region, outer: &Region) -> bool {
        let p = &self.params;
        outer.bbox.contains(&inner.bbox, p.tolerance)
            || inner.bbox.containment_ratio(&outer.bbox) >= p.containment_threshold
            || inner.bbox.iou(&outer.bbox) >= p.iou_threshold
    }
}

/// Stable sort by descending score, then descending area.
fn rank_by_score_then_area(mut regions: Vec<&Region>) -> Vec<&Region> {
    regions.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.area().total_cmp(&a.area()))
    });
    regions
}
