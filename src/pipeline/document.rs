//! Parallel processing of all pages of a document.

use super::{LayoutPipeline, PageInput, PageLayout};
use crate::config::ResolverConfig;
use crate::detection::LayoutDetector;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Result of processing one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageOutcome {
    /// The page was resolved
    Ok(PageLayout),
    /// Detection or label resolution failed for the page
    Failed {
        /// Zero-based page number
        page_number: usize,
        /// Error message
        error: String,
    },
}

impl PageOutcome {
    /// Page this outcome belongs to.
    pub fn page_number(&self) -> usize {
        match self {
            PageOutcome::Ok(layout) => layout.page_number,
            PageOutcome::Failed { page_number, .. } => *page_number,
        }
    }

    /// Whether the page was resolved.
    pub fn is_ok(&self) -> bool {
        matches!(self, PageOutcome::Ok(_))
    }
}

/// Per-page outcomes for a whole document, in page order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    /// When processing finished
    pub processed_at: DateTime<Utc>,
    /// Name of the detection model used
    pub model: String,
    /// One entry per input page
    pub pages: Vec<PageOutcome>,
}

impl DocumentReport {
    /// Resolved pages.
    pub fn succeeded(&self) -> impl Iterator<Item = &PageLayout> {
        self.pages.iter().filter_map(|p| match p {
            PageOutcome::Ok(layout) => Some(layout),
            PageOutcome::Failed { .. } => None,
        })
    }

    /// Failed pages as `(page_number, error)`.
    pub fn failed(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pages.iter().filter_map(|p| match p {
            PageOutcome::Failed { page_number, error } => Some((*page_number, error.as_str())),
            PageOutcome::Ok(_) => None,
        })
    }

    /// True when no page failed.
    pub fn is_complete(&self) -> bool {
        self.pages.iter().all(PageOutcome::is_ok)
    }

    /// Outcomes to report, with failures only when `include_errors` is set.
    pub fn outcomes(&self, include_errors: bool) -> Vec<&PageOutcome> {
        self.pages.iter().filter(|p| include_errors || p.is_ok()).collect()
    }

    /// Consume the report, keeping only resolved pages.
    pub fn into_layouts(self) -> Vec<PageLayout> {
        self.pages
            .into_iter()
            .filter_map(|p| match p {
                PageOutcome::Ok(layout) => Some(layout),
                PageOutcome::Failed { .. } => None,
            })
            .collect()
    }
}

/// Runs a [`LayoutPipeline`] over every page of a document.
///
/// Pages are independent, so they are spread over a dedicated rayon pool.
/// A failing page is recorded in the report and never aborts the others.
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    pipeline: LayoutPipeline,
}

impl DocumentProcessor {
    /// Create a processor with the given configuration.
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            pipeline: LayoutPipeline::with_config(config),
        }
    }

    /// The pipeline applied to each page.
    pub fn pipeline(&self) -> &LayoutPipeline {
        &self.pipeline
    }

    /// Number of worker threads used for `page_count` pages.
    ///
    /// Never more than the pages or the available CPUs, never less than one.
    pub fn worker_count(&self, page_count: usize) -> usize {
        let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let requested = self.pipeline.config().workers.unwrap_or(cpus);
        requested.min(cpus).min(page_count).max(1)
    }

    /// Process all `pages` with `detector`.
    ///
    /// Only building the worker pool can fail; page errors end up in the
    /// report.
    pub fn process(&self, detector: &dyn LayoutDetector, pages: &[PageInput]) -> Result<DocumentReport> {
        let workers = self.worker_count(pages.len());
        log::info!(
            "processing {} pages with model '{}' on {} workers",
            pages.len(),
            detector.model().name,
            workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("layout-worker-{}", i))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        // par_iter + collect keeps input order
        let mut outcomes: Vec<PageOutcome> = pool.install(|| {
            pages
                .par_iter()
                .map(|page| self.process_page(detector, page))
                .collect()
        });
        outcomes.sort_by_key(PageOutcome::page_number);

        let report = DocumentReport {
            processed_at: Utc::now(),
            model: detector.model().name.clone(),
            pages: outcomes,
        };
        let failures = report.failed().count();
        if failures > 0 {
            log::warn!("{} of {} pages failed", failures, report.pages.len());
        }
        Ok(report)
    }

    fn process_page(&self, detector: &dyn LayoutDetector, page: &PageInput) -> PageOutcome {
        match self.pipeline.analyze_page(detector, page) {
            Ok(layout) => PageOutcome::Ok(layout),
            Err(e) => {
                log::error!("page {} analysis failed: {}", page.page_number, e);
                PageOutcome::Failed {
                    page_number: page.page_number,
                    error: e.to_string(),
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Detection, DetectionLabel, ModelConfig, RecordedDetector};
    use std::collections::BTreeMap;

    fn detector_for(pages: &[usize]) -> RecordedDetector {
        let model = ModelConfig::preset("publaynet", "weights").unwrap();
        let mut recorded = BTreeMap::new();
        for &page in pages {
            recorded.insert(
                page,
                vec![Detection {
                    bbox: [10.0, 10.0, 200.0, 60.0],
                    score: 0.9,
                    label: DetectionLabel::Name("Title".to_string()),
                }],
            );
        }
        RecordedDetector::new(model, recorded)
    }

    fn pages(n: usize) -> Vec<PageInput> {
        (0..n).map(|i| PageInput::new(i, 612.0, 792.0)).collect()
    }

    #[test]
    fn test_worker_count_bounds() {
        let processor = DocumentProcessor::new(ResolverConfig::default().with_workers(64));
        assert_eq!(processor.worker_count(1), 1);
        assert_eq!(processor.worker_count(0), 1);
        assert!(processor.worker_count(1000) >= 1);

        let single = DocumentProcessor::new(ResolverConfig::default().with_workers(1));
        assert_eq!(single.worker_count(10), 1);
    }

    #[test]
    fn test_failures_are_isolated() {
        let detector = detector_for(&[0, 2]);
        let processor = DocumentProcessor::new(ResolverConfig::default().with_workers(2));
        let report = processor.process(&detector, &pages(3)).unwrap();

        assert_eq!(report.pages.len(), 3);
        assert!(!report.is_complete());
        assert_eq!(report.succeeded().count(), 2);
        let failed: Vec<usize> = report.failed().map(|(n, _)| n).collect();
        assert_eq!(failed, vec![1]);
        assert_eq!(report.outcomes(false).len(), 2);
        assert_eq!(report.outcomes(true).len(), 3);
        assert_eq!(report.model, "publaynet");
    }

    #[test]
    fn test_results_in_page_order() {
        let detector = detector_for(&[0, 1, 2, 3, 4, 5, 6, 7]);
        let report = DocumentProcessor::default().process(&detector, &pages(8)).unwrap();
        assert!(report.is_complete());
        let order: Vec<usize> = report.into_layouts().iter().map(|l| l.page_number).collect();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_document() {
        let report = DocumentProcessor::default().process(&detector_for(&[]), &[]).unwrap();
        assert!(report.pages.is_empty());
        assert!(report.is_complete());
    }

    #[test]
    fn test_outcome_serialization_tags_status() {
        let failed = PageOutcome::Failed {
            page_number: 4,
            error: "boom".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["page_number"], 4);
    }
}
