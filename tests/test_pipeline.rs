//! Integration tests for page and document processing.

use layout_oxide::detection::{Detection, DetectionLabel, LayoutDetector, ModelConfig, PageImage, RecordedDetector};
use layout_oxide::geometry::Rect;
use layout_oxide::layout::{Label, TextSpan};
use layout_oxide::{AnalysisMode, DocumentProcessor, Error, LayoutPipeline, PageInput, PageOutcome, ResolverConfig};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Fixtures
// ============================================================================

const RECORDING: &str = r#"{
    "0": [
        {"bbox": [150, 150, 2400, 400], "score": 0.96, "type": 1},
        {"bbox": [150, 450, 2400, 3000], "score": 0.88, "type": "TextRegion"},
        {"bbox": [160, 460, 2390, 2990], "score": 0.40, "type": 1},
        {"bbox": [150, 2900, 2400, 3200], "score": 0.71, "type": "TableRegion"}
    ],
    "1": [
        {"bbox": [100, 100, 100, 900], "score": 0.9, "type": 1},
        {"bbox": [200, 200, 1200, 1200], "score": 0.8, "type": "ImageRegion"}
    ],
    "2": [
        {"bbox": [0, 0, 100, 100], "score": 0.9, "type": "Figure"}
    ]
}"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn recorded_prima() -> RecordedDetector {
    let file = write_temp(RECORDING);
    let model = ModelConfig::preset("prima", "weights").unwrap();
    RecordedDetector::from_json_file(model, file.path()).unwrap()
}

/// US Letter page with a heading near the top and body text in the middle.
fn letter_page(page_number: usize) -> PageInput {
    PageInput::new(page_number, 612.0, 792.0).with_spans(vec![
        TextSpan::new(Rect::new(50.0, 730.0, 500.0, 750.0), "Quarterly Results"),
        TextSpan::new(Rect::new(50.0, 500.0, 500.0, 512.0), "Revenue grew in every region."),
        TextSpan::new(Rect::new(50.0, 60.0, 500.0, 72.0), "  "),
    ])
}

/// Detector that fails on odd pages and counts calls.
struct FlakyDetector {
    model: ModelConfig,
    calls: AtomicUsize,
}

impl LayoutDetector for FlakyDetector {
    fn model(&self) -> &ModelConfig {
        &self.model
    }

    fn detect(&self, page: &PageImage) -> layout_oxide::Result<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if page.page_number % 2 == 1 {
            return Err(Error::Detection {
                page: page.page_number,
                reason: "model timed out".to_string(),
            });
        }
        Ok(vec![Detection {
            bbox: [0.0, 0.0, page.width_px as f64, page.height_px as f64 / 4.0],
            score: 0.9,
            label: DetectionLabel::Id(1),
        }])
    }
}

// ============================================================================
// Single Page
// ============================================================================

#[test]
fn test_resolved_page_from_recording() {
    let detector = recorded_prima();
    let pipeline = LayoutPipeline::new();
    let out = pipeline.analyze_page(&detector, &letter_page(0)).unwrap();

    // Nested duplicate suppressed; the table clips the body region
    assert_eq!(out.stats.candidates, 4);
    assert_eq!(out.stats.after_filter, 3);
    assert_eq!(out.regions.len(), 3);
    assert_eq!(out.regions.overlap_area(), 0.0);

    let heading = &out.regions[0];
    assert_eq!(heading.label, Label::TextRegion);
    assert_eq!(heading.text, "Quarterly Results ");

    let table = out.regions_with_label(Label::TableRegion).next().unwrap();
    assert_eq!(table.bbox, Rect::new(150.0, 2900.0, 2400.0, 3200.0));

    let body = &out.regions[2];
    assert_eq!(body.bbox, Rect::new(150.0, 450.0, 2400.0, 2900.0));
    assert_eq!(body.text, "Revenue grew in every region. ");

    assert_eq!(out.stats.text.attached, 2);
    assert_eq!(out.stats.text.skipped_empty, 1);
}

#[test]
fn test_hierarchical_page_keeps_overlap() {
    let detector = recorded_prima();
    let pipeline = LayoutPipeline::with_config(ResolverConfig::hierarchical());
    let out = pipeline.analyze_page(&detector, &letter_page(0)).unwrap();
    assert_eq!(out.regions.len(), 3);
    assert!(out.regions.overlap_area() > 0.0);
    assert!(out.regions.iter().all(|r| r.text.is_empty()));
}

#[test]
fn test_degenerate_detection_dropped() {
    let detector = recorded_prima();
    let out = LayoutPipeline::new().analyze_page(&detector, &letter_page(1)).unwrap();
    assert_eq!(out.stats.candidates, 1);
    assert_eq!(out.regions[0].label, Label::ImageRegion);
}

#[test]
fn test_foreign_label_fails_page() {
    let detector = recorded_prima();
    let err = LayoutPipeline::new().analyze_page(&detector, &letter_page(2)).unwrap_err();
    assert!(matches!(err, Error::UnknownLabel { .. }));
}

#[test]
fn test_simple_mode_threshold() {
    let detector = recorded_prima();
    let pipeline = LayoutPipeline::with_config(ResolverConfig::simple(0.5));
    let out = pipeline.analyze_page(&detector, &letter_page(0)).unwrap();
    assert_eq!(pipeline.config().mode, AnalysisMode::Simple);
    assert_eq!(out.regions.len(), 3);
    assert!(out.regions.iter().all(|r| r.score >= 0.5));
}

// ============================================================================
// Document
// ============================================================================

#[test]
fn test_document_isolates_failures() {
    let detector = FlakyDetector {
        model: ModelConfig::preset("prima", "weights").unwrap(),
        calls: AtomicUsize::new(0),
    };
    let pages: Vec<PageInput> = (0..6).map(letter_page).collect();
    let report = DocumentProcessor::new(ResolverConfig::default().with_workers(3))
        .process(&detector, &pages)
        .unwrap();

    assert_eq!(detector.calls.load(Ordering::SeqCst), 6);
    assert_eq!(report.pages.len(), 6);
    assert!(!report.is_complete());
    let failed: Vec<usize> = report.failed().map(|(n, _)| n).collect();
    assert_eq!(failed, vec![1, 3, 5]);
    assert!(report.failed().all(|(_, e)| e.contains("model timed out")));

    let numbers: Vec<usize> = report.pages.iter().map(PageOutcome::page_number).collect();
    assert_eq!(numbers, vec![0, 1, 2, 3, 4, 5]);

    for layout in report.succeeded() {
        assert_eq!(layout.regions.len(), 1);
        assert_eq!(layout.regions[0].text, "Quarterly Results ");
    }
}

#[test]
fn test_document_report_serializes() {
    let detector = recorded_prima();
    let pages: Vec<PageInput> = (0..3).map(letter_page).collect();
    let report = DocumentProcessor::default().process(&detector, &pages).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["model"], "prima");
    assert_eq!(json["pages"][0]["status"], "ok");
    assert_eq!(json["pages"][2]["status"], "failed");
    assert!(json["pages"][0]["regions"][0]["bbox"].is_array());

    let restored: layout_oxide::DocumentReport = serde_json::from_value(json).unwrap();
    assert_eq!(restored.pages.len(), 3);
    assert_eq!(restored.processed_at, report.processed_at);
    assert_eq!(restored.failed().count(), 1);

    assert_eq!(report.outcomes(false).len(), 2);
    assert_eq!(report.clone().into_layouts().len(), 2);
}

// ============================================================================
// Configuration Files
// ============================================================================

#[test]
fn test_config_file_drives_pipeline() {
    let file = write_temp(r#"{"mode": "simple", "simple_score_threshold": 0.9}"#);
    let config = ResolverConfig::from_json_file(file.path()).unwrap();
    let out = LayoutPipeline::with_config(config)
        .analyze_page(&recorded_prima(), &letter_page(0))
        .unwrap();
    assert_eq!(out.regions.len(), 1);
    assert_eq!(out.regions[0].score, 0.96);
}

#[test]
fn test_config_file_mode_brings_preset() {
    let file = write_temp(r#"{"mode": "hierarchical", "dpi": 300}"#);
    let config = ResolverConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config, ResolverConfig::hierarchical());
    let out = LayoutPipeline::with_config(config)
        .analyze_page(&recorded_prima(), &letter_page(0))
        .unwrap();
    assert_eq!(out.regions.len(), 3);
    assert!(out.regions.overlap_area() > 0.0);
}

#[test]
fn test_malformed_recording_is_json_error() {
    let file = write_temp("{\"0\": [ {\"bbox\": [0, 0]} ]}");
    let model = ModelConfig::preset("prima", "weights").unwrap();
    let err = RecordedDetector::from_json_file(model, file.path()).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}
