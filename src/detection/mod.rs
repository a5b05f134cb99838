//! Layout detection capability.
//!
//! The visual layout model itself lives outside this crate. This module
//! defines how it is described ([`ModelConfig`]), how it is called
//! ([`LayoutDetector`]) and how its raw output becomes regions.
//!
//! A detector is an explicit value: load it once per worker and pass it by
//! reference to every page that needs it.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::layout::{Label, LabelMap, Layout, Region};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Names of the built-in model configurations.
pub const MODEL_NAMES: [&str; 3] = ["publaynet", "prima", "hjdataset"];

/// Model used when none is requested.
pub const DEFAULT_MODEL: &str = "prima";

/// Immutable description of a layout detection model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Registry name
    pub name: String,
    /// Model configuration URI
    pub config_path: String,
    /// Weights file
    pub weights_path: PathBuf,
    /// Class id to label mapping
    pub label_map: LabelMap,
}

impl ModelConfig {
    /// Look up a built-in model, resolving its weights under `weights_dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_oxide::detection::ModelConfig;
    /// use layout_oxide::layout::Label;
    ///
    /// let model = ModelConfig::preset("publaynet", "weights").unwrap();
    /// assert!(model.weights_path.ends_with("large.pth"));
    /// assert_eq!(model.label_map.get(3), Some(Label::Table));
    ///
    /// assert!(ModelConfig::preset("docbank", "weights").is_err());
    /// ```
    pub fn preset(name: &str, weights_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = weights_dir.as_ref();
        let (config_path, weights_file, label_map) = match name {
            "publaynet" => (
                "lp://PubLayNet/mask_rcnn_X_101_32x8d_FPN_3x/config",
                "large.pth",
                LabelMap::publaynet(),
            ),
            "prima" => (
                "lp://PrimaLayout/mask_rcnn_R_50_FPN_3x/config",
                "prima_weights.pth",
                LabelMap::prima(),
            ),
            "hjdataset" => (
                "lp://HJDataset/mask_rcnn_R_50_FPN_3x/config",
                "hj_weights.pth",
                LabelMap::hjdataset(),
            ),
            _ => {
                return Err(Error::UnknownModel {
                    name: name.to_string(),
                    available: MODEL_NAMES.iter().map(|s| s.to_string()).collect(),
                })
            },
        };
        Ok(Self {
            name: name.to_string(),
            config_path: config_path.to_string(),
            weights_path: dir.join(weights_file),
            label_map,
        })
    }

    /// Resolve a detection label against this model's label map.
    pub fn resolve_label(&self, label: &DetectionLabel) -> Result<Label> {
        match label {
            DetectionLabel::Id(id) => self.label_map.require_id(&self.name, *id),
            DetectionLabel::Name(name) => self.label_map.require_name(&self.name, name),
        }
    }
}

/// Class reported by the detector, either as a raw id or as a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetectionLabel {
    /// Numeric class id
    Id(u32),
    /// Class name
    Name(String),
}

/// One raw detector output in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in pixels
    pub bbox: [f64; 4],
    /// Confidence, 0 when the detector omits it
    #[serde(default)]
    pub score: f64,
    /// Detected class
    #[serde(rename = "type", alias = "label")]
    pub label: DetectionLabel,
}

/// The raster a detector runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// Zero-based page number
    pub page_number: usize,
    /// Raster width in pixels
    pub width_px: u32,
    /// Raster height in pixels
    pub height_px: u32,
}

/// A loaded layout detection model.
///
/// Implementations may be slow and blocking; timeouts and retries are the
/// caller's concern.
pub trait LayoutDetector: Send + Sync {
    /// The configuration this detector was built from.
    fn model(&self) -> &ModelConfig;

    /// Run detection on one rendered page.
    fn detect(&self, page: &PageImage) -> Result<Vec<Detection>>;
}

/// Convert raw detections into a pixel-space layout.
///
/// Degenerate boxes and negative scores are dropped. An unknown label is an
/// error since it means the detections came from a different model.
pub fn detections_to_layout(model: &ModelConfig, detections: &[Detection]) -> Result<Layout> {
    let mut regions = Vec::with_capacity(detections.len());
    for det in detections {
        let label = model.resolve_label(&det.label)?;
        match Region::new(Rect::from(det.bbox), det.score, label) {
            Ok(region) => regions.push(region),
            Err(e) => log::debug!("dropping detection: {}", e),
        }
    }
    Ok(Layout::from(regions))
}

/// Detector that replays previously recorded model output.
///
/// The recording is a JSON object mapping page numbers to detection lists:
///
/// ```json
/// { "0": [ { "bbox": [10, 10, 400, 80], "score": 0.93, "type": "TextRegion" } ] }
/// ```
#[derive(Debug, Clone)]
pub struct RecordedDetector {
    model: ModelConfig,
    pages: BTreeMap<usize, Vec<Detection>>,
}

impl RecordedDetector {
    /// Create a detector from in-memory detections.
    pub fn new(model: ModelConfig, pages: BTreeMap<usize, Vec<Detection>>) -> Self {
        Self { model, pages }
    }

    /// Load a recording from a JSON file.
    pub fn from_json_file(model: ModelConfig, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let pages: BTreeMap<usize, Vec<Detection>> = serde_json::from_str(&raw)?;
        log::info!(
            "loaded recorded detections for {} pages from {}",
            pages.len(),
            path.display()
        );
        Ok(Self::new(model, pages))
    }

    /// Page numbers present in the recording.
    pub fn page_numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.keys().copied()
    }
}

impl LayoutDetector for RecordedDetector {
    fn model(&self) -> &ModelConfig {
        &self.model
    }

    fn detect(&self, page: &PageImage) -> Result<Vec<Detection>> {
        self.pages
            .get(&page.page_number)
            .cloned()
            .ok_or_else(|| Error::Detection {
                page: page.page_number,
                reason: "no recorded detections for page".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prima() -> ModelConfig {
        ModelConfig::preset("prima", "/opt/weights").unwrap()
    }

    #[test]
    fn test_presets_resolve_weights() {
        for name in MODEL_NAMES {
            let model = ModelConfig::preset(name, "/opt/weights").unwrap();
            assert_eq!(model.name, name);
            assert!(model.weights_path.starts_with("/opt/weights"));
            assert!(model.config_path.starts_with("lp://"));
        }
    }

    #[test]
    fn test_unknown_model_lists_available() {
        match ModelConfig::preset("tablebank", "w") {
            Err(Error::UnknownModel { available, .. }) => assert_eq!(available.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_detection_json_accepts_ids_and_names() {
        let json = r#"[
            {"bbox": [0, 0, 10, 10], "score": 0.5, "type": 1},
            {"bbox": [0, 0, 10, 10], "label": "TableRegion"}
        ]"#;
        let dets: Vec<Detection> = serde_json::from_str(json).unwrap();
        assert_eq!(dets[0].label, DetectionLabel::Id(1));
        assert_eq!(dets[1].label, DetectionLabel::Name("TableRegion".to_string()));
        assert_eq!(dets[1].score, 0.0);
    }

    #[test]
    fn test_detections_to_layout_drops_degenerate() {
        let dets = vec![
            Detection {
                bbox: [0.0, 0.0, 10.0, 10.0],
                score: 0.9,
                label: DetectionLabel::Id(3),
            },
            Detection {
                bbox: [5.0, 5.0, 5.0, 20.0],
                score: 0.9,
                label: DetectionLabel::Id(1),
            },
        ];
        let layout = detections_to_layout(&prima(), &dets).unwrap();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].label, Label::TableRegion);
    }

    #[test]
    fn test_detections_to_layout_unknown_label() {
        let dets = vec![Detection {
            bbox: [0.0, 0.0, 10.0, 10.0],
            score: 0.9,
            label: DetectionLabel::Name("Figure".to_string()),
        }];
        assert!(matches!(
            detections_to_layout(&prima(), &dets),
            Err(Error::UnknownLabel { .. })
        ));
    }

    #[test]
    fn test_recorded_detector_missing_page() {
        let detector = RecordedDetector::new(prima(), BTreeMap::new());
        let page = PageImage {
            page_number: 2,
            width_px: 100,
            height_px: 100,
        };
        assert!(matches!(detector.detect(&page), Err(Error::Detection { page: 2, .. })));
    }
}
