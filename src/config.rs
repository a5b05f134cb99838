//! Configuration for layout resolution.

use crate::error::{Error, Result};
use crate::geometry::{PageOrigin, DEFAULT_DPI};
use crate::layout::SuppressionParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How far a page is taken through the resolution stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Score threshold only
    Simple,
    /// Score threshold and hierarchical suppression
    Hierarchical,
    /// Suppression, overlap resolution and text attachment
    #[default]
    Resolved,
}

/// Layout resolution configuration.
///
/// When deserialized, fields that are absent take the values of the preset
/// for the configured mode (see [`ResolverConfig::for_mode`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartialResolverConfig")]
pub struct ResolverConfig {
    /// Which stages to run
    pub mode: AnalysisMode,

    /// Suppression thresholds
    pub suppression: SuppressionParams,

    /// Score threshold used in [`AnalysisMode::Simple`]
    pub simple_score_threshold: f64,

    /// Resolution the page was rendered at for detection
    pub dpi: f64,

    /// Origin convention of parser coordinates
    pub origin: PageOrigin,

    /// Worker threads for document processing (None = one per CPU)
    pub workers: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::resolved()
    }
}

impl ResolverConfig {
    /// Full resolution with text attachment.
    pub fn resolved() -> Self {
        Self {
            mode: AnalysisMode::Resolved,
            suppression: SuppressionParams::resolved(),
            simple_score_threshold: 0.5,
            dpi: DEFAULT_DPI,
            origin: PageOrigin::BottomLeft,
            workers: None,
        }
    }

    /// Suppression only, no overlap resolution.
    pub fn hierarchical() -> Self {
        Self {
            mode: AnalysisMode::Hierarchical,
            suppression: SuppressionParams::hierarchical(),
            ..Self::resolved()
        }
    }

    /// Plain score threshold.
    pub fn simple(score_threshold: f64) -> Self {
        Self {
            mode: AnalysisMode::Simple,
            simple_score_threshold: score_threshold,
            ..Self::resolved()
        }
    }

    /// Preset for `mode`: [`ResolverConfig::simple`] with a 0.5 threshold,
    /// [`ResolverConfig::hierarchical`] or [`ResolverConfig::resolved`].
    pub fn for_mode(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Simple => Self::simple(0.5),
            AnalysisMode::Hierarchical => Self::hierarchical(),
            AnalysisMode::Resolved => Self::resolved(),
        }
    }

    /// Load a configuration from a JSON file. Missing fields take the
    /// values of the preset for the file's mode (resolved when absent).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = PartialResolverConfig::from_json_file(path)?.build(None);
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        let s = &self.suppression;
        for (name, value) in [
            ("containment_threshold", s.containment_threshold),
            ("iou_threshold", s.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }
        for (name, value) in [
            ("min_score", s.min_score),
            ("simple_score_threshold", self.simple_score_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!("{} must be non-negative, got {}", name, value)));
            }
        }
        if !s.tolerance.is_finite() || s.tolerance < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be non-negative, got {}",
                s.tolerance
            )));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(Error::InvalidConfig(format!("dpi must be positive, got {}", self.dpi)));
        }
        if self.workers == Some(0) {
            return Err(Error::InvalidConfig("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Set the analysis mode.
    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the suppression thresholds.
    pub fn with_suppression(mut self, suppression: SuppressionParams) -> Self {
        self.suppression = suppression;
        self
    }

    /// Set the render DPI.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the page origin convention.
    pub fn with_origin(mut self, origin: PageOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Set the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }
}

/// Suppression thresholds where every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialSuppressionParams {
    /// See [`SuppressionParams::min_score`]
    pub min_score: Option<f64>,
    /// See [`SuppressionParams::containment_threshold`]
    pub containment_threshold: Option<f64>,
    /// See [`SuppressionParams::iou_threshold`]
    pub iou_threshold: Option<f64>,
    /// See [`SuppressionParams::tolerance`]
    pub tolerance: Option<f64>,
}

impl PartialSuppressionParams {
    fn apply(&self, params: &mut SuppressionParams) {
        if let Some(v) = self.min_score {
            params.min_score = v;
        }
        if let Some(v) = self.containment_threshold {
            params.containment_threshold = v;
        }
        if let Some(v) = self.iou_threshold {
            params.iou_threshold = v;
        }
        if let Some(v) = self.tolerance {
            params.tolerance = v;
        }
    }

    fn or(self, fallback: Self) -> Self {
        Self {
            min_score: self.min_score.or(fallback.min_score),
            containment_threshold: self.containment_threshold.or(fallback.containment_threshold),
            iou_threshold: self.iou_threshold.or(fallback.iou_threshold),
            tolerance: self.tolerance.or(fallback.tolerance),
        }
    }
}

/// A configuration with only the explicitly given values.
///
/// Config files and command line options both produce one of these. They
/// are merged with [`PartialResolverConfig::or`] and turned into a full
/// configuration by [`PartialResolverConfig::build`], which starts from the
/// preset of the final mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialResolverConfig {
    /// Which stages to run
    pub mode: Option<AnalysisMode>,
    /// Suppression thresholds
    pub suppression: PartialSuppressionParams,
    /// Score threshold used in [`AnalysisMode::Simple`]
    pub simple_score_threshold: Option<f64>,
    /// Render DPI
    pub dpi: Option<f64>,
    /// Origin convention of parser coordinates
    pub origin: Option<PageOrigin>,
    /// Worker threads
    pub workers: Option<usize>,
}

impl PartialResolverConfig {
    /// Read a partial configuration from a JSON file without validating it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let partial: PartialResolverConfig = serde_json::from_str(&raw)?;
        log::info!("loaded resolver configuration from {}", path.display());
        Ok(partial)
    }

    /// Values from `self`, falling back to `fallback` where unset.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            mode: self.mode.or(fallback.mode),
            suppression: self.suppression.or(fallback.suppression),
            simple_score_threshold: self.simple_score_threshold.or(fallback.simple_score_threshold),
            dpi: self.dpi.or(fallback.dpi),
            origin: self.origin.or(fallback.origin),
            workers: self.workers.or(fallback.workers),
        }
    }

    /// Full configuration: the preset for `mode` (or the configured mode,
    /// or resolved) with every given value applied on top.
    pub fn build(&self, mode: Option<AnalysisMode>) -> ResolverConfig {
        let mode = mode.or(self.mode).unwrap_or_default();
        let mut config = ResolverConfig::for_mode(mode);
        self.suppression.apply(&mut config.suppression);
        if let Some(v) = self.simple_score_threshold {
            config.simple_score_threshold = v;
        }
        if let Some(v) = self.dpi {
            config.dpi = v;
        }
        if let Some(origin) = self.origin {
            config.origin = origin;
        }
        if self.workers.is_some() {
            config.workers = self.workers;
        }
        config
    }
}

impl From<PartialResolverConfig> for ResolverConfig {
    fn from(partial: PartialResolverConfig) -> Self {
        partial.build(None)
    }
}
