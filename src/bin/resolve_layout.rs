//! resolve_layout - Resolve recorded layout detections into page regions
//!
//! Reads the parser's page descriptions (size and text spans) and a
//! recording of detector output, runs the resolution pipeline on every page
//! and writes the resulting regions as JSON.
//!
//! Usage:
//!   resolve_layout pages.json detections.json --model prima -o layout.json
//!   resolve_layout pages.json detections.json --mode hierarchical --min-score 0.3

use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, ValueEnum};
use layout_oxide::detection::{ModelConfig, RecordedDetector, DEFAULT_MODEL};
use layout_oxide::geometry::PageOrigin;
use layout_oxide::config::{PartialResolverConfig, PartialSuppressionParams};
use layout_oxide::{AnalysisMode, DocumentProcessor, PageInput, PageOutcome, ResolverConfig, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Stages to run on each page.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Score threshold only
    Simple,
    /// Hierarchical suppression
    Hierarchical,
    /// Suppression, overlap resolution and text attachment
    Resolved,
}

impl From<Mode> for AnalysisMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Simple => AnalysisMode::Simple,
            Mode::Hierarchical => AnalysisMode::Hierarchical,
            Mode::Resolved => AnalysisMode::Resolved,
        }
    }
}

/// Origin of the parser's page coordinates.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Origin {
    /// PDF convention, y grows upwards
    BottomLeft,
    /// Already flipped, y grows downwards
    TopLeft,
}

impl From<Origin> for PageOrigin {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::BottomLeft => PageOrigin::BottomLeft,
            Origin::TopLeft => PageOrigin::TopLeft,
        }
    }
}

/// Resolve recorded layout detections into non-overlapping page regions.
#[derive(Parser, Debug)]
#[command(name = "resolve_layout")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Parser output: JSON object with a `pages` list
    pages: PathBuf,

    /// Recorded detections: JSON object keyed by page number
    detections: PathBuf,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    // === Model options ===
    /// Detection model the recording came from
    #[arg(short = 'm', long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Directory holding the model weights
    #[arg(long = "weights-dir", default_value = "weights")]
    weights_dir: PathBuf,

    // === Resolution options ===
    /// JSON configuration file; command line options override it
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Stages to run
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Minimum candidate score for suppression
    #[arg(long = "min-score")]
    min_score: Option<f64>,

    /// Containment ratio threshold
    #[arg(long = "containment-threshold")]
    containment_threshold: Option<f64>,

    /// IoU threshold
    #[arg(long = "iou-threshold")]
    iou_threshold: Option<f64>,

    /// Containment tolerance in pixels
    #[arg(long)]
    tolerance: Option<f64>,

    /// Score threshold in simple mode
    #[arg(long = "score-threshold")]
    score_threshold: Option<f64>,

    /// Resolution the pages were rendered at
    #[arg(long)]
    dpi: Option<f64>,

    /// Origin of the span coordinates
    #[arg(long, value_enum)]
    origin: Option<Origin>,

    /// Number of worker threads (default: one per CPU)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Keep failed pages in the output
    #[arg(long = "include-errors", action = ArgAction::SetTrue)]
    include_errors: bool,
}

#[derive(Debug, Deserialize)]
struct DocumentInput {
    pages: Vec<PageInput>,
}

#[derive(Debug, Serialize)]
struct DocumentOutput<'a> {
    processed_at: DateTime<Utc>,
    model: &'a str,
    mode: AnalysisMode,
    pages: Vec<&'a PageOutcome>,
}

/// Command line values win over the config file; whatever neither sets
/// comes from the preset of the resulting mode.
fn build_config(args: &Args) -> Result<ResolverConfig> {
    let file = match &args.config {
        Some(path) => PartialResolverConfig::from_json_file(path)?,
        None => PartialResolverConfig::default(),
    };
    let cli = PartialResolverConfig {
        mode: args.mode.map(Into::into),
        suppression: PartialSuppressionParams {
            min_score: args.min_score,
            containment_threshold: args.containment_threshold,
            iou_threshold: args.iou_threshold,
            tolerance: args.tolerance,
        },
        simple_score_threshold: args.score_threshold,
        dpi: args.dpi,
        origin: args.origin.map(Into::into),
        workers: args.workers,
    };

    let config = cli.or(file).build(None);
    config.validate()?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = build_config(args)?;
    let model = ModelConfig::preset(&args.model, &args.weights_dir)?;
    let detector = RecordedDetector::from_json_file(model, &args.detections)?;

    let input: DocumentInput = serde_json::from_reader(io::BufReader::new(File::open(&args.pages)?))?;
    log::info!("read {} pages from {}", input.pages.len(), args.pages.display());

    let mode = config.mode;
    let report = DocumentProcessor::new(config).process(&detector, &input.pages)?;
    for (page, error) in report.failed() {
        eprintln!("page {}: {}", page, error);
    }

    let output = DocumentOutput {
        processed_at: report.processed_at,
        model: &report.model,
        mode,
        pages: report.outcomes(args.include_errors),
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    serde_json::to_writer_pretty(&mut writer, &output)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout_oxide::layout::SuppressionParams;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["resolve_layout", "pages.json", "detections.json"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_default_is_resolved_preset() {
        let config = build_config(&parse(&[])).unwrap();
        assert_eq!(config, ResolverConfig::resolved());
    }

    #[test]
    fn test_mode_flag_selects_preset() {
        let config = build_config(&parse(&["--mode", "hierarchical"])).unwrap();
        assert_eq!(config.mode, AnalysisMode::Hierarchical);
        assert_eq!(config.suppression, SuppressionParams::hierarchical());
        assert_eq!(config.suppression.tolerance, 5.0);
    }

    #[test]
    fn test_flags_override_preset() {
        let config = build_config(&parse(&["--mode", "hierarchical", "--min-score", "0.4", "--dpi", "150"])).unwrap();
        assert_eq!(config.suppression.min_score, 0.4);
        assert_eq!(config.suppression.containment_threshold, 0.8);
        assert_eq!(config.dpi, 150.0);
    }

    #[test]
    fn test_mode_flag_over_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mode": "resolved", "suppression": {{"iou_threshold": 0.6}}}}"#).unwrap();
        let path = file.path().to_str().unwrap();
        let config = build_config(&parse(&["-c", path, "--mode", "hierarchical"])).unwrap();
        assert_eq!(config.mode, AnalysisMode::Hierarchical);
        assert_eq!(config.suppression.iou_threshold, 0.6);
        assert_eq!(config.suppression.min_score, 0.2);
        assert_eq!(config.suppression.tolerance, 5.0);
    }

    #[test]
    fn test_out_of_range_flag_rejected() {
        assert!(build_config(&parse(&["--iou-threshold", "1.5"])).is_err());
    }
}
