// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Layout Oxide
//!
//! Geometric post-processing for document layout detection. A visual model
//! proposes labelled, scored boxes on a rendered page; this crate turns them
//! into a clean, non-overlapping set of regions and fills them with the text
//! a PDF parser extracted from the same page.
//!
//! ## Stages
//!
//! - **Suppression**: [`layout::HierarchicalSuppressor`] removes nested,
//!   mostly-covered and near-duplicate candidates, most confident first
//! - **Overlap resolution**: [`layout::OverlapResolver`] clips the survivors
//!   into a disjoint partition
//! - **Text attachment**: [`layout::TextAttacher`] maps page-space spans to
//!   pixel space via [`geometry::CoordinateMapper`] and assigns each span
//!   to a region
//!
//! [`pipeline::LayoutPipeline`] chains the stages for one page and
//! [`pipeline::DocumentProcessor`] runs it over a whole document in parallel.
//!
//! ## Quick Start
//!
//! ```
//! use layout_oxide::geometry::Rect;
//! use layout_oxide::layout::{Label, Layout, Region, TextSpan};
//! use layout_oxide::pipeline::{LayoutPipeline, PageInput};
//! use layout_oxide::ResolverConfig;
//!
//! # fn main() -> layout_oxide::Result<()> {
//! let candidates = Layout::from(vec![
//!     Region::new(Rect::new(0.0, 0.0, 612.0, 80.0), 0.95, Label::TitleRegion)?,
//!     Region::new(Rect::new(0.0, 60.0, 612.0, 792.0), 0.80, Label::TextRegion)?,
//!     Region::new(Rect::new(20.0, 10.0, 300.0, 60.0), 0.40, Label::TextRegion)?,
//! ]);
//! let page = PageInput::new(0, 612.0, 792.0)
//!     .with_spans(vec![TextSpan::new(Rect::new(30.0, 740.0, 280.0, 770.0), "Annual Report")]);
//!
//! let pipeline = LayoutPipeline::with_config(ResolverConfig::default().with_dpi(72.0));
//! let result = pipeline.resolve_candidates(&candidates, &page);
//!
//! assert_eq!(result.regions.len(), 2);
//! assert_eq!(result.regions.overlap_area(), 0.0);
//! assert_eq!(result.text(), "Annual Report ");
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Geometry and coordinate systems
pub mod geometry;

// Region resolution
pub mod layout;

// Detector interface
pub mod detection;

// Page and document pipeline
pub mod config;
pub mod pipeline;

// Re-exports
pub use config::{AnalysisMode, ResolverConfig};
pub use detection::{LayoutDetector, ModelConfig, RecordedDetector};
pub use error::{Error, Result};
pub use pipeline::{DocumentProcessor, DocumentReport, LayoutPipeline, PageInput, PageLayout, PageOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = "layout_oxide";
