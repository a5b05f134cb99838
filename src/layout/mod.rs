//! Region resolution algorithms for detected page layouts.
//!
//! This module turns raw detector candidates into a clean page layout:
//! - Hierarchical suppression of redundant candidates
//! - Overlap resolution into a disjoint partition
//! - Attachment of parser text to the surviving regions

pub mod labels;
pub mod overlap;
pub mod region;
pub mod suppressor;
pub mod text_attach;

// Re-export main types
pub use labels::{Label, LabelMap};
pub use overlap::{subtract_overlap, OverlapResolver};
pub use region::{CoordinateSpace, Layout, Region, TextSpan};
pub use suppressor::{HierarchicalSuppressor, SuppressionParams};
pub use text_attach::{AttachStats, TextAttacher};
