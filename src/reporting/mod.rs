//! Normalized report model, formatter registry, and file writer (C9, §4.8).

mod formats;
pub mod normalize;
pub mod registry;
pub mod writer;

pub use normalize::{FileEntry, NormalizedReport, ReportSummary, ReportType};
pub use registry::{Formatter, FormatterRegistry};
pub use writer::{auto_save, default_template, render_template, write_atomic, AutoSaveEntry};
