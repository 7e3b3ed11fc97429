//! Shared load → clean → join → derive pipeline used by every chart.

mod cleaner;
mod csv_rows;
mod derive;
mod diagnostics;
mod joiner;
mod loader;
pub mod samples;

pub use cleaner::{CleanedField, FieldPolicy, clean_field, clean_field_tracked, clean_numeric};
pub use csv_rows::{ParsedRows, parse_csv_rows};
pub use derive::{
    DerivedScales, ScaleRequest, SharedAxis, derive_scales, extent, metric_domain,
    normalize_into, value_domain,
};
pub use diagnostics::{Advisory, JoinMiss, PipelineDiagnostics};
pub use joiner::{InputRequirement, JoinInput, KeyNormalization, MetricColumn, join_datasets};
#[cfg(feature = "http-fetch")]
pub use loader::HttpFetcher;
pub use loader::{
    DataOrigin, DatasetRequest, FetchFailure, FsFetcher, LoadedDataset, Loader, MemoryFetcher,
    ResourceFetcher,
};
pub use samples::SampleTable;
