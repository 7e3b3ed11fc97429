pub mod scale;
pub mod types;

pub use scale::{BandScale, LinearScale, SqrtScale};
pub use types::{CombinedRecord, MetricDomain, NormalizedRecord, RawRow};
