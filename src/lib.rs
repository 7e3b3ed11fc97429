//! insurance-charts: data pipeline behind the insurance-rate charts.
//!
//! Loads small CSV resources with a fallback chain, cleans formatted
//! numbers, joins datasets on the state name and derives chart-ready
//! domains and scales. Drawing is left to a `Renderer` implementation.

pub mod charts;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod render;
pub mod session;
pub mod telemetry;

pub use charts::{Chart, ChartKind, ChartOutcome, ChartState, ChartView, PipelineContext};
pub use config::PipelineConfig;
pub use error::{ChartError, ChartResult};
pub use session::{ChartSession, CycleToken};
