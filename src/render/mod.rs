mod null_renderer;

pub use null_renderer::NullRenderer;

use crate::charts::ChartState;
use crate::error::ChartResult;

/// Contract implemented by any drawing backend.
///
/// Backends receive the finished `ChartState` (a view with its domains, or an
/// explicit no-data message) so drawing code stays isolated from loading,
/// joining and scale derivation.
pub trait Renderer {
    fn render(&mut self, state: &ChartState) -> ChartResult<()>;
}
