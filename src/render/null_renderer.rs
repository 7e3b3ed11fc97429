use crate::charts::ChartState;
use crate::error::ChartResult;
use crate::render::Renderer;

/// No-op renderer used by tests and headless runs.
///
/// It still validates the state so tests catch non-finite values and
/// inverted domains before a real backend sees them.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub last_mark_count: usize,
    pub last_no_data_message: Option<String>,
    pub frames_rendered: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, state: &ChartState) -> ChartResult<()> {
        state.validate()?;
        match state {
            ChartState::Ready(view) => {
                self.last_mark_count = view.mark_count();
                self.last_no_data_message = None;
            }
            ChartState::NoData { message } => {
                self.last_mark_count = 0;
                self.last_no_data_message = Some(message.clone());
            }
        }
        self.frames_rendered += 1;
        Ok(())
    }
}
