//! Per-chart lifecycle: one pipeline cycle per mount or selection change.

use tracing::{debug, trace};

use crate::charts::{ChartKind, ChartOutcome, PipelineContext};
use crate::error::{ChartError, ChartResult};

/// Identifies one pipeline cycle of a [`ChartSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleToken {
    generation: u64,
}

impl CycleToken {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// Holds the visible outcome of one chart instance.
///
/// Only the most recently started cycle may commit. Results of older cycles,
/// or of any cycle after `teardown`, are dropped and the previous outcome
/// stays visible.
#[derive(Debug)]
pub struct ChartSession {
    kind: ChartKind,
    selection: Option<String>,
    generation: u64,
    torn_down: bool,
    current: Option<ChartOutcome>,
}

impl ChartSession {
    #[must_use]
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            selection: None,
            generation: 0,
            torn_down: false,
            current: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    #[must_use]
    pub fn current(&self) -> Option<&ChartOutcome> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    #[must_use]
    pub fn is_current(&self, token: CycleToken) -> bool {
        !self.torn_down && token.generation == self.generation
    }

    /// Starts a new cycle for `selection`, superseding any cycle in flight.
    pub fn begin_cycle(&mut self, selection: Option<&str>) -> ChartResult<CycleToken> {
        if self.torn_down {
            return Err(ChartError::InvalidConfig(format!(
                "chart session `{}` has been torn down",
                self.kind
            )));
        }
        self.generation += 1;
        self.selection = selection.map(str::to_owned);
        trace!(
            chart = %self.kind,
            generation = self.generation,
            selection = ?self.selection,
            "pipeline cycle started"
        );
        Ok(CycleToken {
            generation: self.generation,
        })
    }

    /// Makes `outcome` visible if `token` is still the latest cycle.
    /// Returns whether the outcome was accepted.
    pub fn commit(&mut self, token: CycleToken, outcome: ChartOutcome) -> bool {
        if !self.is_current(token) {
            debug!(
                chart = %self.kind,
                generation = token.generation,
                latest = self.generation,
                torn_down = self.torn_down,
                "discarding stale pipeline result"
            );
            return false;
        }
        if outcome.kind != self.kind {
            debug!(
                chart = %self.kind,
                outcome = %outcome.kind,
                "discarding result of another chart kind"
            );
            return false;
        }
        debug!(
            chart = %self.kind,
            generation = token.generation,
            ready = outcome.state.is_ready(),
            advisories = outcome.diagnostics.advisories.len(),
            "pipeline result committed"
        );
        self.current = Some(outcome);
        true
    }

    /// Runs one full cycle for `selection` and commits its result.
    ///
    /// The session stays mutably borrowed until the cycle finishes, so a
    /// selection change cannot start a second cycle meanwhile. Hosts that
    /// overlap cycles call `begin_cycle`, run the chart themselves and hand
    /// the outcome to `commit`.
    pub async fn run(
        &mut self,
        ctx: &PipelineContext,
        selection: Option<&str>,
    ) -> ChartResult<bool> {
        let token = self.begin_cycle(selection)?;
        let outcome = self.kind.chart().run(ctx, selection).await;
        Ok(self.commit(token, outcome))
    }

    /// Ends the session; any cycle still in flight can no longer commit.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        debug!(chart = %self.kind, generation = self.generation, "chart session torn down");
    }
}
