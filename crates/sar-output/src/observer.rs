//! `ReplayObserver<W>` — bridges `SimObserver` to a [`ReplayWriter`],
//! grounded on `dt-output`'s `SimOutputObserver<W>`.

use sar_sim::{FullState, ReplayFrame, SimObserver};

use crate::writer::ReplayWriter;
use crate::OutputError;

/// A [`SimObserver`] that streams every tick's [`FullState`] to a
/// [`ReplayWriter`] as it happens, rather than waiting for the run to end —
/// useful for long runs where buffering every frame via `Sim::replay_frames`
/// would hold the whole history in memory at once.
///
/// Errors from the writer are stored internally because `SimObserver`
/// methods have no return value; check [`ReplayObserver::take_error`] after
/// the run.
pub struct ReplayObserver<W: ReplayWriter> {
    writer: W,
    last_error: Option<OutputError>,
}

impl<W: ReplayWriter> ReplayObserver<W> {
    pub fn new(writer: W) -> Self {
        ReplayObserver { writer, last_error: None }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect the file path it was built with).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: ReplayWriter> SimObserver for ReplayObserver<W> {
    fn on_state_update(&mut self, state: &FullState) {
        let frame = ReplayFrame {
            tick: state.state.tick,
            timestamp: state.state.elapsed_seconds,
            state: state.clone(),
        };
        let result = self.writer.write_frame(&frame);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_tick: sar_core::TickCount) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
