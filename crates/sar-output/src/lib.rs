//! `sar-output` — JSON replay file I/O for the SAR swarm coordination engine.
//!
//! `sar-sim` assembles [`sar_sim::ReplayFrame`]s in memory but never touches
//! the filesystem; this crate owns that boundary, mirroring the driver/output
//! split `rust_dt` draws between `dt-sim` and `dt-output`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sar_output::{save_replay, JsonReplayWriter, ReplayObserver};
//!
//! // One-shot, after the run:
//! sim.start_recording();
//! sim.run(&mut NoopObserver)?;
//! save_replay("replay.json", sim.config(), sim.recorded_messages(), sim.replay_frames())?;
//!
//! // Or streamed as the run progresses:
//! let writer = JsonReplayWriter::new("replay.json", sim.config().clone(), vec![]);
//! let mut obs = ReplayObserver::new(writer);
//! sim.run(&mut obs)?;
//! obs.take_error().map(|e| eprintln!("replay write error: {e}"));
//! ```

pub mod error;
pub mod json;
pub mod observer;
pub mod writer;


pub use error::{OutputError, OutputResult};
pub use json::{load_replay, save_replay, JsonReplayWriter, ReplayFile};
pub use observer::ReplayObserver;
pub use writer::ReplayWriter;
