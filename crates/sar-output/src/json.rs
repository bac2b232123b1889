//! The JSON replay format and its [`ReplayWriter`] backend.
//!
//! Grounded on `environment.py::save_replay`/`load_replay`: a single JSON
//! object with the run's config, every delivered message, and the per-tick
//! replay log, written with 2-space indentation.

use std::path::{Path, PathBuf};

use sar_core::SimConfig;
use sar_proto::Message;
use sar_sim::ReplayFrame;

use crate::writer::ReplayWriter;
use crate::OutputResult;

/// The on-disk replay shape. Deserializing ignores unknown fields (default
/// serde behavior), so this stays forward-compatible as fields are added.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ReplayFile {
    pub config: SimConfig,
    pub messages: Vec<Message>,
    pub states: Vec<ReplayFrame>,
}

/// Writes a [`ReplayFile`] to `path` in one shot. `messages` is typically
/// `Sim::recorded_messages()` and `frames` is `Sim::replay_frames()`.
pub fn save_replay(
    path: impl AsRef<Path>,
    config: &SimConfig,
    messages: Vec<Message>,
    frames: &[ReplayFrame],
) -> OutputResult<()> {
    let file = ReplayFile {
        config: config.clone(),
        messages,
        states: frames.to_vec(),
    };
    let json = serde_json::to_vec_pretty(&file)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Reads a [`ReplayFile`] previously written by [`save_replay`]. Messages
/// that don't parse as JSON still fail the whole load (the file itself is
/// corrupt), but a message that parses fine yet carries a value no sender
/// could legitimately produce — e.g. a hand-edited battery outside `[0,
/// 100]` — is dropped with a `warn` log rather than failing the whole replay
/// (`spec.md` §7: "malformed message payload → log at warn, take fallback,
/// continue").
pub fn load_replay(path: impl AsRef<Path>) -> OutputResult<ReplayFile> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let mut file: ReplayFile = serde_json::from_slice(&bytes)?;

    file.messages.retain(|msg| match msg.validate() {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(path = %path.display(), message_id = ?msg.id, error = %err, "dropping malformed message from replay");
            false
        }
    });

    Ok(file)
}

/// A [`ReplayWriter`] that accumulates frames in memory and writes the full
/// [`ReplayFile`] on [`ReplayWriter::finish`]. `messages` is snapshotted at
/// construction — pass `Sim::recorded_messages()` once the run is over, or
/// an empty vec if the run wasn't recording the message log.
pub struct JsonReplayWriter {
    path: PathBuf,
    config: SimConfig,
    messages: Vec<Message>,
    frames: Vec<ReplayFrame>,
    finished: bool,
}

impl JsonReplayWriter {
    pub fn new(path: impl Into<PathBuf>, config: SimConfig, messages: Vec<Message>) -> Self {
        JsonReplayWriter {
            path: path.into(),
            config,
            messages,
            frames: Vec::new(),
            finished: false,
        }
    }
}

impl ReplayWriter for JsonReplayWriter {
    fn write_frame(&mut self, frame: &ReplayFrame) -> OutputResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        save_replay(&self.path, &self.config, std::mem::take(&mut self.messages), &self.frames)?;
        self.finished = true;
        Ok(())
    }
}
