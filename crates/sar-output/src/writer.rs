//! The [`ReplayWriter`] trait implemented by replay file backends.

use sar_sim::ReplayFrame;

use crate::OutputResult;

/// Trait implemented by replay backends. JSON is the only one shipped here;
/// the shape leaves room for a future SQLite/Parquet backend the same way
/// `rust_dt`'s `OutputWriter` does for its row writers.
pub trait ReplayWriter {
    /// Append one recorded tick.
    fn write_frame(&mut self, frame: &ReplayFrame) -> OutputResult<()>;

    /// Flush and close the underlying file. Idempotent — safe to call more
    /// than once.
    fn finish(&mut self) -> OutputResult<()>;
}
