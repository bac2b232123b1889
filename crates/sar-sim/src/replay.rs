//! The in-memory replay frame `Sim` accumulates while recording (§10).
//!
//! `sar-sim` only assembles these; writing them to disk is `sar-output`'s
//! job (`ReplayWriter`), keeping this crate free of any filesystem access.

use sar_core::TickCount;

use crate::observer::FullState;

/// One recorded tick, mirroring `environment.py`'s `replay_log` entries
/// (`{tick, timestamp, state}`).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplayFrame {
    pub tick: TickCount,
    pub timestamp: f64,
    pub state: FullState,
}
