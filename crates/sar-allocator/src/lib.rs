//! `sar-allocator` — zone partitioning and sweep ordering for the drone
//! fleet (§4.3).
//!
//! # Crate layout
//!
//! | Module           | Contents                                                |
//! |-------------------|----------------------------------------------------------|
//! | [`allocate`]      | `allocate`, `should_reallocate` and their thresholds     |
//! | [`boustrophedon`] | `boustrophedon_order`, `optimize_for_speed`              |
//!
//! Both modules are pure functions over caller-owned maps; the allocator
//! holds no state of its own and performs no I/O, matching the teacher's
//! `dt-spatial::router` (algorithm-only, no state beyond its inputs).

pub mod allocate;
pub mod boustrophedon;


pub use allocate::{allocate, should_reallocate};
pub use boustrophedon::{boustrophedon_order, optimize_for_speed};
