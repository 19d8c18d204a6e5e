//! Worker tasks that back the runtime orchestration.
//!
//! The frame worker owns the scheduler and is the only place frames run.

mod frame;

pub use frame::{Command, FrameWorker};
