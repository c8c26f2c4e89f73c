//! Time subsystem.
//!
//! - one `FrameClock` per window, ticked once per delivered frame
//! - one `AnimationScheduler` per animated surface, throttling redraws to an interval

mod frame_clock;
mod scheduler;

pub use frame_clock::{FrameClock, FrameTime};
pub use scheduler::{AnimationScheduler, FrameHost, FrameToken, Tick};
