//! Frame timing utilities.
//!
//! One [`FrameClock`] per run loop produces delta-time snapshots; a
//! [`RedrawGate`] throttles rendering to a fixed cadence while the event
//! loop polls freely.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime, RedrawGate};
