//! Station session
//!
//! Tracks how far network bring-up has progressed and ties the detector to
//! the publisher. The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;
pub mod session;

pub use events::Event;
pub use machine::SessionState;
pub use session::{SampleOutcome, Station};
