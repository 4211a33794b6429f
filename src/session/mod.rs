//! Trial Sessions: round lifecycle, payloads, and the runner that drives them
//!
//! # Components
//! - `phase.rs`: Phase enum and timer tokens
//! - `payload.rs`: Card deals, prediction rounds, telekinesis pushes
//! - `selection.rs`: Range checks on raw selections
//! - `state.rs`: TrialSession state machine
//! - `runner.rs`: Session + scheduler + registry wiring

pub mod payload;
pub mod phase;
pub mod runner;
pub mod selection;
pub mod state;

pub use payload::RoundPayload;
pub use phase::Phase;
pub use runner::TrialRunner;
pub use state::TrialSession;
