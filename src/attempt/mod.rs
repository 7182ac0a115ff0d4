// src/attempt/mod.rs

//! The quiz attempt controller: a forward-only state machine over one
//! learner's pass through a quiz, its scoring, and the per-second countdown
//! that submits the attempt when time runs out.

pub mod controller;
pub mod error;
pub mod scoring;
pub mod session;
pub mod timer;

pub use controller::{AttemptState, AttemptStatus, Direction, TickOutcome};
pub use error::AttemptError;
pub use scoring::{AttemptResult, QuestionOutcome};
pub use session::{AttemptRegistry, AttemptSession};
pub use timer::{spawn_countdown, spawn_sweeper};
