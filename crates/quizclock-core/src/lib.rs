//! quizclock-core — Problem loading and the timed quiz runner.
//!
//! This crate turns `question,answer` records into an ordered problem set and
//! runs a quiz over it against a single global deadline.

pub mod config;
pub mod error;
pub mod input;
pub mod mock;
pub mod model;
pub mod parser;
pub mod runner;

pub use error::{LoadError, QuizError};
pub use model::{Problem, ProblemSet, QuizOutcome, Score};
pub use runner::{QuizRunner, RunnerConfig};
