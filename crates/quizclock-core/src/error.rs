//! Error types for loading problem sets and running quizzes.

use thiserror::Error;

use crate::model::Score;

/// Errors raised while turning raw records into a problem set.
///
/// Any of these is fatal: a quiz never starts from a partially parsed set.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A record did not have exactly a question and an answer column.
    #[error("record {record} has {columns} column(s), expected 2 (question,answer)")]
    MalformedRecord { record: usize, columns: usize },

    /// The CSV reader rejected the input.
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors surfaced by the quiz runner.
#[derive(Debug, Error)]
pub enum QuizError {
    /// The runner configuration was rejected before the first prompt.
    #[error("invalid runner configuration: {0}")]
    InvalidConfig(String),

    /// The answer source failed repeatedly and the run was abandoned.
    ///
    /// The score line has already been written when this is returned.
    #[error("input unavailable after {failures} consecutive failed reads ({score})")]
    InputUnavailable { score: Score, failures: u32 },

    /// The input-collection thread could not be started.
    #[error("failed to start input reader for problem #{problem}")]
    SpawnReader {
        problem: usize,
        #[source]
        source: std::io::Error,
    },
}

impl QuizError {
    /// Returns the score reached before the run stopped, if it got that far.
    pub fn score(&self) -> Option<Score> {
        match self {
            QuizError::InputUnavailable { score, .. } => Some(*score),
            _ => None,
        }
    }
}
