//! Core data model types for quizclock.
//!
//! Problems are immutable once built; a run's progress lives in the runner.

use std::fmt;

/// One question/answer pair.
///
/// The question is kept verbatim, the answer is trimmed of surrounding
/// whitespace at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    question: String,
    answer: String,
}

impl Problem {
    pub fn new(question: impl Into<String>, answer: impl AsRef<str>) -> Self {
        Self {
            question: question.into(),
            answer: answer.as_ref().trim().to_string(),
        }
    }

    /// The question text, exactly as it appeared in the input record.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The expected answer, already trimmed.
    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// An ordered sequence of problems. Identity is positional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemSet {
    problems: Vec<Problem>,
}

impl ProblemSet {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Problem> {
        self.problems.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Problem> {
        self.problems.iter()
    }
}

impl FromIterator<Problem> for ProblemSet {
    fn from_iter<I: IntoIterator<Item = Problem>>(iter: I) -> Self {
        Self {
            problems: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ProblemSet {
    type Item = &'a Problem;
    type IntoIter = std::slice::Iter<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}

/// Correct answers out of the total number of problems in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "You scored {} out of {}", self.correct, self.total)
    }
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Ready,
    Running,
    Completed,
    TimedOut,
}

impl fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizPhase::Ready => write!(f, "ready"),
            QuizPhase::Running => write!(f, "running"),
            QuizPhase::Completed => write!(f, "completed"),
            QuizPhase::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Terminal state of a run, each carrying the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOutcome {
    /// Every problem was resolved before the deadline.
    Completed(Score),
    /// The deadline elapsed while waiting for an answer.
    TimedOut(Score),
}

impl QuizOutcome {
    pub fn score(&self) -> Score {
        match self {
            QuizOutcome::Completed(score) | QuizOutcome::TimedOut(score) => *score,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, QuizOutcome::TimedOut(_))
    }

    pub fn phase(&self) -> QuizPhase {
        match self {
            QuizOutcome::Completed(_) => QuizPhase::Completed,
            QuizOutcome::TimedOut(_) => QuizPhase::TimedOut,
        }
    }
}
