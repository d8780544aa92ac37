//! Scripted answer source for testing.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::input::AnswerSource;

/// One scripted reaction to a read.
#[derive(Debug, Clone)]
pub enum Step {
    /// Return this answer immediately.
    Answer(String),
    /// Sleep, then return this answer.
    Delayed(Duration, String),
    /// Report end of input.
    Eof,
    /// Fail the read with an I/O error.
    Fail,
    /// Never return, like a terminal nobody is typing into.
    Hang,
    /// Panic inside the read, killing the reader thread.
    Panic,
}

/// An [`AnswerSource`] that replays a fixed script.
///
/// Once the script runs out every read reports end of input. The read counter
/// is shared, so it stays observable after the source has been moved into the
/// runner.
pub struct ScriptedAnswers {
    steps: VecDeque<Step>,
    reads: Arc<AtomicU32>,
}

impl ScriptedAnswers {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            reads: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Script that answers immediately with each string in turn.
    pub fn answers<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(answers.into_iter().map(|a| Step::Answer(a.into())).collect())
    }

    /// Script that blocks on the very first read.
    pub fn silent() -> Self {
        Self::new(vec![Step::Hang])
    }

    /// Handle to the number of reads started so far.
    pub fn read_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.reads)
    }
}

impl AnswerSource for ScriptedAnswers {
    fn read_answer(&mut self) -> io::Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.steps.pop_front().unwrap_or(Step::Eof) {
            Step::Answer(answer) => Ok(Some(answer)),
            Step::Delayed(delay, answer) => {
                std::thread::sleep(delay);
                Ok(Some(answer))
            }
            Step::Eof => Ok(None),
            Step::Fail => Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted failure")),
            Step::Panic => panic!("scripted reader panic"),
            Step::Hang => loop {
                std::thread::park();
            },
        }
    }
}
