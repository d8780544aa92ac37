//! The timed quiz runner.
//!
//! A run owns one absolute deadline, fixed when the run starts. Each problem
//! is presented, then a fresh input-collection thread performs the blocking
//! read and hands the answer back through a single-use oneshot channel. The
//! runner waits on whichever comes first: the deadline or the handoff.
//!
//! A reader that loses the race is orphaned rather than cancelled. It is a
//! detached OS thread, so it never holds the process open, and it checks
//! whether its receiver is still alive before delivering, discarding answers
//! that arrive after the run moved on. The input source travels with the
//! handoff, so at most one live reader owns it at any time.

use std::io::{self, Write};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::QuizConfig;
use crate::error::QuizError;
use crate::input::AnswerSource;
use crate::model::{ProblemSet, QuizOutcome, QuizPhase, Score};

/// Upper bound for deadlines that would otherwise overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Configuration for a quiz run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Budget for the whole run, not per problem.
    pub time_limit: Duration,
    /// Trim typed answers before comparing them.
    pub trim_input: bool,
    /// Consecutive failed reads tolerated while problems remain.
    pub max_input_failures: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            trim_input: true,
            max_input_failures: 3,
        }
    }
}

impl RunnerConfig {
    /// Build a config from a limit in whole seconds. Non-positive limits
    /// become zero, which times out on the first problem.
    pub fn from_limit_secs(secs: i64) -> Self {
        Self {
            time_limit: Duration::from_secs(secs.max(0).unsigned_abs()),
            ..Self::default()
        }
    }
}

impl From<&QuizConfig> for RunnerConfig {
    fn from(config: &QuizConfig) -> Self {
        Self {
            trim_input: config.trim_input,
            max_input_failures: config.max_input_failures,
            ..Self::from_limit_secs(config.limit_secs)
        }
    }
}

/// Mutable progress of one run. Lives on the runner's stack only.
#[derive(Debug)]
struct QuizState {
    index: usize,
    correct: usize,
    deadline: Instant,
    phase: QuizPhase,
    consecutive_failures: u32,
}

impl QuizState {
    fn new() -> Self {
        Self {
            index: 0,
            correct: 0,
            deadline: Instant::now(),
            phase: QuizPhase::Ready,
            consecutive_failures: 0,
        }
    }

    fn start(&mut self, time_limit: Duration) {
        let now = Instant::now();
        self.deadline = now
            .checked_add(time_limit)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.transition(QuizPhase::Running);
    }

    fn transition(&mut self, phase: QuizPhase) {
        tracing::debug!(from = %self.phase, to = %phase, "quiz phase change");
        self.phase = phase;
    }

    fn deadline_passed(&self) -> bool {
        Instant::now() >= self.deadline
    }

    fn score(&self, total: usize) -> Score {
        Score {
            correct: self.correct,
            total,
        }
    }
}

/// What a reader thread delivers: its read result and the source itself.
struct Handoff {
    answer: io::Result<Option<String>>,
    source: Box<dyn AnswerSource>,
}

enum Resolution {
    Deadline,
    Delivered(Result<Handoff, oneshot::error::RecvError>),
}

/// Runs quizzes against a single global deadline.
pub struct QuizRunner {
    config: RunnerConfig,
}

impl QuizRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the quiz over `problems`, reading answers from `source`.
    ///
    /// Prompts and exactly one final score line are written to `out`. The
    /// score line is written before an `InputUnavailable` error is returned
    /// too; only configuration errors return before anything is written.
    pub async fn run<S, W>(
        &self,
        problems: &ProblemSet,
        source: S,
        out: &mut W,
    ) -> Result<QuizOutcome, QuizError>
    where
        S: AnswerSource,
        W: Write + ?Sized,
    {
        if self.config.max_input_failures == 0 {
            return Err(QuizError::InvalidConfig(
                "max_input_failures must be at least 1".into(),
            ));
        }

        let span = tracing::info_span!("quiz_run", run_id = %Uuid::new_v4(), problems = problems.len());
        self.run_inner(problems, Box::new(source), out)
            .instrument(span)
            .await
    }

    async fn run_inner<W>(
        &self,
        problems: &ProblemSet,
        mut source: Box<dyn AnswerSource>,
        out: &mut W,
    ) -> Result<QuizOutcome, QuizError>
    where
        W: Write + ?Sized,
    {
        let total = problems.len();
        let mut state = QuizState::new();
        state.start(self.config.time_limit);
        tracing::info!(limit_secs = self.config.time_limit.as_secs(), "quiz started");

        let deadline = tokio::time::sleep_until(state.deadline);
        tokio::pin!(deadline);

        for (i, problem) in problems.iter().enumerate() {
            let number = i + 1;
            write_out(out, &format!("Problem #{number}: {} = ", problem.question()));

            // The timer can fire late; the absolute deadline is authoritative.
            if state.deadline_passed() {
                return Ok(time_out(&mut state, number, total, out));
            }

            let (tx, rx) = oneshot::channel();
            if let Err(e) = spawn_reader(number, source, tx) {
                let score = state.score(total);
                write_score(out, score);
                return Err(QuizError::SpawnReader {
                    problem: number,
                    source: e,
                });
            }

            let resolution = tokio::select! {
                biased;
                () = &mut deadline => Resolution::Deadline,
                delivered = rx => Resolution::Delivered(delivered),
            };

            let handoff = match resolution {
                Resolution::Deadline => {
                    return Ok(time_out(&mut state, number, total, out));
                }
                Resolution::Delivered(Ok(_)) if state.deadline_passed() => {
                    tracing::debug!(problem = number, "answer arrived after the deadline");
                    return Ok(time_out(&mut state, number, total, out));
                }
                Resolution::Delivered(Ok(handoff)) => handoff,
                Resolution::Delivered(Err(_)) => {
                    // The reader died without handing the source back.
                    let score = state.score(total);
                    tracing::warn!(problem = number, "input reader exited without an answer");
                    write_score(out, score);
                    return Err(QuizError::InputUnavailable {
                        score,
                        failures: state.consecutive_failures + 1,
                    });
                }
            };
            source = handoff.source;

            match handoff.answer {
                Ok(Some(answer)) => {
                    state.consecutive_failures = 0;
                    let correct = self.answer_matches(problem.answer(), &answer);
                    if correct {
                        state.correct += 1;
                    }
                    tracing::debug!(problem = number, correct, "answer received");
                }
                Ok(None) => {
                    state.consecutive_failures += 1;
                    tracing::debug!(problem = number, "end of input, problem left unanswered");
                }
                Err(e) => {
                    state.consecutive_failures += 1;
                    tracing::warn!(problem = number, error = %e, "failed to read answer");
                }
            }
            state.index += 1;
            debug_assert!(state.correct <= state.index && state.index <= total);

            if state.consecutive_failures >= self.config.max_input_failures && state.index < total
            {
                let score = state.score(total);
                tracing::warn!(
                    failures = state.consecutive_failures,
                    remaining = total - state.index,
                    "abandoning run, input source unusable"
                );
                write_score(out, score);
                return Err(QuizError::InputUnavailable {
                    score,
                    failures: state.consecutive_failures,
                });
            }
        }

        state.transition(QuizPhase::Completed);
        let score = state.score(total);
        tracing::info!(correct = score.correct, total, "quiz completed");
        write_score(out, score);
        Ok(QuizOutcome::Completed(score))
    }

    fn answer_matches(&self, expected: &str, given: &str) -> bool {
        if self.config.trim_input {
            given.trim() == expected
        } else {
            given == expected
        }
    }
}

/// Move the run to `TimedOut` and write the final score line.
fn time_out<W: Write + ?Sized>(
    state: &mut QuizState,
    problem: usize,
    total: usize,
    out: &mut W,
) -> QuizOutcome {
    state.transition(QuizPhase::TimedOut);
    let score = state.score(total);
    tracing::info!(
        problem,
        correct = score.correct,
        "deadline elapsed while waiting for an answer"
    );
    write_score(out, score);
    QuizOutcome::TimedOut(score)
}

/// Start the input-collection thread for one problem.
fn spawn_reader(
    problem: usize,
    mut source: Box<dyn AnswerSource>,
    tx: oneshot::Sender<Handoff>,
) -> io::Result<()> {
    std::thread::Builder::new()
        .name(format!("quiz-input-{problem}"))
        .spawn(move || {
            let answer = source.read_answer();
            if tx.is_closed() {
                tracing::debug!(problem, "answer arrived after the run ended, discarding");
                return;
            }
            let _ = tx.send(Handoff { answer, source });
        })
        .map(|_| ())
}

fn write_out<W: Write + ?Sized>(out: &mut W, text: &str) {
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        tracing::warn!(error = %e, "failed to write quiz output");
    }
}

fn write_score<W: Write + ?Sized>(out: &mut W, score: Score) {
    write_out(out, &format!("\n{score}\n"));
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::mock::{ScriptedAnswers, Step};
    use crate::parser::parse_records;

    fn capitals() -> ProblemSet {
        parse_records(&[["2+2", "4"], ["capital of France", "Paris "]]).unwrap()
    }

    fn runner(limit: Duration) -> QuizRunner {
        QuizRunner::new(RunnerConfig {
            time_limit: limit,
            ..RunnerConfig::default()
        })
    }

    fn text(out: &[u8]) -> String {
        String::from_utf8_lossy(out).into_owned()
    }

    #[tokio::test]
    async fn all_correct_completes() {
        let mut out = Vec::new();
        let outcome = runner(Duration::from_secs(30))
            .run(&capitals(), ScriptedAnswers::answers(["4", "Paris"]), &mut out)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QuizOutcome::Completed(Score {
                correct: 2,
                total: 2
            })
        );
        let out = text(&out);
        assert!(out.starts_with("Problem #1: 2+2 = Problem #2: capital of France = "));
        assert!(out.ends_with("\nYou scored 2 out of 2\n"));
    }

    #[tokio::test]
    async fn wrong_answer_is_not_counted() {
        let mut out = Vec::new();
        let outcome = runner(Duration::from_secs(30))
            .run(&capitals(), ScriptedAnswers::answers(["5", "Paris"]), &mut out)
            .await
            .unwrap();

        assert_eq!(outcome.score().correct, 1);
        assert!(!outcome.is_timed_out());
        assert!(text(&out).contains("You scored 1 out of 2"));
    }

    #[tokio::test]
    async fn deadline_before_first_answer_times_out() {
        let mut out = Vec::new();
        let outcome = runner(Duration::from_millis(50))
            .run(&capitals(), ScriptedAnswers::silent(), &mut out)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QuizOutcome::TimedOut(Score {
                correct: 0,
                total: 2
            })
        );
        let out = text(&out);
        assert!(out.contains("Problem #1: 2+2 = "));
        assert!(!out.contains("Problem #2"));
        assert_eq!(out.matches("You scored").count(), 1);
    }

    #[tokio::test]
    async fn zero_limit_times_out_on_first_problem() {
        let source = ScriptedAnswers::answers(["4", "Paris"]);
        let reads = source.read_counter();
        let mut out = Vec::new();
        let outcome = QuizRunner::new(RunnerConfig::from_limit_secs(0))
            .run(&capitals(), source, &mut out)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QuizOutcome::TimedOut(Score {
                correct: 0,
                total: 2
            })
        );
        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert_eq!(text(&out), "Problem #1: 2+2 = \nYou scored 0 out of 2\n");
    }

    #[tokio::test]
    async fn ready_answer_never_beats_zero_limit() {
        for _ in 0..50 {
            let mut out = Vec::new();
            let outcome = runner(Duration::ZERO)
                .run(&capitals(), ScriptedAnswers::answers(["4", "Paris"]), &mut out)
                .await
                .unwrap();

            assert_eq!(
                outcome,
                QuizOutcome::TimedOut(Score {
                    correct: 0,
                    total: 2
                })
            );
            assert!(!text(&out).contains("Problem #2"));
        }
    }

    #[tokio::test]
    async fn answer_just_past_deadline_gets_no_credit() {
        let source = ScriptedAnswers::new(vec![
            Step::Answer("4".into()),
            Step::Delayed(Duration::from_millis(101), "Paris".into()),
        ]);
        let mut out = Vec::new();

        let outcome = runner(Duration::from_millis(100))
            .run(&capitals(), source, &mut out)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QuizOutcome::TimedOut(Score {
                correct: 1,
                total: 2
            })
        );
        assert!(text(&out).ends_with("\nYou scored 1 out of 2\n"));
    }

    #[tokio::test]
    async fn reader_panic_aborts_with_one_score_line() {
        let source = ScriptedAnswers::new(vec![Step::Answer("4".into()), Step::Panic]);
        let mut out = Vec::new();

        let err = runner(Duration::from_secs(30))
            .run(&capitals(), source, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::InputUnavailable { failures: 1, .. }));
        assert_eq!(
            err.score(),
            Some(Score {
                correct: 1,
                total: 2
            })
        );
        let out = text(&out);
        assert_eq!(out.matches("You scored").count(), 1);
        assert!(out.ends_with("\nYou scored 1 out of 2\n"));
    }

    #[tokio::test]
    async fn negative_limit_behaves_like_zero() {
        let config = RunnerConfig::from_limit_secs(-5);
        assert_eq!(config.time_limit, Duration::ZERO);

        let mut out = Vec::new();
        let outcome = QuizRunner::new(config)
            .run(&capitals(), ScriptedAnswers::silent(), &mut out)
            .await
            .unwrap();
        assert_eq!(outcome.score().total, 2);
        assert!(outcome.is_timed_out());
    }

    #[tokio::test]
    async fn empty_set_completes_without_reading() {
        let source = ScriptedAnswers::answers(["unused"]);
        let reads = source.read_counter();
        let mut out = Vec::new();

        let outcome = runner(Duration::from_secs(30))
            .run(&ProblemSet::default(), source, &mut out)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QuizOutcome::Completed(Score {
                correct: 0,
                total: 0
            })
        );
        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert_eq!(text(&out), "\nYou scored 0 out of 0\n");
    }

    #[tokio::test]
    async fn late_answer_is_discarded() {
        let source = ScriptedAnswers::new(vec![Step::Delayed(
            Duration::from_millis(300),
            "4".into(),
        )]);
        let mut out = Vec::new();

        let outcome = runner(Duration::from_millis(50))
            .run(&capitals(), source, &mut out)
            .await
            .unwrap();

        assert_eq!(outcome.score().correct, 0);
        assert!(outcome.is_timed_out());

        // Let the orphaned reader finish; nothing it does can reach the result.
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(text(&out).matches("You scored").count(), 1);
    }

    #[tokio::test]
    async fn timeout_mid_run_keeps_earlier_score() {
        let source = ScriptedAnswers::new(vec![Step::Answer("4".into()), Step::Hang]);
        let mut out = Vec::new();

        let outcome = runner(Duration::from_millis(100))
            .run(&capitals(), source, &mut out)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QuizOutcome::TimedOut(Score {
                correct: 1,
                total: 2
            })
        );
        let out = text(&out);
        assert!(out.contains("Problem #2: capital of France = "));
        assert!(out.ends_with("\nYou scored 1 out of 2\n"));
    }

    #[tokio::test]
    async fn deadline_is_global_not_per_problem() {
        let set = parse_records(&[["1+1", "2"], ["2+2", "4"], ["3+3", "6"]]).unwrap();
        let step = |a: &str| Step::Delayed(Duration::from_millis(200), a.to_string());
        let source = ScriptedAnswers::new(vec![step("2"), step("4"), step("6")]);
        let mut out = Vec::new();

        let outcome = runner(Duration::from_millis(500))
            .run(&set, source, &mut out)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QuizOutcome::TimedOut(Score {
                correct: 2,
                total: 3
            })
        );
    }

    #[tokio::test]
    async fn end_of_input_leaves_problems_unanswered() {
        let set = parse_records(&[["1+1", "2"], ["2+2", "4"], ["3+3", "6"]]).unwrap();
        let mut out = Vec::new();

        let outcome = runner(Duration::from_secs(30))
            .run(&set, ScriptedAnswers::answers(["2"]), &mut out)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            QuizOutcome::Completed(Score {
                correct: 1,
                total: 3
            })
        );
    }

    #[tokio::test]
    async fn repeated_input_failures_abort_the_run() {
        let set = parse_records(&[["1+1", "2"], ["2+2", "4"], ["3+3", "6"]]).unwrap();
        let runner = QuizRunner::new(RunnerConfig {
            max_input_failures: 1,
            ..RunnerConfig::default()
        });
        let mut out = Vec::new();

        let err = runner
            .run(&set, ScriptedAnswers::new(vec![Step::Answer("2".into()), Step::Fail]), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::InputUnavailable { failures: 1, .. }));
        assert_eq!(
            err.score(),
            Some(Score {
                correct: 1,
                total: 3
            })
        );
        let out = text(&out);
        assert!(!out.contains("Problem #3"));
        assert_eq!(out.matches("You scored 1 out of 3").count(), 1);
    }

    #[tokio::test]
    async fn successful_read_resets_failure_count() {
        let set = parse_records(&[["a", "1"], ["b", "2"], ["c", "3"], ["d", "4"]]).unwrap();
        let runner = QuizRunner::new(RunnerConfig {
            max_input_failures: 2,
            ..RunnerConfig::default()
        });
        let source = ScriptedAnswers::new(vec![
            Step::Fail,
            Step::Answer("2".into()),
            Step::Fail,
            Step::Answer("4".into()),
        ]);
        let mut out = Vec::new();

        let outcome = runner.run(&set, source, &mut out).await.unwrap();
        assert_eq!(
            outcome,
            QuizOutcome::Completed(Score {
                correct: 2,
                total: 4
            })
        );
    }

    #[tokio::test]
    async fn failure_on_last_problem_still_completes() {
        let runner = QuizRunner::new(RunnerConfig {
            max_input_failures: 1,
            ..RunnerConfig::default()
        });
        let mut out = Vec::new();

        let outcome = runner
            .run(&capitals(), ScriptedAnswers::answers(["4"]), &mut out)
            .await
            .unwrap();
        assert_eq!(outcome.score().correct, 1);
        assert!(!outcome.is_timed_out());
    }

    #[tokio::test]
    async fn trimming_can_be_disabled() {
        let set = parse_records(&[["2+2", "4"]]).unwrap();

        let mut out = Vec::new();
        let lenient = runner(Duration::from_secs(30))
            .run(&set, ScriptedAnswers::answers([" 4 "]), &mut out)
            .await
            .unwrap();
        assert_eq!(lenient.score().correct, 1);

        let strict = QuizRunner::new(RunnerConfig {
            trim_input: false,
            ..RunnerConfig::default()
        });
        let mut out = Vec::new();
        let outcome = strict
            .run(&set, ScriptedAnswers::answers([" 4 "]), &mut out)
            .await
            .unwrap();
        assert_eq!(outcome.score().correct, 0);
    }

    #[tokio::test]
    async fn comparison_is_case_sensitive() {
        let mut out = Vec::new();
        let outcome = runner(Duration::from_secs(30))
            .run(&capitals(), ScriptedAnswers::answers(["4", "paris"]), &mut out)
            .await
            .unwrap();
        assert_eq!(outcome.score().correct, 1);
    }

    #[tokio::test]
    async fn zero_failure_budget_is_rejected_up_front() {
        let runner = QuizRunner::new(RunnerConfig {
            max_input_failures: 0,
            ..RunnerConfig::default()
        });
        let mut out = Vec::new();

        let err = runner
            .run(&capitals(), ScriptedAnswers::silent(), &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::InvalidConfig(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn runner_config_from_quiz_config() {
        let config = QuizConfig {
            limit_secs: 7,
            trim_input: false,
            max_input_failures: 5,
            ..QuizConfig::default()
        };
        let runner_config = RunnerConfig::from(&config);
        assert_eq!(runner_config.time_limit, Duration::from_secs(7));
        assert!(!runner_config.trim_input);
        assert_eq!(runner_config.max_input_failures, 5);
    }

    #[test]
    fn huge_limit_does_not_overflow() {
        let mut state = QuizState::new();
        state.start(Duration::from_secs(u64::MAX));
        assert_eq!(state.phase, QuizPhase::Running);
        assert!(state.deadline > Instant::now());
    }
}
