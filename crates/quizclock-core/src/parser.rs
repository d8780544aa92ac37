//! Problem set loader.
//!
//! Converts `question,answer` records into an ordered [`ProblemSet`], and
//! validates sets for the `validate` command.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::LoadError;
use crate::model::{Problem, ProblemSet};

/// Build a problem set from in-memory two-column records.
///
/// Column 0 becomes the question (verbatim), column 1 the answer (trimmed).
/// Any record without exactly two columns fails the whole load.
pub fn parse_records<R, S>(records: &[R]) -> Result<ProblemSet, LoadError>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let fields: Vec<&str> = record.as_ref().iter().map(|f| f.as_ref()).collect();
            build_problem(i + 1, &fields)
        })
        .collect()
}

fn build_problem(record: usize, fields: &[&str]) -> Result<Problem, LoadError> {
    match fields {
        [question, answer] => Ok(Problem::new(*question, *answer)),
        _ => Err(LoadError::MalformedRecord {
            record,
            columns: fields.len(),
        }),
    }
}

/// Parse headerless `question,answer` CSV text.
pub fn parse_problem_csv_str(content: &str) -> Result<ProblemSet, LoadError> {
    parse_problem_csv_bytes(content.as_bytes())
}

/// Parse headerless `question,answer` CSV from raw bytes.
///
/// Records that are not valid UTF-8 are rejected as [`LoadError::Csv`].
pub fn parse_problem_csv_bytes(content: &[u8]) -> Result<ProblemSet, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut problems = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let fields: Vec<&str> = record.iter().collect();
        problems.push(build_problem(i + 1, &fields)?);
    }

    Ok(ProblemSet::new(problems))
}

/// Read and parse a problem file.
pub fn load_problem_file(path: &Path) -> Result<ProblemSet> {
    let content = std::fs::read(path)
        .with_context(|| format!("failed to read problem file: {}", path.display()))?;

    let set = parse_problem_csv_bytes(&content)
        .with_context(|| format!("failed to parse problem file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), problems = set.len(), "loaded problem set");
    Ok(set)
}

/// A warning from problem set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 1-based problem number, if the warning is about a single problem.
    pub problem: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check a problem set for entries that are legal but probably mistakes.
pub fn validate_problem_set(set: &ProblemSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.is_empty() {
        warnings.push(ValidationWarning {
            problem: None,
            message: "problem set is empty".into(),
        });
    }

    let mut seen = HashSet::new();
    for (i, problem) in set.iter().enumerate() {
        let number = i + 1;

        if problem.question().trim().is_empty() {
            warnings.push(ValidationWarning {
                problem: Some(number),
                message: "question is empty".into(),
            });
        }

        if problem.answer().is_empty() {
            warnings.push(ValidationWarning {
                problem: Some(number),
                message: "answer is empty".into(),
            });
        }

        if !seen.insert(problem.question()) {
            warnings.push(ValidationWarning {
                problem: Some(number),
                message: format!("duplicate question: {}", problem.question()),
            });
        }
    }

    warnings
}
