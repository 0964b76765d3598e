use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// One evaluation case with its reference answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub question: String,
    pub context: String,
    pub ground_truth: String,
}

impl TestCase {
    /// Prompt sent to every variant for this case.
    pub fn prompt(&self) -> String {
        format!("Question: {}\nContext: {}", self.question, self.context)
    }
}

const BUILTIN_SUITE: &str = include_str!("../../data/financial_qa.json");

/// Load the test suite from `path`, or the built-in financial QA suite
/// when no override is configured.
pub fn load(path: Option<&Path>) -> Result<Vec<TestCase>, GateError> {
    let cases: Vec<TestCase> = match path {
        Some(p) => serde_json::from_str(&fs::read_to_string(p)?)?,
        None => serde_json::from_str(BUILTIN_SUITE)?,
    };
    if cases.is_empty() {
        return Err(GateError::EmptySuite);
    }
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_suite_parses() {
        let cases = load(None).expect("builtin suite loads");
        assert_eq!(cases.len(), 11);
        assert!(cases.iter().all(|c| !c.ground_truth.is_empty()));
    }

    #[test]
    fn prompt_combines_question_and_context() {
        let case = TestCase {
            question: "What is an APR?".to_string(),
            context: "Financial services".to_string(),
            ground_truth: "-".to_string(),
        };
        assert_eq!(
            case.prompt(),
            "Question: What is an APR?\nContext: Financial services"
        );
    }

    #[test]
    fn empty_suite_file_is_rejected() {
        let mut path = std::env::temp_dir();
        path.push(format!("modelgate-empty-suite-{}.json", std::process::id()));
        fs::write(&path, "[]").expect("write temp suite");
        let err = load(Some(&path)).expect_err("empty suite must fail");
        assert!(matches!(err, GateError::EmptySuite));
        let _ = fs::remove_file(&path);
    }
}
