//! Exact-match grading of one execution against one test case.

use polyjudge_core::TestCase;
use serde::{Deserialize, Serialize};

use crate::execution::{ExecutionError, ExecutionOutcome};

/// Shown instead of the expected output of a hidden case
pub const HIDDEN_MARKER: &str = "Hidden";

/// Client-facing result for one test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub error: String,
    pub passed: bool,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
    pub passed: bool,
    pub passed_count: u32,
    pub total: u32,
    pub cases: Vec<CaseReport>,
}

impl SubmissionReport {
    /// All cases must pass; an empty case list passes nothing
    pub fn from_cases(cases: Vec<CaseReport>) -> Self {
        let total = cases.len() as u32;
        let passed_count = cases.iter().filter(|c| c.passed).count() as u32;
        Self {
            passed: total > 0 && passed_count == total,
            passed_count,
            total,
            cases,
        }
    }
}

fn trimmed(text: Option<&str>) -> &str {
    text.map(str::trim).unwrap_or_default()
}

fn masked_expected(case: &TestCase) -> String {
    match case.hidden {
        true => HIDDEN_MARKER.to_string(),
        false => case.expected_output.trim().to_string(),
    }
}

fn error_text(outcome: &ExecutionOutcome) -> String {
    let stderr = trimmed(outcome.stderr.as_deref());
    if !stderr.is_empty() {
        return stderr.to_string();
    }

    let compile = trimmed(outcome.compile_output.as_deref());
    if !compile.is_empty() {
        return compile.to_string();
    }

    let Some(status) = outcome.status.as_ref() else {
        return String::new();
    };
    match status.is_terminal() && !status.is_accepted() {
        true => {
            let message = trimmed(outcome.message.as_deref());
            match message.is_empty() {
                true => status.description.trim().to_string(),
                false => message.to_string(),
            }
        }
        false => String::new(),
    }
}

/// Compare trimmed stdout with the trimmed expected output. Any error text,
/// or a terminal status other than accepted, fails the case even when the
/// output matches.
pub fn grade(case: &TestCase, outcome: &ExecutionOutcome) -> CaseReport {
    let actual = trimmed(outcome.stdout.as_deref());
    let error = error_text(outcome);
    let passed = error.is_empty() && actual == case.expected_output.trim();

    CaseReport {
        input: case.input.clone(),
        expected_output: masked_expected(case),
        actual_output: actual.to_string(),
        error,
        passed,
        hidden: case.hidden,
    }
}

/// Failed case for a run that never produced an outcome
pub fn timeout_report(case: &TestCase, error: &ExecutionError) -> CaseReport {
    CaseReport {
        input: case.input.clone(),
        expected_output: masked_expected(case),
        actual_output: String::new(),
        error: error.to_string(),
        passed: false,
        hidden: case.hidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{status, ExecutionStatus};

    fn case(expected: &str, hidden: bool) -> TestCase {
        TestCase {
            input: "[2,7,11,15]\n9".into(),
            expected_output: expected.into(),
            hidden,
        }
    }

    fn accepted(stdout: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            stdout: Some(stdout.into()),
            status: Some(ExecutionStatus::new(status::ACCEPTED, "Accepted")),
            ..Default::default()
        }
    }

    #[test]
    fn test_trimmed_exact_match_passes() {
        let report = grade(&case(" [0,1] \n", false), &accepted("[0,1]\n"));
        assert!(report.passed);
        assert_eq!(report.actual_output, "[0,1]");
        assert_eq!(report.expected_output, "[0,1]");
        assert!(report.error.is_empty());
    }

    #[test]
    fn test_no_fuzzy_comparison() {
        assert!(!grade(&case("[0,1]", false), &accepted("[0, 1]")).passed);
        assert!(!grade(&case("2.5", false), &accepted("2.50000")).passed);
    }

    #[test]
    fn test_stderr_fails_even_with_matching_output() {
        let mut outcome = accepted("[0,1]");
        outcome.stderr = Some("DeprecationWarning: something\n".into());
        let report = grade(&case("[0,1]", false), &outcome);
        assert!(!report.passed);
        assert_eq!(report.error, "DeprecationWarning: something");
    }

    #[test]
    fn test_runtime_error_keeps_partial_output() {
        let outcome = ExecutionOutcome {
            stdout: Some("partial\n".into()),
            stderr: Some("Traceback (most recent call last):\nZeroDivisionError".into()),
            status: Some(ExecutionStatus::new(status::RUNTIME_ERROR, "Runtime Error (NZEC)")),
            ..Default::default()
        };
        let report = grade(&case("1", false), &outcome);
        assert!(!report.passed);
        assert_eq!(report.actual_output, "partial");
        assert!(report.error.contains("ZeroDivisionError"));
    }

    #[test]
    fn test_compile_output_is_the_error() {
        let outcome = ExecutionOutcome {
            compile_output: Some("Main.java:3: error: ';' expected\n".into()),
            status: Some(ExecutionStatus::new(status::COMPILATION_ERROR, "Compilation Error")),
            ..Default::default()
        };
        let report = grade(&case("[0,1]", false), &outcome);
        assert!(!report.passed);
        assert_eq!(report.error, "Main.java:3: error: ';' expected");
    }

    #[test]
    fn test_silent_failure_reports_status() {
        let outcome = ExecutionOutcome {
            status: Some(ExecutionStatus::new(status::TIME_LIMIT_EXCEEDED, "Time Limit Exceeded")),
            ..Default::default()
        };
        let report = grade(&case("[0,1]", false), &outcome);
        assert!(!report.passed);
        assert_eq!(report.error, "Time Limit Exceeded");
    }

    #[test]
    fn test_rejected_status_fails_matching_output() {
        let outcome = ExecutionOutcome {
            stdout: Some("[0,1]\n".into()),
            status: Some(ExecutionStatus::new(status::TIME_LIMIT_EXCEEDED, "Time Limit Exceeded")),
            message: Some("killed after 5s".into()),
            ..Default::default()
        };
        let report = grade(&case("[0,1]", false), &outcome);
        assert!(!report.passed);
        assert_eq!(report.actual_output, "[0,1]");
        assert_eq!(report.error, "killed after 5s");
    }

    #[test]
    fn test_hidden_case_masks_expected_output() {
        let report = grade(&case("[0,1]", true), &accepted("[0,1]"));
        assert!(report.passed);
        assert!(report.hidden);
        assert_eq!(report.expected_output, HIDDEN_MARKER);
    }

    #[test]
    fn test_timeout_report_fails_case() {
        let err = ExecutionError::Timeout {
            token: "abc".into(),
            attempts: 20,
        };
        let report = timeout_report(&case("[0,1]", true), &err);
        assert!(!report.passed);
        assert!(report.error.contains("abc"));
        assert_eq!(report.expected_output, HIDDEN_MARKER);
    }

    #[test]
    fn test_submission_report_requires_every_case() {
        let pass = grade(&case("1", false), &accepted("1"));
        let fail = grade(&case("1", false), &accepted("2"));

        let report = SubmissionReport::from_cases(vec![pass.clone(), fail]);
        assert!(!report.passed);
        assert_eq!((report.passed_count, report.total), (1, 2));

        assert!(SubmissionReport::from_cases(vec![pass]).passed);
        assert!(!SubmissionReport::from_cases(Vec::new()).passed);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = grade(&case("[0,1]", false), &accepted("[0,1]"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["expectedOutput"], "[0,1]");
        assert_eq!(json["actualOutput"], "[0,1]");
        assert_eq!(json["passed"], true);
    }
}
