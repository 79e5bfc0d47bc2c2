use std::sync::Arc;

use polyjudge_codegen::HarnessBuilder;
use polyjudge_core::{Language, ProblemSpec, TestCase};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::execution::ExecutionBackend;
use crate::grader::{grade, timeout_report, CaseReport, SubmissionReport};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationEvent {
    Started { total: u32, entry_point: String },
    CaseStarted { current: u32, total: u32 },
    CaseFinished { current: u32, total: u32, report: CaseReport },
    Done { report: SubmissionReport },
    Cancelled,
}

/// Runs a submission against every test case of a problem, one case at a
/// time, each in its own execution
#[derive(Clone)]
pub struct Validator {
    backend: Arc<dyn ExecutionBackend>,
}

impl Validator {
    pub fn new(backend: Arc<dyn ExecutionBackend>) -> Self {
        Self { backend }
    }

    #[instrument(skip_all, fields(problem = %problem.title, language = %language))]
    pub async fn validate(&self, problem: &ProblemSpec, language: Language, source: &str) -> SubmissionReport {
        let builder = HarnessBuilder::new(problem);
        let mut cases = Vec::with_capacity(problem.test_cases.len());

        for case in &problem.test_cases {
            cases.push(self.run_case(&builder, language, source, case).await);
        }

        let report = SubmissionReport::from_cases(cases);
        info!(passed = report.passed_count, total = report.total, "Validation finished");
        report
    }

    /// Same as [`Validator::validate`], reporting progress over `tx`.
    /// Cancellation is checked between cases; a case already submitted
    /// runs to completion.
    pub async fn run_streaming(
        &self,
        problem: &ProblemSpec,
        language: Language,
        source: &str,
        cancel_token: CancellationToken,
        tx: mpsc::Sender<ValidationEvent>,
    ) {
        let builder = HarnessBuilder::new(problem);
        let total = problem.test_cases.len() as u32;

        let _ = tx
            .send(ValidationEvent::Started {
                total,
                entry_point: builder.entry_point(language, source),
            })
            .await;

        let mut cases = Vec::with_capacity(problem.test_cases.len());

        for (idx, case) in problem.test_cases.iter().enumerate() {
            if cancel_token.is_cancelled() {
                info!(completed = idx, total, "Validation cancelled");
                let _ = tx.send(ValidationEvent::Cancelled).await;
                return;
            }

            let current = idx as u32 + 1;
            let _ = tx.send(ValidationEvent::CaseStarted { current, total }).await;

            let report = self.run_case(&builder, language, source, case).await;
            cases.push(report.clone());

            let _ = tx
                .send(ValidationEvent::CaseFinished {
                    current,
                    total,
                    report,
                })
                .await;
        }

        let report = SubmissionReport::from_cases(cases);
        info!(passed = report.passed_count, total = report.total, "Validation finished");
        let _ = tx.send(ValidationEvent::Done { report }).await;
    }

    async fn run_case(
        &self,
        builder: &HarnessBuilder<'_>,
        language: Language,
        source: &str,
        case: &TestCase,
    ) -> CaseReport {
        let program = builder.build(language, source, &case.input);

        match self.backend.submit(language, &program.source, &case.input).await {
            Ok(outcome) => grade(case, &outcome),
            Err(e) => {
                warn!(error = %e, entry_point = %program.entry_point, "Execution failed");
                timeout_report(case, &e)
            }
        }
    }
}
