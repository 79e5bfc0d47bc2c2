//! Running generated programs: Judge0 and local execution backends, the
//! grader, and the sequential validation pipeline.

pub mod execution;
pub mod grader;
pub mod judge0;
pub mod local;
pub mod problem_loader;
pub mod validator;

pub use execution::{ExecutionBackend, ExecutionError, ExecutionOutcome, ExecutionStatus};
pub use grader::{grade, timeout_report, CaseReport, SubmissionReport};
pub use judge0::Judge0Client;
pub use local::LocalExecutor;
pub use problem_loader::{load_all_problems, load_problems, parse_problems, ProblemLoaderError};
pub use validator::{ValidationEvent, Validator};
