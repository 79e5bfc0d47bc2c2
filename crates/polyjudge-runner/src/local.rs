use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use polyjudge_core::{Language, LocalConfig};
use tempfile::TempDir;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::execution::{status, ExecutionBackend, ExecutionError, ExecutionOutcome, ExecutionStatus, Result};

/// Runs programs with the interpreters and compilers on `PATH`.
///
/// Every submission gets a fresh temp directory. This is a development
/// stand-in for Judge0 and isolates nothing.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    config: LocalConfig,
}

enum CommandResult {
    Finished {
        stdout: String,
        stderr: String,
        success: bool,
    },
    TimedOut,
}

struct Step<'a> {
    program: &'a str,
    args: &'a [&'a str],
}

impl LocalExecutor {
    pub fn new(config: LocalConfig) -> Self {
        Self { config }
    }

    fn source_file(language: Language) -> &'static str {
        match language {
            Language::Python => "main.py",
            Language::JavaScript => "main.js",
            Language::Java => "Main.java",
            Language::Cpp => "main.cpp",
        }
    }

    fn compile_step(language: Language) -> Option<Step<'static>> {
        match language {
            Language::Java => Some(Step {
                program: "javac",
                args: &["-encoding", "UTF-8", "Main.java"],
            }),
            Language::Cpp => Some(Step {
                program: "g++",
                args: &["-std=c++17", "-O2", "-o", "main", "main.cpp"],
            }),
            Language::Python | Language::JavaScript => None,
        }
    }

    fn run_step(language: Language) -> Step<'static> {
        match language {
            Language::Python => Step {
                program: "python3",
                args: &["main.py"],
            },
            Language::JavaScript => Step {
                program: "node",
                args: &["main.js"],
            },
            Language::Java => Step {
                program: "java",
                args: &["-cp", ".", "Main"],
            },
            Language::Cpp => Step {
                program: "./main",
                args: &[],
            },
        }
    }

    async fn execute_command(
        &self,
        dir: &Path,
        step: &Step<'_>,
        stdin: Option<&str>,
        timeout_ms: u64,
    ) -> Result<CommandResult> {
        let mut cmd = Command::new(step.program);
        cmd.args(step.args)
            .stdin(match stdin {
                Some(_) => Stdio::piped(),
                None => Stdio::null(),
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .current_dir(dir);

        let mut child = cmd.spawn().map_err(|source| ExecutionError::Toolchain {
            program: step.program.to_string(),
            source,
        })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            // A program that exits without reading closes the pipe early
            if let Err(e) = pipe.write_all(input.as_bytes()).await {
                debug!(error = %e, "stdin not fully consumed");
            }
        }

        let timeout = Duration::from_millis(timeout_ms);
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(CommandResult::Finished {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                success: output.status.success(),
            }),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Ok(CommandResult::TimedOut),
        }
    }

    fn timed_out(limit_ms: u64, elapsed: Duration) -> ExecutionOutcome {
        ExecutionOutcome {
            message: Some(format!("Time limit exceeded after {}ms", limit_ms)),
            status: Some(ExecutionStatus::new(status::TIME_LIMIT_EXCEEDED, "Time Limit Exceeded")),
            time: Some(format!("{:.3}", elapsed.as_secs_f64())),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ExecutionBackend for LocalExecutor {
    #[instrument(skip(self, source, stdin), fields(language = %language))]
    async fn submit(&self, language: Language, source: &str, stdin: &str) -> Result<ExecutionOutcome> {
        let workdir = TempDir::new()?;
        fs::write(workdir.path().join(Self::source_file(language)), source).await?;

        if let Some(step) = Self::compile_step(language) {
            let start = Instant::now();
            let compiled = self
                .execute_command(workdir.path(), &step, None, self.config.compile_timeout_ms)
                .await?;
            match compiled {
                CommandResult::TimedOut => {
                    warn!("Compilation timed out");
                    return Ok(Self::timed_out(self.config.compile_timeout_ms, start.elapsed()));
                }
                CommandResult::Finished { success: false, stdout, stderr } => {
                    return Ok(ExecutionOutcome {
                        compile_output: Some(format!("{}{}", stderr, stdout)),
                        status: Some(ExecutionStatus::new(status::COMPILATION_ERROR, "Compilation Error")),
                        ..Default::default()
                    });
                }
                CommandResult::Finished { success: true, .. } => {}
            }
        }

        let start = Instant::now();
        let ran = self
            .execute_command(
                workdir.path(),
                &Self::run_step(language),
                Some(stdin),
                self.config.run_timeout_ms,
            )
            .await?;
        let elapsed = start.elapsed();

        let outcome = match ran {
            CommandResult::TimedOut => {
                warn!(limit_ms = self.config.run_timeout_ms, "Run timed out");
                Self::timed_out(self.config.run_timeout_ms, elapsed)
            }
            CommandResult::Finished { stdout, stderr, success } => {
                let status = match success {
                    true => ExecutionStatus::new(status::ACCEPTED, "Accepted"),
                    false => ExecutionStatus::new(status::RUNTIME_ERROR, "Runtime Error (NZEC)"),
                };
                ExecutionOutcome {
                    stdout: Some(stdout),
                    stderr: (!stderr.is_empty()).then_some(stderr),
                    status: Some(status),
                    time: Some(format!("{:.3}", elapsed.as_secs_f64())),
                    ..Default::default()
                }
            }
        };

        debug!(status = ?outcome.status, "Local run finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_has_a_run_step() {
        for &language in Language::all() {
            assert!(!LocalExecutor::run_step(language).program.is_empty());
            assert!(!LocalExecutor::source_file(language).is_empty());
        }
        assert!(LocalExecutor::compile_step(Language::Python).is_none());
        assert!(LocalExecutor::compile_step(Language::Java).is_some());
    }

    #[tokio::test]
    #[ignore = "requires python3 on PATH"]
    async fn test_python_stdout_and_stdin() {
        let executor = LocalExecutor::default();
        let outcome = executor
            .submit(Language::Python, "import sys\nprint(sys.stdin.read().upper())", "abc")
            .await
            .unwrap();
        assert_eq!(outcome.stdout.as_deref().map(str::trim), Some("ABC"));
        assert_eq!(outcome.status_id(), Some(status::ACCEPTED));
    }

    #[tokio::test]
    #[ignore = "requires python3 on PATH"]
    async fn test_python_runtime_error_keeps_partial_stdout() {
        let executor = LocalExecutor::default();
        let outcome = executor
            .submit(Language::Python, "print('partial')\nraise ValueError('boom')", "")
            .await
            .unwrap();
        assert_eq!(outcome.stdout.as_deref().map(str::trim), Some("partial"));
        assert!(outcome.stderr.as_deref().unwrap_or_default().contains("ValueError"));
        assert_eq!(outcome.status_id(), Some(status::RUNTIME_ERROR));
    }

    #[tokio::test]
    #[ignore = "requires python3 on PATH"]
    async fn test_python_timeout() {
        let executor = LocalExecutor::new(LocalConfig {
            run_timeout_ms: 200,
            ..Default::default()
        });
        let outcome = executor
            .submit(Language::Python, "import time\ntime.sleep(5)", "")
            .await
            .unwrap();
        assert_eq!(outcome.status_id(), Some(status::TIME_LIMIT_EXCEEDED));
        assert!(outcome.message.is_some());
    }
}
