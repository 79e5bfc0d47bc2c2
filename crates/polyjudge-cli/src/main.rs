use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use polyjudge_codegen::HarnessBuilder;
use polyjudge_core::{Language, ProblemSpec, PolyjudgeConfig};
use polyjudge_runner::{
    load_problems, ExecutionBackend, Judge0Client, LocalExecutor, ValidationEvent, Validator,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyjudge")]
#[command(about = "Generate, run and grade multi-language solutions", long_about = None)]
struct Cli {
    /// JSON config file; JUDGE0_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ProblemArgs {
    /// Problem file (single problem, list, or {"problems": [...]})
    #[arg(short, long)]
    problem: PathBuf,

    /// Problem title to pick from a multi-problem file
    #[arg(short, long)]
    title: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    Judge0,
    Local,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported languages
    Languages,

    /// Print the normalized parameter schema
    Schema {
        #[command(flatten)]
        problem: ProblemArgs,
    },

    /// Print the starter template for a language
    Template {
        #[command(flatten)]
        problem: ProblemArgs,

        #[arg(short, long)]
        language: Language,
    },

    /// Print the harness composed for one test case
    Compose {
        #[command(flatten)]
        problem: ProblemArgs,

        #[arg(short, long)]
        language: Language,

        /// User source file
        #[arg(short, long)]
        source: PathBuf,

        /// Zero-based test case index
        #[arg(long, default_value = "0")]
        case: usize,
    },

    /// Run a solution against every test case and print the report
    Run {
        #[command(flatten)]
        problem: ProblemArgs,

        #[arg(short, long)]
        language: Language,

        /// User source file
        #[arg(short, long)]
        source: PathBuf,

        #[arg(short, long, value_enum, default_value = "judge0")]
        backend: BackendKind,

        /// Print progress events as JSON lines
        #[arg(long)]
        stream: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Languages => cmd_languages(),
        Commands::Schema { problem } => cmd_schema(&problem)?,
        Commands::Template { problem, language } => cmd_template(&problem, language)?,
        Commands::Compose {
            problem,
            language,
            source,
            case,
        } => cmd_compose(&problem, language, &source, case)?,
        Commands::Run {
            problem,
            language,
            source,
            backend,
            stream,
        } => {
            let config = PolyjudgeConfig::load(cli.config.as_deref())?;
            cmd_run(&config, &problem, language, &source, backend, stream).await?
        }
    }

    Ok(())
}

fn select_problem(args: &ProblemArgs) -> Result<ProblemSpec> {
    let problems = load_problems(&args.problem)
        .with_context(|| format!("reading {}", args.problem.display()))?;

    let found = match &args.title {
        Some(title) => problems
            .into_iter()
            .find(|p| p.title.eq_ignore_ascii_case(title)),
        None => problems.into_iter().next(),
    };

    match found {
        Some(problem) => Ok(problem),
        None => bail!("no matching problem in {}", args.problem.display()),
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn cmd_languages() {
    println!();
    println!("  {:<12} {:<10} {}", "Language", "Judge0 id", "Extension");
    println!("{:-<40}", "");
    for language in Language::all() {
        println!(
            "  {:<12} {:<10} .{}",
            language.label(),
            language.judge0_id(),
            language.file_extension()
        );
    }
    println!();
}

fn cmd_schema(args: &ProblemArgs) -> Result<()> {
    let problem = select_problem(args)?;
    let builder = HarnessBuilder::new(&problem);
    println!("{}", serde_json::to_string_pretty(builder.schema())?);
    Ok(())
}

fn cmd_template(args: &ProblemArgs, language: Language) -> Result<()> {
    let problem = select_problem(args)?;
    print!("{}", HarnessBuilder::new(&problem).template(language));
    Ok(())
}

fn cmd_compose(args: &ProblemArgs, language: Language, source: &Path, case: usize) -> Result<()> {
    let problem = select_problem(args)?;
    let user_source = read_source(source)?;

    let Some(test_case) = problem.test_cases.get(case) else {
        bail!("{} has {} test cases, no case {}", problem.title, problem.test_cases.len(), case);
    };

    let program = HarnessBuilder::new(&problem).build(language, &user_source, &test_case.input);
    info!(entry_point = %program.entry_point, "Composed harness");
    print!("{}", program.source);
    Ok(())
}

async fn cmd_run(
    config: &PolyjudgeConfig,
    args: &ProblemArgs,
    language: Language,
    source: &Path,
    backend: BackendKind,
    stream: bool,
) -> Result<()> {
    let problem = select_problem(args)?;
    let user_source = read_source(source)?;

    let backend: Arc<dyn ExecutionBackend> = match backend {
        BackendKind::Judge0 => Arc::new(Judge0Client::new(config.judge0.clone(), config.polling.clone())),
        BackendKind::Local => Arc::new(LocalExecutor::new(config.local.clone())),
    };
    let validator = Validator::new(backend);

    info!(problem = %problem.title, %language, cases = problem.test_cases.len(), "Running submission");

    let report = match stream {
        true => {
            let (tx, mut rx) = mpsc::channel(32);
            let cancel_token = CancellationToken::new();

            let ctrl_c_token = cancel_token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c_token.cancel();
                }
            });

            let run = validator.run_streaming(&problem, language, &user_source, cancel_token, tx);
            let print = async {
                let mut last = None;
                while let Some(event) = rx.recv().await {
                    println!("{}", serde_json::to_string(&event)?);
                    last = Some(event);
                }
                anyhow::Ok(last)
            };
            let ((), last) = tokio::join!(run, print);

            match last? {
                Some(ValidationEvent::Done { report }) => report,
                _ => bail!("validation cancelled"),
            }
        }
        false => {
            let report = validator.validate(&problem, language, &user_source).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            report
        }
    };

    if !report.passed {
        std::process::exit(1);
    }
    Ok(())
}
