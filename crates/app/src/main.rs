//! mock-exam: timed multiple-choice exams drawn from a CSV question bank.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use exam_core::model::TranslatorSettings;
use services::{ExamService, HttpTranslator, TranslationPort};
use storage::ExportFormat;

mod config;
mod render;
mod runner;

use config::FileConfig;
use runner::{ExamLoop, Finish};

#[derive(Parser)]
#[command(name = "mock-exam", version, about = "Timed mock exams from a CSV question bank")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a question file without starting an exam
    Validate {
        /// CSV file with `question,options,correct` columns
        file: PathBuf,
    },

    /// Take an exam
    Run {
        /// CSV file with `question,options,correct` columns
        file: PathBuf,

        /// Number of questions to draw (overrides config)
        #[arg(long)]
        questions: Option<u32>,

        /// Time limit in minutes (overrides config)
        #[arg(long)]
        minutes: Option<u32>,

        /// Config file path (default: ./config.yaml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the feedback report to this path after submission
        #[arg(long)]
        report: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,

        /// Seed for a reproducible question draw
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

impl From<ReportFormat> for ExportFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Markdown => ExportFormat::Markdown,
            ReportFormat::Json => ExportFormat::Json,
        }
    }
}

struct RunArgs {
    file: PathBuf,
    questions: Option<u32>,
    minutes: Option<u32>,
    config: Option<PathBuf>,
    report: Option<PathBuf>,
    format: ReportFormat,
    seed: Option<u64>,
}

fn validate(file: &Path) -> Result<()> {
    let mut service = ExamService::new(Arc::new(HttpTranslator::new(TranslatorSettings::disabled())));
    let count = service
        .import_csv(file)
        .with_context(|| format!("{} is not a valid question file", file.display()))?;
    println!("{}: {count} question(s) OK", file.display());
    Ok(())
}

async fn run_exam(args: RunArgs) -> Result<()> {
    let config = FileConfig::load(args.config.as_deref())?
        .with_env(|key| std::env::var(key).ok())
        .resolve(args.questions, args.minutes)?;

    let translator: Arc<dyn TranslationPort> = Arc::new(HttpTranslator::new(config.translator.clone()));
    if !config.translator.enabled() {
        info!("translation disabled; `t` will show the original text");
    }

    let mut service = ExamService::new(Arc::clone(&translator));
    service
        .import_csv(&args.file)
        .with_context(|| format!("failed to import {}", args.file.display()))?;

    let mut session = service.new_session();
    match args.seed {
        Some(seed) => {
            let count = usize::try_from(config.exam.num_questions()).unwrap_or(usize::MAX);
            session.start_with_rng(
                service.bank(),
                count,
                config.exam.time_limit_seconds(),
                &mut StdRng::seed_from_u64(seed),
            )?;
        }
        None => service.start(&mut session, &config.exam)?,
    }

    println!(
        "{} question(s), {} minute(s). Type h for help.\n",
        session.total_questions(),
        config.exam.time_limit_minutes()
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut exam = ExamLoop::new(session, std::io::stdout());
    let finish = exam.run(stdin, translator).await?;
    let session = exam.into_session();

    if finish == Finish::Abandoned {
        println!("Exam abandoned; no report written.");
        return Ok(());
    }
    if let (Some(path), Some(report)) = (args.report, session.report()) {
        storage::write_report(report, &path, args.format.into())
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Validate { file } => validate(&file),
        Commands::Run {
            file,
            questions,
            minutes,
            config,
            report,
            format,
            seed,
        } => {
            run_exam(RunArgs {
                file,
                questions,
                minutes,
                config,
                report,
                format,
                seed,
            })
            .await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
