use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, ValueEnum};
use draft_consensus::{
    aggregate_reports, compute_document_report, failed_document_report, group_by_document,
    AlignerConfig, Draft, DocumentReport, Meta, Reconciler, ReconcilerBuilder, Reconciliation,
    Report, REPORT_SCHEMA_VERSION,
};
use indicatif::{ProgressBar, ProgressStyle};

#[path = "alignment_report/json_report_formatter.rs"]
mod json_report_formatter;
#[path = "alignment_report/text_table_report_formatter.rs"]
mod text_table_report_formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    /// Per-block diff table of every draft plus the consensus row.
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "alignment_report")]
#[command(about = "Reconcile OCR drafts and report alignment, consensus and confidence")]
struct Args {
    #[arg(long, env = "DRAFT_REPORT_INPUT", default_value = "test-data/drafts.json")]
    input: PathBuf,
    #[arg(long, env = "DRAFT_REPORT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "DRAFT_REPORT_OUT")]
    out: Option<PathBuf>,
    #[arg(
        long,
        env = "DRAFT_REPORT_FORMAT",
        value_enum,
        default_value_t = OutputFormat::Json
    )]
    output_format: OutputFormat,
    /// Only reconcile this document id.
    #[arg(long, env = "DRAFT_REPORT_DOCUMENT")]
    document: Option<String>,
    #[arg(long, env = "DRAFT_REPORT_NO_CONSENSUS", default_value_t = false)]
    no_consensus: bool,
    #[arg(long, env = "DRAFT_REPORT_SEQUENTIAL", default_value_t = false)]
    sequential: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let input_path = resolve_path(&repo_root, &args.input);

    let mut config = match args.config.as_ref() {
        Some(path) => AlignerConfig::load(&resolve_path(&repo_root, path))
            .map_err(|err| format!("Failed to load aligner config: {err}"))?,
        None => AlignerConfig::default(),
    };
    if args.no_consensus {
        config.generate_consensus = false;
    }
    if args.sequential {
        config.parallel_blocks = false;
    }
    let reconciler = ReconcilerBuilder::new(config)
        .build()
        .map_err(|err| format!("Failed to build Reconciler: {err}"))?;

    let drafts = load_drafts(&input_path)?;
    let draft_count = drafts.len();
    let mut documents = group_by_document(&drafts);
    if let Some(wanted) = args.document.as_ref() {
        documents.retain(|id, _| id == wanted);
    }
    if documents.is_empty() {
        return Err("No documents selected.".to_string());
    }

    let progress = ProgressBar::new(documents.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    let mut document_reports: Vec<DocumentReport> = Vec::with_capacity(documents.len());
    let mut tables = String::new();
    for (document_id, group) in &documents {
        progress.set_message(document_id.clone());
        match reconcile_document(&reconciler, document_id, group) {
            Ok((report, reconciliation)) => {
                if args.output_format == OutputFormat::Table {
                    tables.push_str(&text_table_report_formatter::render_document(
                        document_id,
                        &report,
                        &reconciliation,
                    ));
                }
                document_reports.push(report);
            }
            Err(err) => {
                progress.suspend(|| eprintln!("document '{document_id}' failed: {err}"));
                document_reports.push(failed_document_report(document_id, group.len(), &err));
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("reconciliation complete");

    match args.output_format {
        OutputFormat::Json => {
            let aggregates = aggregate_reports(&document_reports);
            let report = Report {
                schema_version: REPORT_SCHEMA_VERSION,
                meta: Meta {
                    generated_at: Utc::now().to_rfc3339(),
                    input_path: input_path.to_string_lossy().into_owned(),
                    document_count: document_reports.len(),
                    draft_count,
                },
                documents: document_reports,
                aggregates,
            };
            let out_path = resolve_out_path(&repo_root, args.out.as_ref());
            json_report_formatter::write_report(&out_path, &report)?;
            println!("{}", out_path.display());
        }
        OutputFormat::Table => match args.out.as_ref() {
            Some(path) => {
                let out_path = resolve_path(&repo_root, path);
                text_table_report_formatter::write_tables(&out_path, &tables)?;
                println!("{}", out_path.display());
            }
            None => print!("{tables}"),
        },
    }
    Ok(())
}

fn reconcile_document(
    reconciler: &Reconciler,
    document_id: &str,
    drafts: &[Draft],
) -> Result<(DocumentReport, Reconciliation), draft_consensus::AlignmentError> {
    let reconciliation = reconciler.reconcile(drafts)?;
    let report = compute_document_report(document_id, &reconciliation)?;
    Ok((report, reconciliation))
}

fn load_drafts(path: &Path) -> Result<Vec<Draft>, String> {
    require_path_exists(path, "Draft input file not found")?;
    let data = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read drafts '{}': {err}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|err| format!("Failed to parse drafts '{}': {err}", path.display()))
}

fn resolve_out_path(repo_root: &Path, out: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = out {
        return resolve_path(repo_root, path);
    }

    let run_id = Utc::now().format("%Y%m%dT%H%M%SZ");
    repo_root
        .join("target")
        .join("draft_reports")
        .join(format!("draft-report-{run_id}.json"))
}

fn resolve_path(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        Ok(())
    } else {
        Err(format!("{message}: {}", path.display()))
    }
}
