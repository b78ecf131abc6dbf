use anyhow::Result;
use bitaudit_common::observability::{init_logging, LogConfig};
use bitaudit_common::{ReportFormat, VerifyBackend};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod run;

#[derive(Parser)]
#[command(name = "bitaudit", version, about = "Audits narrative/trivia corpora for factual accuracy")]
struct Cli {
    /// Path to the YAML configuration file (audit only).
    #[arg(long, global = true, default_value = "bitaudit.yaml", env = "BITAUDIT_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Repair a malformed query-results document and write valid JSON.
    Repair {
        input: PathBuf,
        /// Defaults to `<input>.fixed.json`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Repair and flatten a document into processable units.
    Flatten {
        input: PathBuf,
        /// Defaults to `<input>.units.json`.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        max_units: Option<usize>,
        #[arg(long)]
        bit_type: Option<String>,
    },
    /// Run the full audit pipeline and write the report.
    Audit {
        input: PathBuf,
        /// Defaults to `<input>.report.<format>`.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        max_units: Option<usize>,
        #[arg(long)]
        bit_type: Option<String>,
        /// Verification backend: primary or grounded.
        #[arg(long)]
        backend: Option<VerifyBackend>,
        /// Report encoding: json or csv.
        #[arg(long)]
        format: Option<ReportFormat>,
        /// Also write the flattened units to this path.
        #[arg(long)]
        dump_units: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig::default())?;

    match cli.command {
        Command::Repair { input, output } => run::repair_file(&input, output.as_deref()),
        Command::Flatten {
            input,
            output,
            max_units,
            bit_type,
        } => run::flatten_file(&input, output.as_deref(), max_units, bit_type),
        Command::Audit {
            input,
            output,
            max_units,
            bit_type,
            backend,
            format,
            dump_units,
        } => {
            run::audit_file(run::AuditArgs {
                config: cli.config,
                input,
                output,
                max_units,
                bit_type,
                backend,
                format,
                dump_units,
            })
            .await
        }
    }
}
