//! Wiring for the CLI subcommands: file I/O, config, client construction,
//! and the run summary. The pipeline crates stay free of paths and
//! processes; everything filesystem-shaped lives here.

use anyhow::{anyhow, bail, Context, Result};
use bitaudit_common::{ReportFormat, VerifyBackend};
use bitaudit_config::{AuditConfig, AuditConfigLoader};
use bitaudit_llm::client_from_config;
use bitaudit_pipeline::{
    aggregate, flatten, repair, report, FactExtractor, FactVerifier, FlattenOptions,
    GroundedContext, Verdict,
};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct AuditArgs {
    pub config: PathBuf,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub max_units: Option<usize>,
    pub bit_type: Option<String>,
    pub backend: Option<VerifyBackend>,
    pub format: Option<ReportFormat>,
    pub dump_units: Option<PathBuf>,
}

pub fn repair_file(input: &Path, output: Option<&Path>) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    tracing::info!(bytes = raw.len(), input = %input.display(), "read raw document");

    let doc = repair(&raw).map_err(|e| anyhow!("{e}"))?;

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| with_suffix(input, "fixed.json"));
    fs::write(&out, doc.pretty())
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("Successfully created: {}", out.display());
    Ok(())
}

pub fn flatten_file(
    input: &Path,
    output: Option<&Path>,
    max_units: Option<usize>,
    bit_type: Option<String>,
) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let doc = repair(&raw).map_err(|e| anyhow!("{e}"))?;

    let opts = FlattenOptions {
        max_units,
        bit_type,
    };
    let units = flatten(doc.value(), &opts)?;

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| with_suffix(input, "units.json"));
    fs::write(&out, serde_json::to_string_pretty(&units)?)
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!("Flattened {} units into: {}", units.len(), out.display());
    Ok(())
}

pub async fn audit_file(args: AuditArgs) -> Result<()> {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, input = %args.input.display(), "starting audit run");

    let cfg: AuditConfig = AuditConfigLoader::new()
        .with_file(&args.config)
        .load()
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    cfg.validate()?;

    // CLI flags win over the config file.
    let backend = args.backend.unwrap_or(cfg.pipeline.backend);
    if backend == VerifyBackend::Grounded && cfg.llm.grounded.is_none() {
        bail!("backend 'grounded' selected but llm.grounded is not configured");
    }

    let primary = client_from_config(&cfg.llm.primary)?;
    tracing::info!(model = primary.model_name(), "primary client ready");

    let extractor = FactExtractor::new(primary.clone());
    let mut verifier = FactVerifier::new(primary).with_context(GroundedContext {
        country: cfg.location.country.clone(),
        city: cfg.location.city.clone(),
    });
    if let Some(grounded_cfg) = &cfg.llm.grounded {
        let grounded = client_from_config(grounded_cfg)?;
        tracing::info!(model = grounded.model_name(), "grounded client ready");
        verifier = verifier.with_grounded(grounded);
    }

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let doc = repair(&raw).map_err(|e| anyhow!("{e}"))?;

    let opts = FlattenOptions {
        max_units: args.max_units.or(cfg.pipeline.max_units),
        bit_type: args.bit_type.or_else(|| cfg.pipeline.bit_type.clone()),
    };
    let units = flatten(doc.value(), &opts)?;

    if let Some(dump) = &args.dump_units {
        fs::write(dump, serde_json::to_string_pretty(&units)?)
            .with_context(|| format!("failed to write {}", dump.display()))?;
    }

    let rows = aggregate(&units, &extractor, &verifier, backend).await;

    let format = args.format.unwrap_or(cfg.report.format);
    let rendered = report::render(&rows, format)?;
    let out = args.output.unwrap_or_else(|| {
        with_suffix(
            &args.input,
            match format {
                ReportFormat::Json => "report.json",
                ReportFormat::Csv => "report.csv",
            },
        )
    });
    fs::write(&out, rendered)
        .with_context(|| format!("failed to write {}", out.display()))?;

    let incorrect = rows
        .iter()
        .filter(|r| matches!(r.verdict, Verdict::False { .. }))
        .count();
    let errors = rows
        .iter()
        .filter(|r| matches!(r.verdict, Verdict::Error { .. }))
        .count();

    println!("=== Summary ===");
    println!("Units processed: {}", units.len());
    println!("Facts extracted: {}", rows.len());
    println!("Incorrect facts: {incorrect}");
    if errors > 0 {
        println!("Verification errors: {errors}");
    }
    if let Some(filter) = &opts.bit_type {
        println!("Bit type filtered: {filter}");
    }
    println!("Backend: {backend}");
    println!("Results saved to: {}", out.display());

    tracing::info!(%run_id, rows = rows.len(), incorrect, errors, "audit run finished");
    Ok(())
}

/// `queryResults.json` -> `queryResults.fixed.json` and friends.
fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    input.with_extension(suffix)
}
