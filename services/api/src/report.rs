use crate::infra::{build_pipeline, parse_family};
use clap::Args;
use forest_dss::config::AppConfig;
use forest_dss::eligibility::{
    read_record_at, read_records, write_labelled, DiagnosticKind, EligibilityReport, IngestError,
    RecordFamily, RuleEngine, RuleOutcome, SchemeResult,
};
use forest_dss::error::AppError;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Record family: ifr, cr or cfr
    #[arg(long, value_parser = parse_family)]
    pub(crate) family: RecordFamily,
    /// CSV file holding the records
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Zero-indexed data row to evaluate
    #[arg(long, default_value_t = 0)]
    pub(crate) row: usize,
}

#[derive(Args, Debug)]
pub(crate) struct LabelsArgs {
    /// Record family: ifr, cr or cfr
    #[arg(long, value_parser = parse_family)]
    pub(crate) family: RecordFamily,
    /// CSV file of raw records
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Destination for the labelled CSV
    #[arg(long)]
    pub(crate) output: PathBuf,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let pipeline = build_pipeline(&config.models);
    let record = read_record_at(&args.csv, args.row)?;
    let report = pipeline.evaluate(args.family, &record)?;
    print!("{}", render_report(&report));
    Ok(())
}

pub(crate) fn run_labels(args: LabelsArgs) -> Result<(), AppError> {
    let LabelsArgs {
        family,
        input,
        output,
    } = args;

    let file = File::open(&input).map_err(|source| IngestError::Open {
        path: input.display().to_string(),
        source,
    })?;
    let engine = RuleEngine::new(family);
    let outcomes = read_records(file)?
        .iter()
        .map(|raw| engine.apply(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let writer = BufWriter::new(File::create(&output)?);
    write_labelled(writer, &outcomes)?;

    println!(
        "Labelled {} {} rows into {}",
        outcomes.len(),
        family,
        output.display()
    );
    for (scheme, positives) in positive_counts(family, &outcomes) {
        println!("  {scheme}: {positives}");
    }
    Ok(())
}

pub(crate) fn render_report(report: &EligibilityReport) -> String {
    let mut out = String::new();
    if report.results.is_empty() {
        let _ = writeln!(out, "No {} scheme models available.", report.family);
    }

    for result in &report.results {
        render_result(&mut out, result);
    }

    if !report.diagnostics.is_empty() {
        let _ = writeln!(out, "\nNot fully scored:");
        for diagnostic in &report.diagnostics {
            let _ = writeln!(
                out,
                "  {} ({}): {}",
                diagnostic.scheme,
                diagnostic_label(diagnostic.kind),
                diagnostic.detail
            );
        }
    }

    out
}

fn render_result(out: &mut String, result: &SchemeResult) {
    let _ = writeln!(out, "\nSCHEME: {}", result.scheme);
    let _ = writeln!(
        out,
        "  Probability: {:.3} | Eligible: {}",
        result.probability, result.decision
    );
    let _ = writeln!(out, "  Reason: {}", result.reason);
    let _ = writeln!(out, "  Benefit: {}", result.benefit);
    let _ = writeln!(out, "  Impact: {}", result.impact);

    if let Some(features) = &result.top_features {
        let rendered: Vec<String> = features
            .iter()
            .map(|item| format!("{} ({:+.3})", item.feature, item.contribution))
            .collect();
        let _ = writeln!(out, "  Top features: {}", rendered.join(", "));
    }
}

fn diagnostic_label(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::ModelMissing => "no model",
        DiagnosticKind::ModelUnreadable => "model unreadable",
        DiagnosticKind::ScoringFailed => "scoring failed",
        DiagnosticKind::AttributionFailed => "no attribution",
    }
}

/// Number of rows labelled eligible per scheme, in catalog order.
pub(crate) fn positive_counts(
    family: RecordFamily,
    outcomes: &[RuleOutcome],
) -> Vec<(&'static str, usize)> {
    family
        .catalog()
        .iter()
        .map(|scheme| {
            let positives = outcomes
                .iter()
                .filter(|outcome| outcome.labels.get(scheme) == Some(true))
                .count();
            (*scheme, positives)
        })
        .collect()
}
