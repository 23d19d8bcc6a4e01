use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::cli::FillArgs;
use crate::corrections::{ManualCorrection, default_corrections, load_corrections};
use crate::model::{FillPaths, FillRunManifest, Stage};
use crate::resolver::Resolver;
use crate::sources::{ServiceConfig, build_sources};
use crate::table::DrugTable;
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty};

pub fn run(args: FillArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("fill-{}", utc_compact_string(started_ts));

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        sibling_path(
            &output_path,
            &format!("fill_run_{}.json", utc_compact_string(started_ts)),
        )
    });

    let stages = enabled_stages(&args.stages);
    let (corrections, corrections_source) = correction_list(&args)?;

    info!(
        input = %args.input.display(),
        output = %output_path.display(),
        run_id = %run_id,
        stages = ?stages.iter().map(|stage| stage.as_str()).collect::<Vec<_>>(),
        corrections = %corrections_source,
        "starting fill"
    );

    let input_sha256 = sha256_file(&args.input)?;
    let mut table = DrugTable::read_csv(&args.input)?;
    info!(rows = table.len(), columns = table.headers().len(), "loaded input table");

    let config = ServiceConfig {
        pubchem_base_url: args.services.pubchem_url.clone(),
        unichem_base_url: args.services.unichem_url.clone(),
        timeout: Duration::from_secs(args.services.timeout_secs),
    };
    let sources = build_sources(&config, &stages)?;
    let resolver = Resolver::with_sources(args.columns.column_names(), sources, corrections);

    let report = resolver.resolve(&mut table)?;

    if args.dry_run {
        info!(
            initial_missing = report.initial_missing,
            final_missing = report.final_missing,
            "fill dry-run complete; no files written"
        );
        return Ok(());
    }

    table.write_csv(&output_path)?;
    info!(path = %output_path.display(), rows = table.len(), "wrote filled table");

    let manifest = FillRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        finished_at: now_utc_string(),
        input_sha256,
        paths: FillPaths {
            input_path: args.input.display().to_string(),
            output_path: output_path.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
        },
        enabled_stages: resolver.stages(),
        corrections_source,
        row_count: table.len(),
        initial_missing: report.initial_missing,
        final_missing: report.final_missing,
        stages: report.stages,
        corrections: report.corrections,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote fill run manifest");

    Ok(())
}

fn enabled_stages(requested: &[Stage]) -> Vec<Stage> {
    if requested.is_empty() {
        return Stage::ALL.to_vec();
    }
    Stage::ALL
        .into_iter()
        .filter(|stage| requested.contains(stage))
        .collect()
}

fn correction_list(args: &FillArgs) -> Result<(Option<Vec<ManualCorrection>>, String)> {
    if args.no_corrections {
        return Ok((None, "disabled".to_string()));
    }
    match &args.corrections {
        Some(path) => Ok((Some(load_corrections(path)?), path.display().to_string())),
        None => Ok((Some(default_corrections()), "builtin".to_string())),
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("drugs");
    sibling_path(input, &format!("{stem}_fill_na.csv"))
}

fn sibling_path(path: &Path, file_name: &str) -> PathBuf {
    match path.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}
