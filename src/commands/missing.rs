use anyhow::Result;
use tracing::{info, warn};

use crate::cli::MissingArgs;
use crate::model::Stage;
use crate::table::{ColumnNames, DrugTable};

#[derive(Debug, Clone, PartialEq, Eq)]
struct StageCoverage {
    stage: Stage,
    column: String,
    present: bool,
    with_key: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MissingSummary {
    rows: usize,
    missing: usize,
    without_any_key: usize,
    coverage: Vec<StageCoverage>,
}

pub fn run(args: MissingArgs) -> Result<()> {
    let table = DrugTable::read_csv(&args.input)?;
    let summary = summarize(&table, &args.columns.column_names())?;

    info!(
        input = %args.input.display(),
        rows = summary.rows,
        missing = summary.missing,
        without_any_key = summary.without_any_key,
        "missing identifier summary"
    );
    for coverage in &summary.coverage {
        if coverage.present {
            info!(
                stage = coverage.stage.as_str(),
                column = %coverage.column,
                lookups = coverage.with_key,
                "stage would attempt"
            );
        } else {
            warn!(
                stage = coverage.stage.as_str(),
                column = %coverage.column,
                "source key column missing; stage cannot run"
            );
        }
    }

    Ok(())
}

fn summarize(table: &DrugTable, columns: &ColumnNames) -> Result<MissingSummary> {
    let target_col = table.require_column(&columns.target)?;
    let missing_rows = table.missing_rows(target_col);

    let key_cols = Stage::ALL
        .iter()
        .map(|stage| table.column(columns.source_key(stage.source_key())))
        .collect::<Vec<_>>();

    let coverage = Stage::ALL
        .iter()
        .zip(&key_cols)
        .map(|(&stage, key_col)| StageCoverage {
            stage,
            column: columns.source_key(stage.source_key()).to_string(),
            present: key_col.is_some(),
            with_key: key_col
                .map(|col| {
                    missing_rows
                        .iter()
                        .filter(|&&row| table.value(row, col).is_some())
                        .count()
                })
                .unwrap_or(0),
        })
        .collect();

    let without_any_key = missing_rows
        .iter()
        .filter(|&&row| {
            key_cols
                .iter()
                .flatten()
                .all(|&col| table.value(row, col).is_none())
        })
        .count();

    Ok(MissingSummary {
        rows: table.len(),
        missing: missing_rows.len(),
        without_any_key,
        coverage,
    })
}
