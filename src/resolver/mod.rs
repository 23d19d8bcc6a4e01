use anyhow::Result;
use tracing::{debug, info, warn};

use crate::corrections::{ManualCorrection, apply_corrections};
use crate::model::{ResolveReport, Stage, StageReport};
use crate::sources::{LookupError, LookupSource};
use crate::table::{ColumnNames, DrugTable, FLAG_TRUE};


pub enum Step {
    Lookup(Box<dyn LookupSource>),
    Corrections(Vec<ManualCorrection>),
}

pub struct Resolver {
    columns: ColumnNames,
    steps: Vec<Step>,
}

impl Resolver {
    pub fn new(columns: ColumnNames) -> Self {
        Self {
            columns,
            steps: Vec::new(),
        }
    }

    pub fn with_sources(
        columns: ColumnNames,
        sources: Vec<Box<dyn LookupSource>>,
        mut corrections: Option<Vec<ManualCorrection>>,
    ) -> Self {
        let mut resolver = Self::new(columns);

        let pubchem_enabled = sources.iter().any(|source| source.stage() == Stage::Pubchem);
        if !pubchem_enabled {
            if let Some(list) = corrections.take() {
                resolver.push(Step::Corrections(list));
            }
        }

        for source in sources {
            let is_pubchem = source.stage() == Stage::Pubchem;
            resolver.push(Step::Lookup(source));
            if is_pubchem {
                if let Some(list) = corrections.take() {
                    resolver.push(Step::Corrections(list));
                }
            }
        }

        resolver
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Lookup(source) => Some(source.stage()),
                Step::Corrections(_) => None,
            })
            .collect()
    }

    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.columns.target.as_str()];
        for step in &self.steps {
            let column = match step {
                Step::Lookup(source) => self.columns.source_key(source.stage().source_key()),
                Step::Corrections(_) => self.columns.name.as_str(),
            };
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    pub fn resolve(&self, table: &mut DrugTable) -> Result<ResolveReport> {
        for column in self.required_columns() {
            table.require_column(column)?;
        }
        let target_col = table.require_column(&self.columns.target)?;

        let mut report = ResolveReport {
            initial_missing: table.missing_count(target_col),
            ..ResolveReport::default()
        };
        info!(
            rows = table.len(),
            missing = report.initial_missing,
            "starting identifier resolution"
        );

        for step in &self.steps {
            match step {
                Step::Lookup(source) => {
                    let key_col = table
                        .require_column(self.columns.source_key(source.stage().source_key()))?;
                    let stage_report = run_stage(source.as_ref(), table, target_col, key_col);
                    info!(
                        stage = source.stage().as_str(),
                        resolved = stage_report.resolved,
                        no_match = stage_report.no_match,
                        failed = stage_report.failed,
                        invalid_key = stage_report.invalid_key,
                        missing = stage_report.missing_after,
                        "stage complete"
                    );
                    report.stages.push(stage_report);
                }
                Step::Corrections(corrections) => {
                    let name_col = table.require_column(&self.columns.name)?;
                    let corrections = apply_corrections(table, target_col, name_col, corrections);
                    info!(
                        applied = corrections.applied,
                        name_mismatch = corrections.name_mismatch,
                        row_missing = corrections.row_missing,
                        missing = table.missing_count(target_col),
                        "manual corrections complete"
                    );
                    report.corrections = Some(corrections);
                }
            }
        }

        report.final_missing = table.missing_count(target_col);
        info!(
            initial_missing = report.initial_missing,
            final_missing = report.final_missing,
            "identifier resolution complete"
        );

        Ok(report)
    }
}

fn run_stage(
    source: &dyn LookupSource,
    table: &mut DrugTable,
    target_col: usize,
    key_col: usize,
) -> StageReport {
    let stage = source.stage();
    let mut report = StageReport::new(stage);
    let flag_col = table.reset_column(stage.provenance_column());

    let candidates = table
        .missing_rows(target_col)
        .into_iter()
        .filter_map(|row| table.value(row, key_col).map(|key| (row, key.to_string())))
        .collect::<Vec<_>>();
    report.candidates = candidates.len();
    info!(
        stage = stage.as_str(),
        key = stage.source_key().as_str(),
        candidates = report.candidates,
        "starting stage"
    );

    for (row, key) in candidates {
        match source.lookup(&key) {
            Ok(Some(drugbank_id)) => {
                table.set(row, target_col, drugbank_id.as_str());
                table.set(row, flag_col, FLAG_TRUE);
                report.resolved += 1;
                debug!(stage = stage.as_str(), row, key = %key, drugbank_id = %drugbank_id, "resolved");
            }
            Ok(None) => {
                report.no_match += 1;
                debug!(stage = stage.as_str(), row, key = %key, "no DrugBank reference");
            }
            Err(err @ LookupError::InvalidKey { .. }) => {
                report.invalid_key += 1;
                info!(stage = stage.as_str(), row, error = %err, "skipping row with unusable key");
            }
            Err(err) => {
                report.failed += 1;
                warn!(stage = stage.as_str(), row, key = %key, error = %err, "lookup failed");
            }
        }
    }

    report.missing_after = table.missing_count(target_col);
    report
}
