use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::drugbank::DrugbankId;
use crate::model::CorrectionReport;
use crate::table::DrugTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualCorrection {
    pub row: usize,
    pub expected_name: String,
    pub drugbank_id: String,
}

impl ManualCorrection {
    fn new(row: usize, expected_name: &str, drugbank_id: &str) -> Self {
        Self {
            row,
            expected_name: expected_name.to_string(),
            drugbank_id: drugbank_id.to_string(),
        }
    }
}

// Rows whose upstream ids were ambiguous (e.g. "DB03106; DB13178") and were
// settled by hand.
pub fn default_corrections() -> Vec<ManualCorrection> {
    vec![
        ManualCorrection::new(5695, "myo-inositol", "DB13178"),
        ManualCorrection::new(5850, "32462-30-9", "DB04291"),
        ManualCorrection::new(6465, "1y6a", "DB07334"),
    ]
}

pub fn load_corrections(path: &Path) -> Result<Vec<ManualCorrection>> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let corrections: Vec<ManualCorrection> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    for correction in &corrections {
        if DrugbankId::parse(&correction.drugbank_id).is_none() {
            bail!(
                "correction for row {} has malformed DrugBank id {:?} in {}",
                correction.row,
                correction.drugbank_id,
                path.display()
            );
        }
    }

    Ok(corrections)
}

pub fn apply_corrections(
    table: &mut DrugTable,
    target_col: usize,
    name_col: usize,
    corrections: &[ManualCorrection],
) -> CorrectionReport {
    let mut report = CorrectionReport::default();

    for correction in corrections {
        if correction.row >= table.len() {
            warn!(
                row = correction.row,
                rows = table.len(),
                "correction row is outside the table; skipped"
            );
            report.row_missing += 1;
            continue;
        }

        let name = table.raw(correction.row, name_col).unwrap_or_default();
        if name != correction.expected_name {
            warn!(
                row = correction.row,
                expected = %correction.expected_name,
                found = %name,
                "correction name guard did not match; skipped"
            );
            report.name_mismatch += 1;
            continue;
        }

        let previous = table
            .raw(correction.row, target_col)
            .unwrap_or_default()
            .to_string();
        table.set(correction.row, target_col, &correction.drugbank_id);
        info!(
            row = correction.row,
            name = %correction.expected_name,
            previous = %previous,
            drugbank_id = %correction.drugbank_id,
            "applied manual correction"
        );
        report.applied += 1;
    }

    report
}
