use clap::ValueEnum;
use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Pubchem,
    UnichemInchikey,
    UnichemChembl,
    UnichemKegg,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Pubchem,
        Stage::UnichemInchikey,
        Stage::UnichemChembl,
        Stage::UnichemKegg,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pubchem => "pubchem",
            Self::UnichemInchikey => "unichem-inchikey",
            Self::UnichemChembl => "unichem-chembl",
            Self::UnichemKegg => "unichem-kegg",
        }
    }

    pub fn source_key(self) -> SourceKey {
        match self {
            Self::Pubchem => SourceKey::NumericId,
            Self::UnichemInchikey => SourceKey::StructureKey,
            Self::UnichemChembl => SourceKey::LibraryId,
            Self::UnichemKegg => SourceKey::PathwayId,
        }
    }

    pub fn provenance_column(self) -> &'static str {
        match self {
            Self::Pubchem => "drugbankID_Source_pubchem",
            Self::UnichemInchikey => "drugbankID_Source_inchikeys(unichem)",
            Self::UnichemChembl => "drugbankID_Source_chembl(unichem)",
            Self::UnichemKegg => "drugbankID_Source_kegg(unichem)",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SourceKey {
    NumericId,
    StructureKey,
    LibraryId,
    PathwayId,
}

impl SourceKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NumericId => "numeric_id",
            Self::StructureKey => "structure_key",
            Self::LibraryId => "library_id",
            Self::PathwayId => "pathway_id",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub provenance_column: String,
    pub candidates: usize,
    pub resolved: usize,
    pub no_match: usize,
    pub failed: usize,
    pub invalid_key: usize,
    pub missing_after: usize,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            provenance_column: stage.provenance_column().to_string(),
            candidates: 0,
            resolved: 0,
            no_match: 0,
            failed: 0,
            invalid_key: 0,
            missing_after: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CorrectionReport {
    pub applied: usize,
    pub name_mismatch: usize,
    pub row_missing: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveReport {
    pub initial_missing: usize,
    pub stages: Vec<StageReport>,
    pub corrections: Option<CorrectionReport>,
    pub final_missing: usize,
}

#[cfg(test)]
impl ResolveReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FillPaths {
    pub input_path: String,
    pub output_path: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FillRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub input_sha256: String,
    pub paths: FillPaths,
    pub enabled_stages: Vec<Stage>,
    pub corrections_source: String,
    pub row_count: usize,
    pub initial_missing: usize,
    pub final_missing: usize,
    pub stages: Vec<StageReport>,
    pub corrections: Option<CorrectionReport>,
}
