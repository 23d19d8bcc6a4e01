use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::Stage;

#[derive(Parser, Debug)]
#[command(
    name = "drugid",
    version,
    about = "Fill missing DrugBank identifiers in a drug table from public cross-reference services"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Fill(FillArgs),
    Missing(MissingArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FillArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long = "stage", value_enum)]
    pub stages: Vec<Stage>,

    #[arg(long, conflicts_with = "no_corrections")]
    pub corrections: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_corrections: bool,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[command(flatten)]
    pub columns: ColumnArgs,

    #[command(flatten)]
    pub services: ServiceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct MissingArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub columns: ColumnArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ColumnArgs {
    #[arg(long, default_value = "drugbank_id")]
    pub target_column: String,

    #[arg(long, default_value = "cid")]
    pub cid_column: String,

    #[arg(long, default_value = "inchikey")]
    pub inchikey_column: String,

    #[arg(long, default_value = "chembl_id")]
    pub chembl_column: String,

    #[arg(long, default_value = "kegg_id")]
    pub kegg_column: String,

    #[arg(long, default_value = "dname")]
    pub name_column: String,
}

#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    #[arg(
        long,
        env = "DRUGID_PUBCHEM_URL",
        default_value = "https://pubchem.ncbi.nlm.nih.gov"
    )]
    pub pubchem_url: String,

    #[arg(long, env = "DRUGID_UNICHEM_URL", default_value = "https://www.ebi.ac.uk")]
    pub unichem_url: String,

    #[arg(
        long,
        env = "DRUGID_HTTP_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,
}

impl ColumnArgs {
    pub fn column_names(&self) -> crate::table::ColumnNames {
        crate::table::ColumnNames {
            target: self.target_column.clone(),
            numeric_id: self.cid_column.clone(),
            structure_key: self.inchikey_column.clone(),
            library_id: self.chembl_column.clone(),
            pathway_id: self.kegg_column.clone(),
            name: self.name_column.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rejects_zero_timeout() {
        let result =
            Cli::try_parse_from(["drugid", "fill", "--input", "drugs.csv", "--timeout-secs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn fill_accepts_positive_timeout() {
        let cli =
            Cli::try_parse_from(["drugid", "fill", "--input", "drugs.csv", "--timeout-secs", "5"])
                .expect("valid arguments");
        match cli.command {
            Commands::Fill(args) => assert_eq!(args.services.timeout_secs, 5),
            Commands::Missing(_) => panic!("expected fill command"),
        }
    }
}
