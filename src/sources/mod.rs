use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use thiserror::Error;

use crate::drugbank::{DrugbankId, ReferenceExtractor};
use crate::model::Stage;

mod pubchem;
#[cfg(test)]
pub(crate) mod test_server;
mod unichem;

pub use pubchem::PubchemSource;
pub use unichem::{CHEMBL_SOURCE_ID, ConnectivitySource, InchikeySource, KEGG_SOURCE_ID};

const USER_AGENT: &str = concat!("drugid-fill/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid lookup key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("response parse error: {0}")]
    Parse(String),
}

pub trait LookupSource {
    fn stage(&self) -> Stage;

    fn lookup(&self, key: &str) -> Result<Option<DrugbankId>, LookupError>;
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub pubchem_base_url: String,
    pub unichem_base_url: String,
    pub timeout: Duration,
}

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

pub fn build_sources(config: &ServiceConfig, stages: &[Stage]) -> Result<Vec<Box<dyn LookupSource>>> {
    let client = build_http_client(config.timeout)?;
    let extractor = ReferenceExtractor::new()?;

    let mut sources: Vec<Box<dyn LookupSource>> = Vec::with_capacity(stages.len());
    for &stage in stages {
        let source: Box<dyn LookupSource> = match stage {
            Stage::Pubchem => Box::new(PubchemSource::new(
                client.clone(),
                &config.pubchem_base_url,
                extractor.clone(),
            )?),
            Stage::UnichemInchikey => Box::new(InchikeySource::new(
                client.clone(),
                &config.unichem_base_url,
                extractor.clone(),
            )?),
            Stage::UnichemChembl => Box::new(ConnectivitySource::new(
                client.clone(),
                &config.unichem_base_url,
                Stage::UnichemChembl,
                CHEMBL_SOURCE_ID,
                extractor.clone(),
            )?),
            Stage::UnichemKegg => Box::new(ConnectivitySource::new(
                client.clone(),
                &config.unichem_base_url,
                Stage::UnichemKegg,
                KEGG_SOURCE_ID,
                extractor.clone(),
            )?),
        };
        sources.push(source);
    }

    Ok(sources)
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid service base URL: {raw}"))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("service base URL cannot carry a path: {raw}");
    }
    Ok(url)
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, LookupError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| LookupError::Transport(format!("cannot extend base URL {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn read_json(response: Response) -> Result<Value, LookupError> {
    let body = response
        .text()
        .map_err(|err| LookupError::Transport(err.to_string()))?;
    serde_json::from_str(&body).map_err(|err| LookupError::Parse(err.to_string()))
}

fn transport(err: reqwest::Error) -> LookupError {
    LookupError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments_after_base_path() {
        let base = parse_base_url("https://www.ebi.ac.uk/").expect("base url");
        let url = endpoint(&base, &["unichem", "rest", "verbose_inchikey", "ABC-DEF"])
            .expect("endpoint");
        assert_eq!(
            url.as_str(),
            "https://www.ebi.ac.uk/unichem/rest/verbose_inchikey/ABC-DEF"
        );
    }

    #[test]
    fn endpoint_escapes_path_separators_inside_keys() {
        let base = parse_base_url("http://localhost:8080/mirror").expect("base url");
        let url = endpoint(&base, &["lookup", "a/b"]).expect("endpoint");
        assert_eq!(url.as_str(), "http://localhost:8080/mirror/lookup/a%2Fb");
    }

    #[test]
    fn parse_base_url_rejects_non_hierarchical_urls() {
        assert!(parse_base_url("mailto:someone@example.org").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn build_sources_follows_requested_stage_order() {
        let config = ServiceConfig {
            pubchem_base_url: "https://pubchem.ncbi.nlm.nih.gov".to_string(),
            unichem_base_url: "https://www.ebi.ac.uk".to_string(),
            timeout: Duration::from_secs(5),
        };
        let sources = build_sources(&config, &[Stage::UnichemKegg, Stage::Pubchem])
            .expect("sources build without network access");
        let stages = sources.iter().map(|source| source.stage()).collect::<Vec<_>>();
        assert_eq!(stages, vec![Stage::UnichemKegg, Stage::Pubchem]);
    }
}
