use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{LookupError, LookupSource, endpoint, parse_base_url, read_json, transport};
use crate::drugbank::{DrugbankId, FieldFilter, ReferenceExtractor};
use crate::model::Stage;

pub const CHEMBL_SOURCE_ID: u32 = 1;
pub const KEGG_SOURCE_ID: u32 = 6;

pub struct InchikeySource {
    client: Client,
    base: Url,
    extractor: ReferenceExtractor,
}

impl InchikeySource {
    pub fn new(client: Client, base_url: &str, extractor: ReferenceExtractor) -> Result<Self> {
        Ok(Self {
            client,
            base: parse_base_url(base_url)?,
            extractor,
        })
    }
}

impl LookupSource for InchikeySource {
    fn stage(&self) -> Stage {
        Stage::UnichemInchikey
    }

    fn lookup(&self, key: &str) -> Result<Option<DrugbankId>, LookupError> {
        let inchikey = key.trim();
        let url = endpoint(
            &self.base,
            &["unichem", "rest", "verbose_inchikey", inchikey],
        )?;

        debug!(inchikey, url = %url, "querying UniChem verbose InChIKey");
        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let document = read_json(response)?;
        Ok(extract_from_source_list(&self.extractor, &document))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectivityRequest<'a> {
    compound: &'a str,
    search_components: bool,
    #[serde(rename = "sourceID")]
    source_id: String,
    #[serde(rename = "type")]
    lookup_type: &'static str,
}

pub struct ConnectivitySource {
    client: Client,
    url: Url,
    stage: Stage,
    source_db: u32,
    extractor: ReferenceExtractor,
}

impl ConnectivitySource {
    pub fn new(
        client: Client,
        base_url: &str,
        stage: Stage,
        source_db: u32,
        extractor: ReferenceExtractor,
    ) -> Result<Self> {
        let base = parse_base_url(base_url)?;
        let url = endpoint(&base, &["unichem", "api", "v1", "connectivity"])?;
        Ok(Self {
            client,
            url,
            stage,
            source_db,
            extractor,
        })
    }
}

impl LookupSource for ConnectivitySource {
    fn stage(&self) -> Stage {
        self.stage
    }

    fn lookup(&self, key: &str) -> Result<Option<DrugbankId>, LookupError> {
        let payload = connectivity_request(key.trim(), self.source_db);

        debug!(
            compound = payload.compound,
            source_db = self.source_db,
            url = %self.url,
            "querying UniChem connectivity"
        );
        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(LookupError::Status(status.as_u16()));
        }

        let document = read_json(response)?;
        Ok(extract_from_connectivity(&self.extractor, &document))
    }
}

fn connectivity_request(compound: &str, source_db: u32) -> ConnectivityRequest<'_> {
    ConnectivityRequest {
        compound,
        search_components: false,
        source_id: source_db.to_string(),
        lookup_type: "sourceID",
    }
}

pub(crate) fn extract_from_source_list(
    extractor: &ReferenceExtractor,
    document: &Value,
) -> Option<DrugbankId> {
    extractor.find_in_json(document, FieldFilter::Named("src_url"))
}

pub(crate) fn extract_from_connectivity(
    extractor: &ReferenceExtractor,
    document: &Value,
) -> Option<DrugbankId> {
    extractor.find_in_json(document, FieldFilter::Named("url"))
}
