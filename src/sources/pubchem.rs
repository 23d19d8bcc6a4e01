use anyhow::Result;
use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use super::{LookupError, LookupSource, endpoint, parse_base_url, read_json, transport};
use crate::drugbank::{DrugbankId, FieldFilter, ReferenceExtractor};
use crate::model::Stage;

pub struct PubchemSource {
    client: Client,
    base: Url,
    extractor: ReferenceExtractor,
}

impl PubchemSource {
    pub fn new(client: Client, base_url: &str, extractor: ReferenceExtractor) -> Result<Self> {
        Ok(Self {
            client,
            base: parse_base_url(base_url)?,
            extractor,
        })
    }
}

impl LookupSource for PubchemSource {
    fn stage(&self) -> Stage {
        Stage::Pubchem
    }

    fn lookup(&self, key: &str) -> Result<Option<DrugbankId>, LookupError> {
        let cid = coerce_compound_id(key)?;
        let cid_segment = cid.to_string();
        let url = endpoint(
            &self.base,
            &["rest", "pug_view", "data", "compound", &cid_segment, "JSON"],
        )?;

        debug!(cid, url = %url, "querying PubChem PUG View");
        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let document = read_json(response)?;
        Ok(extract_from_pug_view(&self.extractor, &document))
    }
}

pub(crate) fn coerce_compound_id(raw: &str) -> Result<u64, LookupError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| LookupError::InvalidKey {
        key: raw.to_string(),
        reason: reason.to_string(),
    };

    if let Ok(value) = trimmed.parse::<u64>() {
        return if value > 0 {
            Ok(value)
        } else {
            Err(invalid("compound id must be positive"))
        };
    }

    let value = trimmed
        .parse::<f64>()
        .map_err(|_| invalid("not a number"))?;
    if !value.is_finite() {
        return Err(invalid("compound id is not finite"));
    }
    if value < 1.0 {
        return Err(invalid("compound id must be positive"));
    }

    Ok(value.trunc() as u64)
}

pub(crate) fn extract_from_pug_view(
    extractor: &ReferenceExtractor,
    document: &Value,
) -> Option<DrugbankId> {
    extractor.find_in_json(document, FieldFilter::Any)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::sources::build_http_client;
    use crate::sources::test_server::{CannedResponse, TestServer};

    fn source_for(server: &TestServer) -> PubchemSource {
        let client = build_http_client(Duration::from_secs(5)).expect("client");
        let extractor = ReferenceExtractor::new().expect("extractor");
        PubchemSource::new(client, server.base_url(), extractor).expect("source")
    }

    #[test]
    fn lookup_requests_pug_view_for_coerced_compound_id() {
        let server = TestServer::serve(1, |_| {
            CannedResponse::json(
                200,
                json!({
                    "Record": {
                        "Reference": [
                            { "SourceName": "DrugBank", "URL": "https://go.drugbank.com/drugs/DB00945" }
                        ]
                    }
                }),
            )
        });

        let found = source_for(&server).lookup(" 2244.0 ").expect("lookup succeeds");
        assert_eq!(found.map(|id| id.to_string()), Some("DB00945".to_string()));

        let requests = server.finish();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/rest/pug_view/data/compound/2244/JSON");
    }

    #[test]
    fn lookup_reports_error_status() {
        let server = TestServer::serve(1, |_| {
            CannedResponse::json(404, json!({ "Fault": { "Code": "PUGVIEW.NotFound" } }))
        });

        let err = source_for(&server).lookup("999999999").expect_err("404 is an error");
        assert!(matches!(err, LookupError::Status(404)), "{err}");
        server.finish();
    }

    #[test]
    fn lookup_reports_html_body_as_parse_error() {
        let server = TestServer::serve(1, |_| {
            CannedResponse::text(200, "text/html", "<html><body>Service busy</body></html>")
        });

        let err = source_for(&server).lookup("2244").expect_err("html is not JSON");
        assert!(matches!(err, LookupError::Parse(_)), "{err}");
        server.finish();
    }

    #[test]
    fn lookup_rejects_unusable_key_without_request() {
        let server = TestServer::serve(0, |_| CannedResponse::json(200, json!({})));
        let err = source_for(&server).lookup("n/a-value").expect_err("invalid key");
        assert!(matches!(err, LookupError::InvalidKey { .. }), "{err}");
        assert!(server.finish().is_empty());
    }

    #[test]
    fn coerce_compound_id_accepts_integer_and_float_forms() {
        assert_eq!(coerce_compound_id("2244").expect("integer"), 2244);
        assert_eq!(coerce_compound_id(" 2244.0 ").expect("float"), 2244);
        assert_eq!(coerce_compound_id("5793.7").expect("truncated"), 5793);
        assert_eq!(coerce_compound_id("1e3").expect("exponent"), 1000);
    }

    #[test]
    fn coerce_compound_id_rejects_unusable_values() {
        for raw in ["abc", "", "0", "-12", "0.4", "inf", "NaN", "12;13"] {
            let err = coerce_compound_id(raw).expect_err(raw);
            assert!(matches!(err, LookupError::InvalidKey { .. }), "{raw}: {err}");
        }
    }

    #[test]
    fn extract_from_pug_view_finds_drugbank_reference_link() {
        let extractor = ReferenceExtractor::new().expect("extractor");
        let document = json!({
            "Record": {
                "RecordType": "CID",
                "RecordNumber": 2244,
                "RecordTitle": "Aspirin",
                "Reference": [
                    {
                        "ReferenceNumber": 1,
                        "SourceName": "CAS Common Chemistry",
                        "URL": "https://commonchemistry.cas.org/detail?cas_rn=50-78-2"
                    },
                    {
                        "ReferenceNumber": 7,
                        "SourceName": "DrugBank",
                        "SourceID": "DB00945",
                        "URL": "https://www.drugbank.ca/drugs/DB00945"
                    }
                ]
            }
        });

        assert_eq!(
            extract_from_pug_view(&extractor, &document).map(|id| id.to_string()),
            Some("DB00945".to_string())
        );
    }

    #[test]
    fn extract_from_pug_view_returns_none_without_drugbank_link() {
        let extractor = ReferenceExtractor::new().expect("extractor");
        let document = json!({
            "Record": { "RecordNumber": 1, "Reference": [ { "SourceID": "DB00945" } ] }
        });
        assert!(extract_from_pug_view(&extractor, &document).is_none());
    }
}
