use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::{AreaOfInterest, TaxonId};
use crate::error::FilterError;
use crate::source::{
    BackboneMatch, BackboneQuery, DescendantQuery, DescendantRecord, MatchType, OccurrenceRecord,
    OccurrenceSource, TaxonomicStatus,
};

pub const GBIF_PREFIX: &str = "GBIF:";
pub const BACKBONE_DATASET_KEY: &str = "d7dddbf4-2cf0-4f39-9b2a-bb099caae36c";
const OCCURRENCE_PAGE_SIZE: usize = 300;

pub fn is_gbif_key(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit())
}

fn descendant_params(key: &str, query: &DescendantQuery<'_>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("higherTaxonKey", key.to_string()),
        ("datasetKey", BACKBONE_DATASET_KEY.to_string()),
        ("rank", query.rank.to_string()),
        ("limit", query.limit.to_string()),
    ];
    if let Some(habitat) = query.habitat {
        params.push(("habitat", habitat.as_str().to_string()));
    }
    params
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchResponse {
    #[serde(default)]
    match_type: Option<String>,
    #[serde(default)]
    usage_key: Option<u64>,
    #[serde(default)]
    accepted_usage_key: Option<u64>,
    #[serde(default)]
    synonym: bool,
    #[serde(default)]
    rank: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse<T> {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    end_of_records: Option<bool>,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NameUsage {
    key: u64,
    #[serde(default)]
    canonical_name: Option<String>,
    #[serde(default)]
    taxonomic_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Occurrence {
    #[serde(default)]
    taxon_key: Option<u64>,
    #[serde(default)]
    taxon_rank: Option<String>,
}

#[derive(Clone)]
pub struct GbifHttpClient {
    client: Client,
    base_url: String,
}

impl GbifHttpClient {
    pub fn new(base_url: &str) -> Result<Self, FilterError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gbif-filter/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FilterError::ProviderUnavailable(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| FilterError::ProviderUnavailable(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn gbif_key<'a>(&self, taxon: &'a TaxonId) -> Result<&'a str, FilterError> {
        if taxon.prefix() != GBIF_PREFIX || !is_gbif_key(taxon.id()) {
            return Err(FilterError::InvalidTaxonId(taxon.to_string()));
        }
        Ok(taxon.id())
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FilterError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.send_with_retries(|| self.client.get(&url).query(params))?;
        let response = Self::handle_status(response)?;
        response
            .json()
            .map_err(|err| FilterError::ProviderResponse(err.to_string()))
    }

    fn occurrence_page(
        &self,
        key: &str,
        area: Option<&AreaOfInterest>,
        limit: usize,
        offset: usize,
    ) -> Result<SearchResponse<Occurrence>, FilterError> {
        let mut params = vec![
            ("taxonKey", key.to_string()),
            ("limit", limit.to_string()),
        ];
        if offset > 0 {
            params.push(("offset", offset.to_string()));
        }
        match area {
            Some(AreaOfInterest::Country(code)) => params.push(("country", code.clone())),
            Some(AreaOfInterest::Geometry(wkt)) => params.push(("geometry", wkt.clone())),
            None => {}
        }
        self.get_json("occurrence/search", &params)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, FilterError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "GBIF request failed".to_string());
        Err(FilterError::ProviderStatus { status, message })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, FilterError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if is_retryable_status(status) {
                        if attempt < MAX_RETRIES {
                            let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                            thread::sleep(Duration::from_millis(delay));
                            attempt += 1;
                            continue;
                        }
                        return Err(FilterError::ProviderUnavailable(format!(
                            "GBIF answered {status} after {MAX_RETRIES} retries"
                        )));
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(FilterError::ProviderUnavailable(err.to_string()));
                }
            }
        }
    }
}

impl OccurrenceSource for GbifHttpClient {
    fn prefix(&self) -> &str {
        GBIF_PREFIX
    }

    fn accepts_id(&self, id: &str) -> bool {
        is_gbif_key(id)
    }

    fn match_backbone(&self, query: &BackboneQuery<'_>) -> Result<BackboneMatch, FilterError> {
        let mut params = vec![
            ("name", query.name.to_string()),
            ("strict", "true".to_string()),
            ("verbose", "false".to_string()),
        ];
        if let Some(rank) = query.rank {
            params.push(("rank", rank.to_string()));
        }
        if let Some(kingdom) = query.kingdom {
            params.push(("kingdom", kingdom.to_string()));
        }
        let response: MatchResponse = self.get_json("species/match", &params)?;
        debug!(?response, "backbone match");
        Ok(backbone_match_from(response))
    }

    fn lookup_descendants(
        &self,
        query: &DescendantQuery<'_>,
    ) -> Result<Vec<DescendantRecord>, FilterError> {
        let params = descendant_params(self.gbif_key(query.parent)?, query);
        let response: SearchResponse<NameUsage> = self.get_json("species/search", &params)?;
        Ok(response
            .results
            .into_iter()
            .map(|usage| DescendantRecord {
                key: usage.key.to_string(),
                canonical_name: usage.canonical_name,
                status: TaxonomicStatus::from_provider(
                    usage.taxonomic_status.as_deref().unwrap_or_default(),
                ),
            })
            .collect())
    }

    fn search_occurrences(
        &self,
        taxon: &TaxonId,
        area: &AreaOfInterest,
        limit: usize,
    ) -> Result<Vec<OccurrenceRecord>, FilterError> {
        let key = self.gbif_key(taxon)?;
        let page = self.occurrence_page(key, Some(area), limit, 0)?;
        debug!("asked for {limit} occurrence(s), got {}", page.results.len());
        Ok(page.results.into_iter().map(occurrence_record_from).collect())
    }

    fn all_occurrences(
        &self,
        taxon: &TaxonId,
        area: Option<&AreaOfInterest>,
    ) -> Result<Vec<OccurrenceRecord>, FilterError> {
        let key = self.gbif_key(taxon)?;
        let mut records = Vec::new();
        loop {
            let page = self.occurrence_page(key, area, OCCURRENCE_PAGE_SIZE, records.len())?;
            let fetched = page.results.len();
            records.extend(page.results.into_iter().map(occurrence_record_from));
            let total = page.count.unwrap_or(0) as usize;
            debug!("{}/{} occurrences of {taxon}", records.len(), total);
            if fetched == 0 || page.end_of_records.unwrap_or(false) || records.len() >= total {
                break;
            }
        }
        Ok(records)
    }
}

fn backbone_match_from(response: MatchResponse) -> BackboneMatch {
    BackboneMatch {
        match_type: MatchType::from_provider(response.match_type.as_deref().unwrap_or("NONE")),
        usage_key: response.usage_key.map(|key| key.to_string()),
        accepted_usage_key: response.accepted_usage_key.map(|key| key.to_string()),
        synonym: response.synonym,
        rank: response.rank.and_then(|rank| rank.parse().ok()),
    }
}

fn occurrence_record_from(occurrence: Occurrence) -> OccurrenceRecord {
    OccurrenceRecord {
        taxon_key: occurrence.taxon_key.map(|key| key.to_string()),
        taxon_rank: occurrence.taxon_rank.and_then(|rank| rank.parse().ok()),
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
