#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use gbif_filter::domain::{AreaOfInterest, Habitat, Rank, TaxonId};
use gbif_filter::error::FilterError;
use gbif_filter::gbif::is_gbif_key;
use gbif_filter::source::{
    BackboneMatch, BackboneQuery, DescendantQuery, DescendantRecord, MatchType, OccurrenceRecord,
    OccurrenceSource, TaxonomicStatus,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescendantCall {
    pub parent: String,
    pub rank: Rank,
    pub habitat: Option<Habitat>,
    pub limit: usize,
}

#[derive(Debug, Default)]
pub struct Calls {
    pub backbone: Vec<String>,
    pub presence: Vec<String>,
    pub descendants: Vec<DescendantCall>,
    pub occurrence_limits: Vec<usize>,
    pub areas: Vec<AreaOfInterest>,
}

/// In-memory provider that records every call it receives.
#[derive(Default)]
pub struct StubSource {
    matches: HashMap<String, BackboneMatch>,
    present: HashMap<String, bool>,
    descendants: HashMap<String, Vec<DescendantRecord>>,
    occurrences: Vec<OccurrenceRecord>,
    unavailable: bool,
    pub calls: Mutex<Calls>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exact(mut self, name: &str, key: &str, rank: &str) -> Self {
        self.matches.insert(
            name.to_string(),
            BackboneMatch {
                match_type: MatchType::Exact,
                usage_key: Some(key.to_string()),
                accepted_usage_key: None,
                synonym: false,
                rank: Some(rank.parse().unwrap()),
            },
        );
        self
    }

    pub fn with_synonym(mut self, name: &str, key: &str, accepted: &str, rank: &str) -> Self {
        self.matches.insert(
            name.to_string(),
            BackboneMatch {
                match_type: MatchType::Exact,
                usage_key: Some(key.to_string()),
                accepted_usage_key: Some(accepted.to_string()),
                synonym: true,
                rank: Some(rank.parse().unwrap()),
            },
        );
        self
    }

    pub fn with_fuzzy(mut self, name: &str, key: &str) -> Self {
        self.matches.insert(
            name.to_string(),
            BackboneMatch {
                match_type: MatchType::Fuzzy,
                usage_key: Some(key.to_string()),
                accepted_usage_key: None,
                synonym: false,
                rank: Some("SPECIES".parse().unwrap()),
            },
        );
        self
    }

    pub fn with_presence(mut self, taxon: &str, present: bool) -> Self {
        self.present.insert(taxon.to_string(), present);
        self
    }

    pub fn with_children(mut self, parent: &str, children: &[(&str, &str, &str)]) -> Self {
        let records = children
            .iter()
            .map(|(key, name, status)| DescendantRecord {
                key: key.to_string(),
                canonical_name: Some(name.to_string()),
                status: TaxonomicStatus::from_provider(status),
            })
            .collect();
        self.descendants.insert(parent.to_string(), records);
        self
    }

    pub fn with_occurrences(mut self, records: &[(&str, &str)]) -> Self {
        self.occurrences = records
            .iter()
            .map(|(key, rank)| OccurrenceRecord {
                taxon_key: Some(key.to_string()),
                taxon_rank: Some(rank.parse().unwrap()),
            })
            .collect();
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn backbone_calls(&self) -> usize {
        self.calls.lock().unwrap().backbone.len()
    }

    pub fn presence_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().presence.clone()
    }

    pub fn descendant_calls(&self) -> usize {
        self.calls.lock().unwrap().descendants.len()
    }

    pub fn descendant_queries(&self) -> Vec<DescendantCall> {
        self.calls.lock().unwrap().descendants.clone()
    }
}

impl OccurrenceSource for StubSource {
    fn prefix(&self) -> &str {
        "GBIF:"
    }

    fn accepts_id(&self, id: &str) -> bool {
        is_gbif_key(id)
    }

    fn match_backbone(&self, query: &BackboneQuery<'_>) -> Result<BackboneMatch, FilterError> {
        self.calls
            .lock()
            .unwrap()
            .backbone
            .push(query.name.to_string());
        Ok(self
            .matches
            .get(query.name)
            .cloned()
            .unwrap_or(BackboneMatch {
                match_type: MatchType::None,
                usage_key: None,
                accepted_usage_key: None,
                synonym: false,
                rank: None,
            }))
    }

    fn lookup_descendants(
        &self,
        query: &DescendantQuery<'_>,
    ) -> Result<Vec<DescendantRecord>, FilterError> {
        self.calls.lock().unwrap().descendants.push(DescendantCall {
            parent: query.parent.to_string(),
            rank: query.rank.clone(),
            habitat: query.habitat,
            limit: query.limit,
        });
        let mut records = self
            .descendants
            .get(&query.parent.to_string())
            .cloned()
            .unwrap_or_default();
        records.truncate(query.limit);
        Ok(records)
    }

    fn search_occurrences(
        &self,
        taxon: &TaxonId,
        area: &AreaOfInterest,
        limit: usize,
    ) -> Result<Vec<OccurrenceRecord>, FilterError> {
        if self.unavailable {
            return Err(FilterError::ProviderUnavailable("stub is down".to_string()));
        }
        let mut calls = self.calls.lock().unwrap();
        calls.presence.push(taxon.to_string());
        calls.occurrence_limits.push(limit);
        calls.areas.push(area.clone());
        if self.present.get(&taxon.to_string()).copied().unwrap_or(false) {
            Ok(vec![OccurrenceRecord {
                taxon_key: Some(taxon.id().to_string()),
                taxon_rank: None,
            }])
        } else {
            Ok(Vec::new())
        }
    }

    fn all_occurrences(
        &self,
        _taxon: &TaxonId,
        area: Option<&AreaOfInterest>,
    ) -> Result<Vec<OccurrenceRecord>, FilterError> {
        if let Some(area) = area {
            self.calls.lock().unwrap().areas.push(area.clone());
        }
        Ok(self.occurrences.clone())
    }
}

pub fn rank(value: &str) -> Rank {
    value.parse().unwrap()
}
