use crate::domain::{AreaOfInterest, Habitat, Rank, TaxonId};
use crate::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    Fuzzy,
    HigherRank,
    None,
    Other,
}

impl MatchType {
    pub fn from_provider(value: &str) -> Self {
        match value {
            "EXACT" => MatchType::Exact,
            "FUZZY" => MatchType::Fuzzy,
            "HIGHERRANK" => MatchType::HigherRank,
            "NONE" => MatchType::None,
            _ => MatchType::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackboneQuery<'a> {
    pub name: &'a str,
    pub rank: Option<&'a Rank>,
    pub kingdom: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct BackboneMatch {
    pub match_type: MatchType,
    pub usage_key: Option<String>,
    pub accepted_usage_key: Option<String>,
    pub synonym: bool,
    pub rank: Option<Rank>,
}

#[derive(Debug, Clone)]
pub struct DescendantQuery<'a> {
    pub parent: &'a TaxonId,
    pub rank: &'a Rank,
    pub habitat: Option<Habitat>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomicStatus {
    Accepted,
    Other(String),
}

impl TaxonomicStatus {
    pub fn from_provider(value: &str) -> Self {
        if value == "ACCEPTED" {
            TaxonomicStatus::Accepted
        } else {
            TaxonomicStatus::Other(value.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct DescendantRecord {
    pub key: String,
    pub canonical_name: Option<String>,
    pub status: TaxonomicStatus,
}

#[derive(Debug, Clone)]
pub struct OccurrenceRecord {
    pub taxon_key: Option<String>,
    pub taxon_rank: Option<Rank>,
}

/// Remote taxonomy and occurrence provider.
///
/// Implementations talk to exactly one backend and report transport failures
/// as errors; an unreachable provider must never be read as "no occurrence".
pub trait OccurrenceSource: Send + Sync {
    fn prefix(&self) -> &str;

    /// Local shape check of a bare identifier, without any remote call.
    fn accepts_id(&self, _id: &str) -> bool {
        true
    }

    fn match_backbone(&self, query: &BackboneQuery<'_>) -> Result<BackboneMatch, FilterError>;

    fn lookup_descendants(
        &self,
        query: &DescendantQuery<'_>,
    ) -> Result<Vec<DescendantRecord>, FilterError>;

    fn search_occurrences(
        &self,
        taxon: &TaxonId,
        area: &AreaOfInterest,
        limit: usize,
    ) -> Result<Vec<OccurrenceRecord>, FilterError>;

    fn all_occurrences(
        &self,
        taxon: &TaxonId,
        area: Option<&AreaOfInterest>,
    ) -> Result<Vec<OccurrenceRecord>, FilterError>;
}
