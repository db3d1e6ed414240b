use tracing::{debug, warn};

use crate::domain::{AreaOfInterest, Descendant, Habitat, Rank, TargetRank, TaxonId};
use crate::engine::OccurrenceEngine;
use crate::error::FilterError;
use crate::source::{DescendantQuery, OccurrenceSource, TaxonomicStatus};

pub const DESCENDANT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub descendants: Vec<Descendant>,
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct RankExpander {
    target: TargetRank,
    habitat: Option<Habitat>,
    limit: usize,
}

impl RankExpander {
    pub fn new(target: TargetRank, habitat: Option<Habitat>) -> Self {
        Self {
            target,
            habitat,
            limit: DESCENDANT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn target(&self) -> TargetRank {
        self.target
    }

    pub fn applies_to(&self, rank: Option<&Rank>) -> bool {
        rank.is_some_and(|rank| rank.is_coarse() && !self.target.matches(rank))
    }

    pub fn expand<S: OccurrenceSource>(
        &self,
        source: &S,
        parent: &TaxonId,
    ) -> Result<Expansion, FilterError> {
        let rank = Rank::from(self.target);
        let query = DescendantQuery {
            parent,
            rank: &rank,
            habitat: self.habitat,
            limit: self.limit,
        };
        let records = source.lookup_descendants(&query)?;
        let truncated = records.len() >= self.limit;
        if truncated {
            warn!(
                "number of {} descendants of {parent} reached the limit of {} records, results may be incomplete",
                self.target, self.limit
            );
        }

        let descendants = records
            .into_iter()
            .filter(|record| record.status == TaxonomicStatus::Accepted)
            .filter_map(|record| {
                let name = record.canonical_name?;
                Some(Descendant {
                    name,
                    id: TaxonId::new(source.prefix(), record.key),
                })
            })
            .collect::<Vec<_>>();
        debug!(
            "{} accepted {} descendants for {parent}",
            descendants.len(),
            self.target
        );
        Ok(Expansion {
            descendants,
            truncated,
        })
    }
}

pub fn spatial_filter<S: OccurrenceSource>(
    engine: &OccurrenceEngine<S>,
    taxa: Vec<Descendant>,
    area: &AreaOfInterest,
) -> Result<Vec<Descendant>, FilterError> {
    let mut keep = Vec::with_capacity(taxa.len());
    for taxon in taxa {
        if engine.has_occurrences(&taxon.id, area)? {
            keep.push(taxon);
        }
    }
    Ok(keep)
}
