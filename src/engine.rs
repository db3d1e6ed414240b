use tracing::debug;

use crate::domain::{AreaOfInterest, Rank, TaxonId};
use crate::error::FilterError;
use crate::source::{OccurrenceRecord, OccurrenceSource};

pub struct OccurrenceEngine<S: OccurrenceSource> {
    source: S,
}

impl<S: OccurrenceSource> OccurrenceEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn has_occurrences(
        &self,
        taxon: &TaxonId,
        area: &AreaOfInterest,
    ) -> Result<bool, FilterError> {
        let records = self.source.search_occurrences(taxon, area, 1)?;
        Ok(!records.is_empty())
    }

    pub fn get_occurrences(
        &self,
        taxon: &TaxonId,
        ranks: Option<&[Rank]>,
    ) -> Result<Vec<TaxonId>, FilterError> {
        let records = self.source.all_occurrences(taxon, None)?;
        Ok(self.format_results(records, ranks))
    }

    pub fn get_occurrences_in_area(
        &self,
        taxon: &TaxonId,
        area: &AreaOfInterest,
        ranks: Option<&[Rank]>,
    ) -> Result<Vec<TaxonId>, FilterError> {
        let records = self.source.all_occurrences(taxon, Some(area))?;
        Ok(self.format_results(records, ranks))
    }

    fn format_results(
        &self,
        records: Vec<OccurrenceRecord>,
        ranks: Option<&[Rank]>,
    ) -> Vec<TaxonId> {
        let total = records.len();
        let ids = records
            .into_iter()
            .filter(|record| match (ranks, &record.taxon_rank) {
                (None, _) => true,
                (Some(ranks), Some(rank)) => ranks.contains(rank),
                (Some(_), None) => false,
            })
            .filter_map(|record| record.taxon_key)
            .map(|key| TaxonId::new(self.source.prefix(), key))
            .collect::<Vec<_>>();
        debug!(
            "kept {}/{} occurrences at rank filter {:?}",
            ids.len(),
            total,
            ranks
        );
        ids
    }
}
