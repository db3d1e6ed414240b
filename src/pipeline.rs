use tracing::{debug, info};

use crate::cache::RunCache;
use crate::config::ResolvedConfig;
use crate::domain::{AreaOfInterest, Descendant, TaxonRef};
use crate::engine::OccurrenceEngine;
use crate::error::FilterError;
use crate::expander::{RankExpander, spatial_filter};
use crate::resolver::{Resolution, TaxonResolver};
use crate::source::OccurrenceSource;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowOutcome {
    pub tag: Option<bool>,
    pub resolved_names: Option<Vec<String>>,
    pub resolved_ids: Option<Vec<String>>,
}

impl RowOutcome {
    fn tagged(tag: bool) -> Self {
        Self {
            tag: Some(tag),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub rows: usize,
    pub skipped: usize,
    pub tagged: usize,
    pub resolution_hits: usize,
    pub resolution_misses: usize,
    pub presence_hits: usize,
    pub presence_misses: usize,
}

pub struct Pipeline<S: OccurrenceSource> {
    area: AreaOfInterest,
    engine: OccurrenceEngine<S>,
    resolver: TaxonResolver,
    expander: Option<RankExpander>,
    resolutions: RunCache<String, Resolution>,
    presence: RunCache<String, bool>,
    expansions: RunCache<String, Vec<Descendant>>,
    rows: usize,
    skipped: usize,
    tagged: usize,
}

impl<S: OccurrenceSource> Pipeline<S> {
    pub fn new(
        area: AreaOfInterest,
        source: S,
        resolver: TaxonResolver,
        expander: Option<RankExpander>,
    ) -> Self {
        Self {
            area,
            engine: OccurrenceEngine::new(source),
            resolver,
            expander,
            resolutions: RunCache::new(),
            presence: RunCache::new(),
            expansions: RunCache::new(),
            rows: 0,
            skipped: 0,
            tagged: 0,
        }
    }

    pub fn from_config(config: &ResolvedConfig, source: S) -> Self {
        let expander = config
            .resolve_to_rank
            .map(|target| RankExpander::new(target, config.habitat));
        Self::new(
            config.area.clone(),
            source,
            TaxonResolver::new(config.taxa_kingdom.clone()),
            expander,
        )
    }

    pub fn engine(&self) -> &OccurrenceEngine<S> {
        &self.engine
    }

    pub fn run(&mut self, taxa: &[TaxonRef]) -> Result<Vec<RowOutcome>, FilterError> {
        let outcomes = taxa
            .iter()
            .map(|taxon| self.process_row(taxon))
            .collect::<Result<Vec<_>, _>>()?;
        let stats = self.stats();
        info!(
            rows = stats.rows,
            skipped = stats.skipped,
            tagged = stats.tagged,
            resolution_hits = stats.resolution_hits,
            presence_hits = stats.presence_hits,
            "run finished"
        );
        Ok(outcomes)
    }

    pub fn process_row(&mut self, taxon: &TaxonRef) -> Result<RowOutcome, FilterError> {
        self.rows += 1;
        let Some(key) = taxon.key() else {
            self.skipped += 1;
            return Ok(RowOutcome::default());
        };

        let resolution = self
            .resolutions
            .get_or_try_insert_with(key.to_string(), || {
                self.resolver.resolve(self.engine.source(), taxon)
            })?;
        let Some(taxon_id) = resolution.taxon_id else {
            self.skipped += 1;
            return Ok(RowOutcome::default());
        };

        let present = self
            .presence
            .get_or_try_insert_with(taxon_id.to_string(), || -> Result<bool, FilterError> {
                info!("look for occurrences of taxon {taxon_id} in {}", self.area);
                let present = self.engine.has_occurrences(&taxon_id, &self.area)?;
                if present {
                    info!("taxon {taxon_id} found in zone of interest");
                } else {
                    info!("taxon {taxon_id} not found in zone of interest");
                }
                Ok(present)
            })?;
        if !present {
            return Ok(RowOutcome::tagged(false));
        }
        self.tagged += 1;

        let Some(expander) = &self.expander else {
            return Ok(RowOutcome::tagged(true));
        };
        if !expander.applies_to(resolution.rank.as_ref()) {
            return Ok(RowOutcome::tagged(true));
        }

        let descendants = self
            .expansions
            .get_or_try_insert_with(taxon_id.to_string(), || -> Result<_, FilterError> {
                let expansion = expander.expand(self.engine.source(), &taxon_id)?;
                let kept = spatial_filter(&self.engine, expansion.descendants, &self.area)?;
                debug!(
                    "{} {} descendants of {taxon_id} in zone of interest",
                    kept.len(),
                    expander.target()
                );
                Ok(kept)
            })?;

        Ok(RowOutcome {
            tag: Some(true),
            resolved_names: Some(descendants.iter().map(|d| d.name.clone()).collect()),
            resolved_ids: Some(descendants.iter().map(|d| d.id.id().to_string()).collect()),
        })
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            rows: self.rows,
            skipped: self.skipped,
            tagged: self.tagged,
            resolution_hits: self.resolutions.hits(),
            resolution_misses: self.resolutions.misses(),
            presence_hits: self.presence.hits(),
            presence_misses: self.presence.misses(),
        }
    }
}
