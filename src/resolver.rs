use tracing::{error, info};

use crate::domain::{Rank, TaxonId, TaxonRef};
use crate::error::FilterError;
use crate::source::{BackboneQuery, MatchType, OccurrenceSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub taxon_id: Option<TaxonId>,
    pub rank: Option<Rank>,
}

impl Resolution {
    fn failed(rank: Option<Rank>) -> Self {
        Self {
            taxon_id: None,
            rank,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaxonResolver {
    kingdom: Option<String>,
}

impl TaxonResolver {
    pub fn new(kingdom: Option<String>) -> Self {
        Self { kingdom }
    }

    /// Raw ids are trusted without a remote lookup; names need an EXACT backbone match.
    pub fn resolve<S: OccurrenceSource>(
        &self,
        source: &S,
        taxon: &TaxonRef,
    ) -> Result<Resolution, FilterError> {
        if let Some(raw_id) = taxon.raw_id.as_deref() {
            return Ok(self.resolve_raw_id(source, raw_id, taxon.rank.clone()));
        }
        let Some(name) = taxon.name.as_deref() else {
            return Ok(Resolution::failed(taxon.rank.clone()));
        };
        self.resolve_name(source, name, taxon.rank.as_ref())
    }

    fn resolve_raw_id<S: OccurrenceSource>(
        &self,
        source: &S,
        raw_id: &str,
        rank: Option<Rank>,
    ) -> Resolution {
        match TaxonId::parse_with_default(raw_id, source.prefix()) {
            Ok(id) if id.prefix() != source.prefix() => {
                error!("taxon id {id} does not belong to provider {}", source.prefix());
                Resolution::failed(rank)
            }
            Ok(id) if !source.accepts_id(id.id()) => {
                error!("taxon id {id} is not a valid {} identifier", source.prefix());
                Resolution::failed(rank)
            }
            Ok(id) => Resolution {
                taxon_id: Some(id),
                rank,
            },
            Err(err) => {
                error!("{err}");
                Resolution::failed(rank)
            }
        }
    }

    fn resolve_name<S: OccurrenceSource>(
        &self,
        source: &S,
        name: &str,
        rank: Option<&Rank>,
    ) -> Result<Resolution, FilterError> {
        info!(
            "look for id of taxon {name} with rank {} in backbone taxonomy",
            rank.map(Rank::as_str).unwrap_or("ANY")
        );
        let query = BackboneQuery {
            name,
            rank,
            kingdom: self.kingdom.as_deref(),
        };
        let matched = source.match_backbone(&query)?;
        if matched.match_type != MatchType::Exact {
            error!("no exact match for taxon {name}: {:?}", matched.match_type);
            return Ok(Resolution::failed(rank.cloned()));
        }

        let key = if matched.synonym {
            let accepted = matched.accepted_usage_key.clone();
            if let (Some(synonym), Some(accepted)) = (&matched.usage_key, &accepted) {
                info!("taxon {name} ({synonym}) is a synonym, using accepted usage {accepted}");
            }
            accepted
        } else {
            matched.usage_key.clone()
        };
        let Some(key) = key else {
            error!("exact match for taxon {name} carries no usage key");
            return Ok(Resolution::failed(rank.cloned()));
        };

        let taxon_id = TaxonId::new(source.prefix(), key);
        info!("found exact match for taxon {name} with id {taxon_id}");
        Ok(Resolution {
            taxon_id: Some(taxon_id),
            rank: matched.rank.or_else(|| rank.cloned()),
        })
    }
}
