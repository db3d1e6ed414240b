use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{AreaOfInterest, Habitat, Rank, TargetRank};
use crate::error::FilterError;

pub const DEFAULT_GBIF_API_URL: &str = "https://api.gbif.org/v1";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub geometry: Option<String>,
    #[serde(default)]
    pub taxa_kingdom: Option<String>,
    #[serde(default)]
    pub rank_column: Option<String>,
    #[serde(default)]
    pub taxa_rank: Option<String>,
    #[serde(default)]
    pub name_column: Option<String>,
    #[serde(default)]
    pub taxid_column: Option<String>,
    #[serde(default)]
    pub resolve_to_rank: Option<String>,
    #[serde(default)]
    pub habitat: Option<String>,
    #[serde(default)]
    pub sep: Option<String>,
    #[serde(default)]
    pub gbif_api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub area: AreaOfInterest,
    pub taxa_kingdom: Option<String>,
    pub rank_column: Option<String>,
    /// Only set when `rank_column` is not.
    pub taxa_rank: Option<Rank>,
    pub name_column: Option<String>,
    pub taxid_column: Option<String>,
    pub resolve_to_rank: Option<TargetRank>,
    pub habitat: Option<Habitat>,
    pub sep: u8,
    pub gbif_api_url: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: &Path) -> Result<ResolvedConfig, FilterError> {
        if !path.exists() {
            return Err(FilterError::MissingConfig(path.to_path_buf()));
        }
        let content =
            fs::read_to_string(path).map_err(|_| FilterError::ConfigRead(path.to_path_buf()))?;
        let mut config = Self::parse(&content)?;

        if let Ok(url) = std::env::var("GBIF_API_URL") {
            if !url.trim().is_empty() {
                config.gbif_api_url = Some(url);
            }
        }

        Self::resolve_config(config)
    }

    pub fn parse(content: &str) -> Result<Config, FilterError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(content).map_err(|err| FilterError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, FilterError> {
        let country = non_blank(config.country);
        let geometry = non_blank(config.geometry);
        let area = match (country, geometry) {
            (Some(country), geometry) => {
                if geometry.is_some() {
                    warn!("both country and geometry configured, using country {country}");
                }
                AreaOfInterest::Country(country.to_uppercase())
            }
            (None, Some(geometry)) => AreaOfInterest::Geometry(geometry),
            (None, None) => {
                return Err(FilterError::InvalidConfig(
                    "one of country or geometry is required".to_string(),
                ));
            }
        };

        let name_column = non_blank(config.name_column);
        let taxid_column = non_blank(config.taxid_column);
        if name_column.is_none() && taxid_column.is_none() {
            return Err(FilterError::InvalidConfig(
                "need at least one of name_column or taxid_column".to_string(),
            ));
        }

        let rank_column = non_blank(config.rank_column);
        let taxa_rank = match (&rank_column, non_blank(config.taxa_rank)) {
            (None, Some(rank)) => Some(rank.parse::<Rank>()?),
            _ => None,
        };

        let resolve_to_rank = non_blank(config.resolve_to_rank).map(|value| {
            match value.to_uppercase().as_str() {
                Rank::SPECIES => TargetRank::Species,
                Rank::GENUS => TargetRank::Genus,
                _ => {
                    warn!("unsupported resolve_to_rank {value}, falling back to SPECIES");
                    TargetRank::Species
                }
            }
        });

        let habitat = non_blank(config.habitat).and_then(|value| match value.parse() {
            Ok(habitat) => Some(habitat),
            Err(_) => {
                warn!("unsupported habitat {value}, ignoring it");
                None
            }
        });

        let sep = match config.sep.as_deref() {
            None | Some("") => b',',
            Some(value) if value.len() == 1 && value.is_ascii() => value.as_bytes()[0],
            Some("\\t") => b'\t',
            Some(value) => {
                return Err(FilterError::InvalidConfig(format!(
                    "sep must be a single ASCII character, got {value:?}"
                )));
            }
        };

        let gbif_api_url = non_blank(config.gbif_api_url)
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_GBIF_API_URL.to_string());

        Ok(ResolvedConfig {
            area,
            taxa_kingdom: non_blank(config.taxa_kingdom),
            rank_column,
            taxa_rank,
            name_column,
            taxid_column,
            resolve_to_rank,
            habitat,
            sep,
            gbif_api_url,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
