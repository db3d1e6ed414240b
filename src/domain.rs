use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

static TAXON_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9_.-]*:)(\S+)$").expect("taxon id pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxonId {
    prefix: String,
    id: String,
}

impl TaxonId {
    pub fn new(prefix: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            id: id.into(),
        }
    }

    /// Parses a raw id cell. Bare ids (no `PREFIX:`) are attributed to `default_prefix`.
    pub fn parse_with_default(value: &str, default_prefix: &str) -> Result<Self, FilterError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(FilterError::InvalidTaxonId(value.to_string()));
        }
        match trimmed.parse::<TaxonId>() {
            Ok(id) => Ok(id),
            Err(_) if !trimmed.contains(':') => Ok(Self::new(default_prefix, trimmed)),
            Err(err) => Err(err),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.id)
    }
}

impl FromStr for TaxonId {
    type Err = FilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let caps = TAXON_ID_RE
            .captures(value.trim())
            .ok_or_else(|| FilterError::InvalidTaxonId(value.to_string()))?;
        Ok(Self::new(&caps[1], &caps[2]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rank(String);

impl Rank {
    pub const SPECIES: &'static str = "SPECIES";
    pub const GENUS: &'static str = "GENUS";
    pub const FAMILY: &'static str = "FAMILY";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_coarse(&self) -> bool {
        matches!(self.0.as_str(), Self::FAMILY | Self::GENUS)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rank {
    type Err = FilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(FilterError::InvalidConfig("empty rank".to_string()));
        }
        Ok(Self(normalized))
    }
}

impl From<TargetRank> for Rank {
    fn from(value: TargetRank) -> Self {
        Rank(value.as_str().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetRank {
    Species,
    Genus,
}

impl TargetRank {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetRank::Species => Rank::SPECIES,
            TargetRank::Genus => Rank::GENUS,
        }
    }

    pub fn matches(&self, rank: &Rank) -> bool {
        rank.as_str() == self.as_str()
    }
}

impl fmt::Display for TargetRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Habitat {
    Terrestrial,
    Freshwater,
    Marine,
}

impl Habitat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Habitat::Terrestrial => "TERRESTRIAL",
            Habitat::Freshwater => "FRESHWATER",
            Habitat::Marine => "MARINE",
        }
    }
}

impl FromStr for Habitat {
    type Err = FilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "TERRESTRIAL" => Ok(Habitat::Terrestrial),
            "FRESHWATER" => Ok(Habitat::Freshwater),
            "MARINE" => Ok(Habitat::Marine),
            _ => Err(FilterError::InvalidConfig(format!("unknown habitat {value}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaOfInterest {
    Country(String),
    Geometry(String),
}

impl fmt::Display for AreaOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaOfInterest::Country(code) => write!(f, "country {code}"),
            AreaOfInterest::Geometry(_) => write!(f, "POLYGON"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descendant {
    pub name: String,
    pub id: TaxonId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonRef {
    pub name: Option<String>,
    pub raw_id: Option<String>,
    pub rank: Option<Rank>,
}

impl TaxonRef {
    /// Raw lookup key: the id when present, otherwise the name.
    pub fn key(&self) -> Option<&str> {
        self.raw_id.as_deref().or(self.name.as_deref())
    }
}
