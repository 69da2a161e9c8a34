use std::fmt;
use std::str::FromStr;

use crate::error::TaxError;

/// Placeholder written for any rank that could not be resolved.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxId(String);

impl TaxId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxId {
    type Err = TaxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(TaxError::InvalidTaxId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Superkingdom,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    /// Ranks in output column order.
    pub const ALL: [Rank; 8] = [
        Rank::Superkingdom,
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
    ];

    /// Key used for this rank in the upstream classification object.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Superkingdom => "superkingdom",
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Species => "species",
        }
    }

    pub fn id_column(&self) -> String {
        format!("{}_id", self.as_str())
    }

    pub fn name_column(&self) -> String {
        format!("{}_name", self.as_str())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageEntry {
    pub id: String,
    pub name: String,
}

impl LineageEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }

    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN && self.name == UNKNOWN
    }
}

impl Default for LineageEntry {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Lineage of one TaxID. Every rank is always populated; unresolved ranks
/// hold the `unknown` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineageRecord {
    pub superkingdom: LineageEntry,
    pub kingdom: LineageEntry,
    pub phylum: LineageEntry,
    pub class: LineageEntry,
    pub order: LineageEntry,
    pub family: LineageEntry,
    pub genus: LineageEntry,
    pub species: LineageEntry,
}

impl LineageRecord {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn get(&self, rank: Rank) -> &LineageEntry {
        match rank {
            Rank::Superkingdom => &self.superkingdom,
            Rank::Kingdom => &self.kingdom,
            Rank::Phylum => &self.phylum,
            Rank::Class => &self.class,
            Rank::Order => &self.order,
            Rank::Family => &self.family,
            Rank::Genus => &self.genus,
            Rank::Species => &self.species,
        }
    }

    pub fn get_mut(&mut self, rank: Rank) -> &mut LineageEntry {
        match rank {
            Rank::Superkingdom => &mut self.superkingdom,
            Rank::Kingdom => &mut self.kingdom,
            Rank::Phylum => &mut self.phylum,
            Rank::Class => &mut self.class,
            Rank::Order => &mut self.order,
            Rank::Family => &mut self.family,
            Rank::Genus => &mut self.genus,
            Rank::Species => &mut self.species,
        }
    }

    pub fn is_unknown(&self) -> bool {
        Rank::ALL.iter().all(|rank| self.get(*rank).is_unknown())
    }

    /// The 16 lineage values in output column order (id then name per rank).
    pub fn values(&self) -> Vec<&str> {
        Rank::ALL
            .iter()
            .flat_map(|rank| {
                let entry = self.get(*rank);
                [entry.id.as_str(), entry.name.as_str()]
            })
            .collect()
    }
}

/// The 16 lineage column names in output order.
pub fn lineage_columns() -> Vec<String> {
    Rank::ALL
        .iter()
        .flat_map(|rank| [rank.id_column(), rank.name_column()])
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_taxid_trims() {
        let id: TaxId = " 9606 ".parse().unwrap();
        assert_eq!(id.as_str(), "9606");
    }

    #[test]
    fn parse_taxid_blank() {
        let err = "   ".parse::<TaxId>().unwrap_err();
        assert_matches!(err, TaxError::InvalidTaxId(_));
    }

    #[test]
    fn unknown_record_has_sixteen_sentinels() {
        let record = LineageRecord::unknown();
        let values = record.values();
        assert_eq!(values.len(), 16);
        assert!(values.iter().all(|value| *value == UNKNOWN));
    }
}
