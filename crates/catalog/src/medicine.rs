use serde::{Deserialize, Serialize};

use medfind_core::{DomainError, DomainResult, Entity, MedicineId};

use crate::price::Price;

/// A medicine as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: MedicineId,
    pub name: String,
    pub reference_price: Price,
}

impl Medicine {
    pub fn new(id: MedicineId, name: impl Into<String>, reference_price: Price) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("medicine name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            reference_price,
        })
    }

    /// Ordering key used by every catalog listing (case-folded name, then id).
    pub fn sort_key(&self) -> (String, MedicineId) {
        (self.name.to_lowercase(), self.id)
    }
}

impl Entity for Medicine {
    type Id = MedicineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// How a search selects medicines by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamePattern {
    /// No pattern given: return a bounded discovery sample.
    Any,
    /// Case-insensitive prefix match. Holds the lowercased prefix.
    Prefix(String),
}

impl NamePattern {
    /// Whitespace-only or missing input means [`NamePattern::Any`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(p) if !p.is_empty() => NamePattern::Prefix(p.to_lowercase()),
            _ => NamePattern::Any,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Prefix(prefix) => name.to_lowercase().starts_with(prefix.as_str()),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match self {
            NamePattern::Any => None,
            NamePattern::Prefix(p) => Some(p),
        }
    }
}

impl core::fmt::Display for NamePattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NamePattern::Any => f.write_str("*"),
            NamePattern::Prefix(p) => write!(f, "{p}*"),
        }
    }
}
