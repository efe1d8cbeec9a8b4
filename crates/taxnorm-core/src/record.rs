//! The denormalized classification record.

use crate::rank::Rank;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trims a value, mapping blank/whitespace-only input to `None`.
///
/// Every rank slot and the author slot go through this: a blank field is
/// indistinguishable from an absent one anywhere in the engine.
pub fn trim_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A denormalized classification: eight independently optional rank values,
/// an optional author (attributed to the lowest attested rank), and an
/// ordered list of opaque payloads.
///
/// Payloads are typically identifiers that are ultimately used as foreign
/// keys back to the source rows; ten source records with the same taxonomy
/// end up as one record carrying ten payloads. Insertion order is
/// significant and duplicates are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification<P> {
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub subspecies: Option<String>,
    pub author: Option<String>,
    pub payloads: Vec<P>,
}

impl<P> Default for Classification<P> {
    fn default() -> Self {
        Classification {
            kingdom: None,
            phylum: None,
            class: None,
            order: None,
            family: None,
            genus: None,
            species: None,
            subspecies: None,
            author: None,
            payloads: Vec::new(),
        }
    }
}

impl<P> Classification<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from the nine fields in rank order
    /// (kingdom..subspecies, then author). Blank fields become absent.
    pub fn from_fields(fields: [Option<&str>; 9]) -> Self {
        let mut record = Classification::new();
        for (rank, value) in crate::rank::ALL.into_iter().zip(fields) {
            record.set(rank, value.map(str::to_string));
        }
        record.author = fields[8].and_then(trim_to_none);
        record
    }

    /// The value at `rank`, or `None` when unset.
    pub fn get(&self, rank: Rank) -> Option<&str> {
        match rank {
            Rank::Kingdom => self.kingdom.as_deref(),
            Rank::Phylum => self.phylum.as_deref(),
            Rank::Class => self.class.as_deref(),
            Rank::Order => self.order.as_deref(),
            Rank::Family => self.family.as_deref(),
            Rank::Genus => self.genus.as_deref(),
            Rank::Species => self.species.as_deref(),
            Rank::Subspecies => self.subspecies.as_deref(),
        }
    }

    /// Sets the value at `rank`, normalizing blank input to absent.
    pub fn set(&mut self, rank: Rank, value: Option<String>) {
        let value = value.as_deref().and_then(trim_to_none);
        let slot = match rank {
            Rank::Kingdom => &mut self.kingdom,
            Rank::Phylum => &mut self.phylum,
            Rank::Class => &mut self.class,
            Rank::Order => &mut self.order,
            Rank::Family => &mut self.family,
            Rank::Genus => &mut self.genus,
            Rank::Species => &mut self.species,
            Rank::Subspecies => &mut self.subspecies,
        };
        *slot = value;
    }

    /// True when every rank below `rank` is unset.
    pub fn is_most_specific(&self, rank: Rank) -> bool {
        crate::rank::ranks_below(rank, false)
            .iter()
            .all(|&r| self.get(r).is_none())
    }
}

impl<P> fmt::Display for Classification<P> {
    /// Renders `kingdom|phylum|...|author` with `--` for absent slots.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            self.kingdom.as_deref(),
            self.phylum.as_deref(),
            self.class.as_deref(),
            self.order.as_deref(),
            self.family.as_deref(),
            self.genus.as_deref(),
            self.species.as_deref(),
            self.subspecies.as_deref(),
            self.author.as_deref(),
        ];
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(part.unwrap_or("--"))?;
        }
        Ok(())
    }
}
