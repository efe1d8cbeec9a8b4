//! The eight Linnean ranks and their fixed ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight fixed taxonomic ranks.
///
/// The derived `Ord` follows the hierarchy: `Kingdom` compares smallest and
/// `Subspecies` largest. Throughout this crate "higher" means closer to
/// kingdom and "lower" means closer to subspecies; the ordering is fixed
/// and never reinterpreted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Subspecies,
}

/// All ranks, kingdom first.
pub const ALL: [Rank; 8] = [
    Rank::Kingdom,
    Rank::Phylum,
    Rank::Class,
    Rank::Order,
    Rank::Family,
    Rank::Genus,
    Rank::Species,
    Rank::Subspecies,
];

impl Rank {
    /// Short code used in the pipe-delimited wire format.
    pub const fn code(self) -> &'static str {
        match self {
            Rank::Kingdom => "K",
            Rank::Phylum => "P",
            Rank::Class => "C",
            Rank::Order => "O",
            Rank::Family => "F",
            Rank::Genus => "G",
            Rank::Species => "S",
            Rank::Subspecies => "SS",
        }
    }

    /// True if `self` is at a higher or equal taxonomic level than `other`.
    pub fn is_higher_or_equal(self, other: Rank) -> bool {
        self <= other
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The ranks above `rank` (kingdom-ward), ordered kingdom first.
///
/// Empty above kingdom when exclusive.
pub fn ranks_above(rank: Rank, inclusive: bool) -> &'static [Rank] {
    let end = rank as usize + usize::from(inclusive);
    &ALL[..end]
}

/// The ranks below `rank` (subspecies-ward), still ordered kingdom first.
///
/// Empty below subspecies when exclusive.
pub fn ranks_below(rank: Rank, inclusive: bool) -> &'static [Rank] {
    let start = rank as usize + usize::from(!inclusive);
    &ALL[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order_is_kingdom_to_subspecies() {
        for window in ALL.windows(2) {
            assert!(window[0] < window[1]);
            assert!(window[0].is_higher_or_equal(window[1]));
            assert!(!window[1].is_higher_or_equal(window[0]));
        }
        assert!(Rank::Species.is_higher_or_equal(Rank::Species));
    }

    #[test]
    fn ranks_above_bounds() {
        assert!(ranks_above(Rank::Kingdom, false).is_empty());
        assert_eq!(ranks_above(Rank::Kingdom, true), &[Rank::Kingdom]);
        assert_eq!(
            ranks_above(Rank::Order, true),
            &[Rank::Kingdom, Rank::Phylum, Rank::Class, Rank::Order]
        );
        assert_eq!(
            ranks_above(Rank::Order, false),
            &[Rank::Kingdom, Rank::Phylum, Rank::Class]
        );
        assert_eq!(ranks_above(Rank::Subspecies, true), &ALL);
    }

    #[test]
    fn ranks_below_bounds() {
        assert!(ranks_below(Rank::Subspecies, false).is_empty());
        assert_eq!(ranks_below(Rank::Subspecies, true), &[Rank::Subspecies]);
        assert_eq!(
            ranks_below(Rank::Genus, false),
            &[Rank::Species, Rank::Subspecies]
        );
        assert_eq!(ranks_below(Rank::Kingdom, true), &ALL);
    }

    #[test]
    fn codes_are_stable() {
        let codes: Vec<&str> = ALL.iter().map(|r| r.code()).collect();
        assert_eq!(codes, ["K", "P", "C", "O", "F", "G", "S", "SS"]);
    }
}
