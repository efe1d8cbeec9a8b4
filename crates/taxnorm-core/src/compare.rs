//! Ordering, equality and conflict predicates over classification records.
//!
//! Everything here is built on one rule: an absent value sorts *after* any
//! present value, and two absent values are equal. The full comparator
//! applies that rule lexicographically over the nine fields in rank order,
//! which is what makes duplicate collapsing and tree assembly single
//! linear scans over a sorted sequence.

use crate::rank::{self, Rank};
use crate::record::Classification;
use std::cmp::Ordering;
use tracing::debug;

/// Null-aware string ordering: present before absent, absent equals absent.
pub fn cmp_value(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(y),
    }
}

/// Lexicographic comparison over all nine fields, kingdom through author.
///
/// This is the canonical sort used before duplicate collapsing and before
/// tree assembly.
pub fn cmp_full<P>(a: &Classification<P>, b: &Classification<P>) -> Ordering {
    for &r in &rank::ALL {
        match cmp_value(a.get(r), b.get(r)) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    cmp_value(a.author.as_deref(), b.author.as_deref())
}

/// Comparison using a single rank's value.
///
/// Species and subspecies additionally break ties on the author, since two
/// records can share a name at those ranks and differ only in the
/// authorship attached there.
pub fn cmp_at_rank<P>(rank: Rank, a: &Classification<P>, b: &Classification<P>) -> Ordering {
    let ord = cmp_value(a.get(rank), b.get(rank));
    match rank {
        Rank::Species | Rank::Subspecies if ord == Ordering::Equal => {
            cmp_value(a.author.as_deref(), b.author.as_deref())
        }
        _ => ord,
    }
}

/// True iff all nine fields are equal (absent equals absent).
///
/// Payloads are deliberately excluded.
pub fn equal_classifications<P>(a: &Classification<P>, b: &Classification<P>) -> bool {
    cmp_full(a, b) == Ordering::Equal
}

/// Checks whether two classifications conflict at or above `rank`.
///
/// A conflict is two *present* values that differ; absent against present
/// is never a conflict.
pub fn have_conflict<P>(a: &Classification<P>, b: &Classification<P>, rank: Rank) -> bool {
    rank::ranks_above(rank, true).iter().any(|&r| {
        matches!((a.get(r), b.get(r)), (Some(v1), Some(v2)) if v1 != v2)
    })
}

/// Checks whether two classifications agree *exactly* at every rank
/// strictly above `rank`, absent values included.
///
/// Stricter than [`have_conflict`]: an absent value on one side must be
/// matched by absent on the other.
pub fn share_higher_taxonomy<P>(a: &Classification<P>, b: &Classification<P>, rank: Rank) -> bool {
    rank::ranks_above(rank, false)
        .iter()
        .all(|&r| a.get(r) == b.get(r))
}

/// Returns the highest rank at which two records differ, or `None` when
/// they are indistinguishable under the full comparator.
///
/// Kingdom through genus is a straight scan, with one twist: when a rank
/// agrees but everything below it is absent on both sides and the authors
/// differ, the records differ *at that rank* (the author belongs to the
/// lowest attested rank).
///
/// Species and subspecies are governed by the presence combination of the
/// four slots (source/target species, source/target subspecies). Authorship
/// is only compared between records attested at the same depth: when one
/// side carries a subspecies and the other does not, the lone author
/// belongs to the subspecies and is ignored for the species comparison.
pub fn rank_of_deviation<P>(
    source: &Classification<P>,
    target: &Classification<P>,
) -> Option<Rank> {
    for &r in &rank::ALL {
        if r > Rank::Genus {
            break;
        }
        let s = source.get(r);
        let t = target.get(r);
        if s != t {
            return Some(r);
        }
        // e.g. Animalia,-,-,-,Felidae,-,-,-,--
        //      Animalia,-,-,-,Felidae,-,-,-,L. 1771
        // differ at family: the author can only refer to the family.
        let below_all_absent = rank::ranks_below(r, false)
            .iter()
            .all(|&r1| source.get(r1).is_none() && target.get(r1).is_none());
        if below_all_absent && source.author != target.author {
            return Some(r);
        }
    }

    let state = (u8::from(source.species.is_some()) << 3)
        | (u8::from(target.species.is_some()) << 2)
        | (u8::from(source.subspecies.is_some()) << 1)
        | u8::from(target.subspecies.is_some());
    debug!(state, "species/subspecies deviation state");

    match state {
        // nothing attested at species or below on either side
        0x0 => None,

        // no species anywhere, subspecies on exactly one side
        0x1 | 0x2 => Some(Rank::Subspecies),

        // no species anywhere, subspecies on both
        0x3 => {
            if source.subspecies != target.subspecies || source.author != target.author {
                Some(Rank::Subspecies)
            } else {
                None
            }
        }

        // species present on exactly one side
        0x4..=0xB => Some(Rank::Species),

        // species on both, no subspecies anywhere
        0xC => {
            if source.species != target.species || source.author != target.author {
                Some(Rank::Species)
            } else {
                None
            }
        }

        // species on both, subspecies on exactly one side; the lone author
        // refers to the subspecies, so it plays no part here
        0xD | 0xE => {
            if source.species == target.species {
                Some(Rank::Subspecies)
            } else {
                Some(Rank::Species)
            }
        }

        // species and subspecies on both sides
        _ => {
            if source.species != target.species {
                Some(Rank::Species)
            } else if source.subspecies != target.subspecies || source.author != target.author {
                Some(Rank::Subspecies)
            } else {
                None
            }
        }
    }
}

/// Sorts by the given rank's comparator.
pub fn sort_by_rank<P>(rank: Rank, records: &mut [Classification<P>]) {
    debug!(classifications = records.len(), rank = %rank, "sorting");
    records.sort_by(|a, b| cmp_at_rank(rank, a, b));
}

/// Appends the source record's payloads onto the target, preserving each
/// side's internal order with the target's first.
pub fn merge_into<P>(source: Classification<P>, target: &mut Classification<P>) {
    target.payloads.extend(source.payloads);
}

/// Collapses records with equal classifications into one.
///
/// Sorts with the full comparator so equal records become adjacent, then
/// folds each later duplicate's payloads onto the earlier record and drops
/// it. Running this twice is a no-op the second time.
pub fn merge_duplicates<P>(records: &mut Vec<Classification<P>>) {
    records.sort_by(|a, b| cmp_full(a, b));
    records.dedup_by(|curr, prev| {
        if equal_classifications(curr, prev) {
            debug!(record = %curr, "merging duplicate classification");
            let payloads = std::mem::take(&mut curr.payloads);
            prev.payloads.extend(payloads);
            true
        } else {
            false
        }
    });
    debug!(classifications = records.len(), "finished merging duplicates");
}
