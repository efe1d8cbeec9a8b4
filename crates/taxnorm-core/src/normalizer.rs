//! The iterative higher-taxon inference engine.
//!
//! One normalization run makes eight passes over the working set, from
//! subspecies up to kingdom. Each pass sorts by that rank, partitions the
//! sequence into contiguous runs sharing the rank's value, and tries to
//! fill the sparse higher ranks of each run member from the run's other
//! members — but only when exactly one candidate value survives the
//! conflict and shared-ancestry filters. Names that fail to resolve
//! unambiguously are recorded as homonyms so later passes at higher ranks
//! never unify records on that name alone.

use crate::compare::{
    cmp_full, have_conflict, merge_duplicates, share_higher_taxonomy, sort_by_rank,
};
use crate::interpret::{infer_genera, infer_species, NameInterpreter};
use crate::rank::{self, Rank};
use crate::record::Classification;
use crate::tree::{build_tree, TaxonNode};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Names known to be ambiguous at a given rank.
///
/// Created once per normalization run and threaded through all eight
/// passes; append-only within a run, never shared across runs.
#[derive(Debug)]
pub struct HomonymCache {
    names: [BTreeSet<String>; 8],
}

impl HomonymCache {
    pub fn new() -> Self {
        HomonymCache {
            names: std::array::from_fn(|_| BTreeSet::new()),
        }
    }

    /// Registers `name` as ambiguous at `rank`.
    pub fn insert(&mut self, rank: Rank, name: &str) {
        self.names[rank as usize].insert(name.to_string());
    }

    pub fn contains(&self, rank: Rank, name: &str) -> bool {
        self.names[rank as usize].contains(name)
    }

    pub fn count_at(&self, rank: Rank) -> usize {
        self.names[rank as usize].len()
    }
}

impl Default for HomonymCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Full normalization: gap filling, eight inference passes, final sort,
/// tree assembly.
///
/// The input is mutated in place (values filled, duplicates collapsed,
/// payloads moved onto the returned nodes). Deterministic for a given
/// input sequence.
pub fn normalize<P, I: NameInterpreter>(
    records: &mut Vec<Classification<P>>,
    names: &I,
) -> Vec<TaxonNode<P>> {
    infer_species(records, names);
    infer_genera(records, names);

    let mut homonyms = HomonymCache::new();
    for &rank in rank::ALL.iter().rev() {
        sort_and_merge(rank, records, &mut homonyms);
    }
    info!(
        classifications = records.len(),
        "completed classification merging at all ranks"
    );

    // final ordering from the bottom up for the tree walk
    records.sort_by(|a, b| cmp_full(a, b));
    build_tree(records)
}

/// One pass: sort by the rank's comparator, infer within each contiguous
/// run, then collapse any records the inference made identical.
pub fn sort_and_merge<P>(
    rank: Rank,
    records: &mut Vec<Classification<P>>,
    homonyms: &mut HomonymCache,
) {
    info!(
        classifications = records.len(),
        rank = %rank,
        known_homonyms = homonyms.count_at(rank),
        "starting inference pass"
    );
    sort_by_rank(rank, records);
    merge_at_rank(rank, records, homonyms);
    merge_duplicates(records);
    info!(
        classifications = records.len(),
        rank = %rank,
        "finished inference pass"
    );
}

/// Partitions the (already rank-sorted) records into maximal contiguous
/// runs sharing the value at `rank` and runs inference on each.
///
/// Names found ambiguous during this pass are registered only once the
/// whole pass is done: registration exists to stop *later* passes from
/// unifying on the name, not to freeze the very run that discovered it.
pub fn merge_at_rank<P>(
    rank: Rank,
    records: &mut [Classification<P>],
    homonyms: &mut HomonymCache,
) {
    let mut fresh: BTreeSet<String> = BTreeSet::new();
    let mut start = 0;
    while start < records.len() {
        let mut end = start + 1;
        while end < records.len() && records[end].get(rank) == records[start].get(rank) {
            end += 1;
        }
        infer_higher_taxa(&mut records[start..end], rank, homonyms, &mut fresh);
        start = end;
    }
    for name in fresh {
        homonyms.insert(rank, &name);
    }
}

/// Composite key over the ranks strictly above `rank`, with absent values
/// encoded as a distinct sentinel. Used only to bound the candidate set:
/// records sharing the key carry no extra information for inference.
fn higher_taxonomy_key<P>(record: &Classification<P>, rank: Rank) -> String {
    let mut key = String::new();
    for &r in rank::ranks_above(rank, false) {
        key.push('|');
        key.push_str(record.get(r).unwrap_or("--"));
    }
    key
}

/// Representative indices: the first run member for each distinct higher
/// taxonomy. Handles into the run, not copies, so mutations made during
/// the rank scan are visible to the finer ranks that follow.
fn distinct_representatives<P>(group: &[Classification<P>], rank: Rank) -> Vec<usize> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut representatives = Vec::new();
    for (i, record) in group.iter().enumerate() {
        if seen.insert(higher_taxonomy_key(record, rank)) {
            representatives.push(i);
        }
    }
    debug!(
        group = group.len(),
        distinct = representatives.len(),
        rank = %rank,
        "deduplicated run into representatives"
    );
    representatives
}

/// True when the record holds a name already known to be a homonym, either
/// its value at the working rank or any value below it. A known ambiguity
/// downstream forbids assuming unity upstream.
fn homonym_suppressed<P>(
    rank: Rank,
    homonyms: &HomonymCache,
    record: &Classification<P>,
) -> bool {
    let Some(value) = record.get(rank) else {
        return false;
    };
    if homonyms.contains(rank, value) {
        debug!(name = value, rank = %rank, "known homonym at working rank");
        return true;
    }
    rank::ranks_below(rank, false).iter().any(|&r| {
        record.get(r).is_some_and(|v| {
            let found = homonyms.contains(r, v);
            if found {
                debug!(name = v, rank = %r, "known homonym below working rank");
            }
            found
        })
    })
}

/// Inference within one run, whose members all share the value at `rank`.
///
/// For every rank strictly above the working rank, kingdom downward: each
/// member missing a value there collects the values of representatives
/// that neither conflict with it nor differ anywhere in their higher
/// taxonomy. Exactly one surviving value is assigned permanently; zero or
/// several register the run's shared name as a homonym. Consider
///
/// ```text
/// a b c
/// - - c
/// d - c
/// ```
///
/// working the middle rank of row two: row one does not conflict, but row
/// three proves the ancestry of `c` is ambiguous, so `b` must not be
/// assumed.
fn infer_higher_taxa<P>(
    group: &mut [Classification<P>],
    rank: Rank,
    homonyms: &HomonymCache,
    fresh: &mut BTreeSet<String>,
) {
    if group.len() <= 1 {
        return;
    }
    if group[0].get(rank).is_none() {
        debug!(rank = %rank, "skipping run with absent value at the working rank");
        return;
    }
    debug!(
        group = group.len(),
        rank = %rank,
        name = group[0].get(rank).unwrap_or("--"),
        "inferring higher taxa for run"
    );

    let representatives = distinct_representatives(group, rank);

    for &r in rank::ranks_above(rank, false) {
        let sparse: Vec<usize> = (0..group.len())
            .filter(|&i| group[i].get(r).is_none())
            .collect();
        if sparse.is_empty() {
            continue;
        }
        let candidates: Vec<usize> = representatives
            .iter()
            .copied()
            .filter(|&i| group[i].get(r).is_some())
            .collect();
        if candidates.is_empty() {
            continue;
        }

        for d in sparse {
            let mut potentials: BTreeSet<String> = BTreeSet::new();
            for &c in &candidates {
                if have_conflict(&group[d], &group[c], r) {
                    debug!(candidate = %group[c], "candidate discarded: conflict");
                } else if share_higher_taxonomy(&group[d], &group[c], r) {
                    if let Some(value) = group[c].get(r) {
                        potentials.insert(value.to_string());
                    }
                } else {
                    // ranks are scanned in order, so anything short of an
                    // exact higher-taxonomy match is ambiguity
                    debug!(candidate = %group[c], "candidate discarded: ambiguous");
                }
            }

            let suppressed = homonym_suppressed(rank, homonyms, &group[d]);
            if suppressed {
                debug!(record = %group[d], rank = %r, "inference suppressed by homonym");
            }
            if potentials.len() == 1 && !suppressed {
                let value = potentials.into_iter().next();
                debug!(record = %group[d], rank = %r, value = value.as_deref(), "inferred");
                group[d].set(r, value);
            } else if let Some(name) = group[d].get(rank) {
                debug!(
                    name,
                    rank = %rank,
                    options = potentials.len(),
                    "no unanimous option; registering homonym"
                );
                fresh.insert(name.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::NoInterpretation;

    fn rec(fields: [&str; 9]) -> Classification<u32> {
        Classification::from_fields(fields.map(|f| (f != "-").then_some(f)))
    }

    // a,-,c,d / a,b,-,d / -,b,-,d share order "d" and unify into a,b,c,d
    #[test]
    fn sparse_records_unify_at_a_shared_rank() {
        let mut records = vec![
            rec(["a", "-", "c", "d", "-", "-", "-", "-", "-"]),
            rec(["a", "b", "-", "d", "-", "-", "-", "-", "-"]),
            rec(["-", "b", "-", "d", "-", "-", "-", "-", "-"]),
        ];
        let mut homonyms = HomonymCache::new();
        sort_and_merge(Rank::Order, &mut records, &mut homonyms);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].to_string(),
            "a|b|c|d|--|--|--|--|--"
        );
    }

    // adding e,-,-,d conflicts at kingdom: nothing may be inferred onto it,
    // "d" must be remembered as an order-level homonym, and the record with
    // no kingdom at all can no longer pick one
    #[test]
    fn conflicting_kingdom_prevents_unification() {
        let mut records = vec![
            rec(["a", "-", "c", "d", "-", "-", "-", "-", "-"]),
            rec(["a", "b", "-", "d", "-", "-", "-", "-", "-"]),
            rec(["-", "b", "-", "d", "-", "-", "-", "-", "-"]),
            rec(["e", "-", "-", "d", "-", "-", "-", "-", "-"]),
        ];
        let mut homonyms = HomonymCache::new();
        sort_and_merge(Rank::Order, &mut records, &mut homonyms);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].to_string(), "a|b|c|d|--|--|--|--|--");
        assert_eq!(records[1].to_string(), "e|--|--|d|--|--|--|--|--");
        assert_eq!(records[2].to_string(), "--|b|--|d|--|--|--|--|--");
        assert!(homonyms.contains(Rank::Order, "d"));
    }

    #[test]
    fn a_genus_homonym_suppresses_inference_in_the_order_pass() {
        // genus "f" occurs under kingdoms "a" and "b", so the genus pass
        // registers it; in the later order pass the record carrying the
        // ambiguous genus must not inherit "a" even though "a" is the only
        // candidate in its run
        let mut records = vec![
            rec(["a", "-", "-", "o", "-", "f", "-", "-", "-"]),
            rec(["-", "-", "-", "o", "-", "f", "-", "-", "-"]),
            rec(["b", "-", "-", "-", "-", "f", "-", "-", "-"]),
        ];
        let mut homonyms = HomonymCache::new();
        sort_and_merge(Rank::Genus, &mut records, &mut homonyms);
        assert!(homonyms.contains(Rank::Genus, "f"));

        sort_and_merge(Rank::Order, &mut records, &mut homonyms);
        let sparse = records
            .iter()
            .find(|r| r.kingdom.is_none())
            .expect("suppressed record still present");
        assert_eq!(sparse.order.as_deref(), Some("o"));
        assert!(homonyms.contains(Rank::Order, "o"));
    }

    #[test]
    fn registration_does_not_freeze_the_discovering_pass() {
        // "d" becomes a homonym during this order pass (kingdoms "a"/"e"
        // both claim it), but inference elsewhere in the same run must
        // still complete; only later passes see the registration
        let mut records = vec![
            rec(["a", "-", "c", "d", "-", "-", "-", "-", "-"]),
            rec(["a", "b", "-", "d", "-", "-", "-", "-", "-"]),
            rec(["e", "-", "-", "d", "-", "-", "-", "-", "-"]),
        ];
        let mut homonyms = HomonymCache::new();
        sort_and_merge(Rank::Order, &mut records, &mut homonyms);
        assert!(homonyms.contains(Rank::Order, "d"));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].to_string(), "a|b|c|d|--|--|--|--|--");
    }

    #[test]
    fn runs_with_absent_values_are_skipped() {
        let mut records = vec![
            rec(["a", "b", "-", "-", "-", "-", "-", "-", "-"]),
            rec(["-", "-", "c", "-", "-", "-", "-", "-", "-"]),
        ];
        let mut homonyms = HomonymCache::new();
        // both records are blank at genus: the whole set is one skipable run
        sort_and_merge(Rank::Genus, &mut records, &mut homonyms);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kingdom.as_deref(), Some("a"));
        assert_eq!(records[1].class.as_deref(), Some("c"));
    }

    #[test]
    fn normalization_is_deterministic() {
        let build = || {
            vec![
                rec(["a", "-", "c", "d", "-", "-", "-", "-", "-"]),
                rec(["a", "b", "-", "d", "-", "-", "-", "-", "-"]),
                rec(["-", "b", "-", "d", "-", "-", "-", "-", "-"]),
                rec(["e", "-", "-", "d", "-", "-", "-", "-", "-"]),
            ]
        };
        let mut first = build();
        let mut second = build();
        let tree_a = normalize(&mut first, &NoInterpretation);
        let tree_b = normalize(&mut second, &NoInterpretation);
        assert_eq!(tree_a.len(), tree_b.len());
        for (a, b) in tree_a.iter().zip(&tree_b) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.parent_id, b.parent_id);
            assert_eq!(a.scientific_name, b.scientific_name);
            assert_eq!(a.rank, b.rank);
        }
    }
}
