//! Flat-to-tree conversion of a fully sorted, deduplicated record set.
//!
//! The walk keeps one "open" node per rank; a record only creates nodes at
//! and below its deviation point from the previous record, everything
//! above is shared with the open ancestors.

use crate::compare::rank_of_deviation;
use crate::rank::{self, Rank};
use crate::record::Classification;
use serde::Serialize;
use std::mem;
use tracing::debug;

/// One node of the normalized taxonomic tree.
///
/// Ids are 1-based and assigned in creation order; a node's parent always
/// has a smaller id. The root nodes (kingdoms, or orphaned lower taxa)
/// carry no parent.
#[derive(Debug, Clone, Serialize)]
pub struct TaxonNode<P> {
    pub id: u32,
    pub parent_id: Option<u32>,
    pub scientific_name: String,
    pub author: Option<String>,
    pub rank: Rank,
    pub payloads: Vec<P>,
}

/// Assembles the tree from records sorted by the full comparator.
///
/// Payloads are moved out of the records onto the node of each record's
/// most specific rank. The author lands on the subspecies node when one
/// exists, otherwise on the species node; higher ranks never carry one.
pub fn build_tree<P>(records: &mut [Classification<P>]) -> Vec<TaxonNode<P>> {
    let mut nodes: Vec<TaxonNode<P>> = Vec::new();
    // most recently created node per rank, id or vacant
    let mut open: [Option<u32>; 8] = [None; 8];

    for i in 0..records.len() {
        let deviation = if i == 0 {
            Some(Rank::Kingdom)
        } else {
            let (prev, rest) = records.split_at(i);
            rank_of_deviation(&prev[i - 1], &rest[0])
        };
        let Some(deviation) = deviation else {
            debug!(record = %records[i], "record identical to its predecessor; skipping");
            continue;
        };

        // a predecessor with a subspecies deviating from a bare species
        // record of the same binomial: the species node already exists and
        // this record's author and payloads belong on it
        if deviation == Rank::Subspecies
            && i > 0
            && records[i].subspecies.is_none()
            && records[i].species.is_some()
            && records[i].species == records[i - 1].species
        {
            let payloads = mem::take(&mut records[i].payloads);
            let author = records[i].author.clone();
            backpatch_species(&mut nodes, author, payloads);
            continue;
        }

        for &r in rank::ranks_below(deviation, true) {
            open[r as usize] = None;
            let Some(name) = records[i].get(r).map(str::to_string) else {
                continue;
            };
            let parent_id = rank::ranks_above(r, false)
                .iter()
                .rev()
                .find_map(|&above| open[above as usize]);
            let author = match r {
                Rank::Subspecies => records[i].author.clone(),
                Rank::Species if records[i].subspecies.is_none() => records[i].author.clone(),
                _ => None,
            };
            let payloads = if records[i].is_most_specific(r) {
                mem::take(&mut records[i].payloads)
            } else {
                Vec::new()
            };
            let id = nodes.len() as u32 + 1;
            nodes.push(TaxonNode {
                id,
                parent_id,
                scientific_name: name,
                author,
                rank: r,
                payloads,
            });
            open[r as usize] = Some(id);
        }
    }

    debug!(nodes = nodes.len(), "assembled tree");
    nodes
}

/// Walks parent links from the newest node to its enclosing species node
/// and rewrites that node's author (absence included) and payloads.
fn backpatch_species<P>(nodes: &mut [TaxonNode<P>], author: Option<String>, payloads: Vec<P>) {
    let mut cursor = match nodes.len().checked_sub(1) {
        Some(c) => c,
        None => return,
    };
    loop {
        if nodes[cursor].rank == Rank::Species {
            debug!(
                id = nodes[cursor].id,
                name = %nodes[cursor].scientific_name,
                "attributing author and payloads to existing species node"
            );
            nodes[cursor].author = author;
            nodes[cursor].payloads.extend(payloads);
            return;
        }
        match nodes[cursor].parent_id {
            Some(parent) => cursor = parent as usize - 1,
            None => return,
        }
    }
}
