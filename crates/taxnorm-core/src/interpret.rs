//! The name-interpretation seam, and the two gap-filling passes built on it.
//!
//! The engine never parses scientific names itself; it consumes whatever
//! implementation of [`NameInterpreter`] the caller plugs in. A failed
//! parse means "no inference possible" and is never surfaced as an error.

use crate::rank::{self, Rank};
use crate::record::Classification;
use thiserror::Error;
use tracing::debug;

/// A scientific name the interpreter could not make sense of.
#[derive(Debug, Clone, Error)]
#[error("unparsable scientific name: {name}")]
pub struct UnparsableName {
    pub name: String,
}

/// The components of an interpreted scientific name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretedName {
    /// Leading uninomial: a genus, or a higher taxon misplaced in a name field.
    pub genus_or_above: Option<String>,
    pub specific_epithet: Option<String>,
    pub infraspecific_epithet: Option<String>,
    /// Complete authorship string, e.g. `(Krasske) Hust.`.
    pub authorship: Option<String>,
    /// The reassembled name, authorship included.
    pub full_name: String,
    /// True for a plain binomial with no infraspecific epithet.
    pub is_binomial: bool,
}

/// Parses free-text scientific names into their components.
pub trait NameInterpreter {
    fn interpret(&self, name: &str) -> Result<InterpretedName, UnparsableName>;
}

/// An interpreter that never parses anything, turning the gap-filling
/// passes into no-ops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterpretation;

impl NameInterpreter for NoInterpretation {
    fn interpret(&self, name: &str) -> Result<InterpretedName, UnparsableName> {
        Err(UnparsableName {
            name: name.to_string(),
        })
    }
}

/// Infers missing species binomials from subspecies names.
///
/// A record with a subspecies but no species gets the binomial rebuilt
/// from the subspecies text, unless either epithet repeats one of the
/// record's values at or above family (which would mean the "subspecies"
/// is really a stray higher-taxon name).
pub fn infer_species<P, I: NameInterpreter>(records: &mut [Classification<P>], names: &I) {
    debug!(classifications = records.len(), "inferring species");
    for record in records.iter_mut() {
        let Some(subspecies) = record.subspecies.clone() else {
            continue;
        };
        if record.species.is_some() {
            continue;
        }
        let Ok(parsed) = names.interpret(&subspecies) else {
            continue;
        };
        let (Some(genus), Some(epithet)) = (parsed.genus_or_above, parsed.specific_epithet) else {
            continue;
        };
        let duplicated = rank::ranks_above(Rank::Family, true).iter().any(|&r| {
            record.get(r).is_some_and(|v| {
                v.eq_ignore_ascii_case(&genus) || v.eq_ignore_ascii_case(&epithet)
            })
        });
        if !duplicated {
            record.species = Some(format!("{genus} {epithet}"));
        }
    }
}

/// Infers missing genera from species binomials.
///
/// The leading epithet of the species is adopted as the genus unless it
/// case-insensitively matches one of the record's higher ranks, which
/// guards against mistaking a repeated higher-taxon name for a genus.
pub fn infer_genera<P, I: NameInterpreter>(records: &mut [Classification<P>], names: &I) {
    debug!(classifications = records.len(), "inferring genera");
    for record in records.iter_mut() {
        let Some(species) = record.species.clone() else {
            continue;
        };
        if record.genus.is_some() {
            continue;
        }
        let Ok(parsed) = names.interpret(&species) else {
            continue;
        };
        let Some(tentative) = parsed.genus_or_above else {
            continue;
        };
        let shadows_higher_taxon = rank::ranks_above(Rank::Genus, false)
            .iter()
            .any(|&r| record.get(r).is_some_and(|v| v.eq_ignore_ascii_case(&tentative)));
        if !shadows_higher_taxon {
            record.genus = Some(tentative);
        }
    }
}
