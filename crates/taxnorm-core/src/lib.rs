//! taxnorm-core: reconciling denormalized taxonomic classifications
//!
//! Input records independently list values for some subset of the eight
//! Linnean ranks (kingdom..subspecies) plus authorship, and may leave any
//! slot blank. This crate fills gaps where the evidence is unambiguous,
//! refuses where it is not (tracking homonyms so a shared name never
//! falsely unifies unrelated taxa), collapses records that turn out to be
//! identical, and assembles the survivors into a parent-linked tree with
//! one node per distinct taxon at its most specific attested rank.
//!
//! Scientific-name parsing is deliberately *not* part of this crate: the
//! two gap-filling passes that need it consume the [`interpret::NameInterpreter`]
//! trait, so callers decide which parser (if any) to plug in.

pub mod compare;
pub mod interpret;
pub mod normalizer;
pub mod rank;
pub mod record;
pub mod tree;

pub use rank::Rank;
pub use record::Classification;
pub use tree::TaxonNode;
