//! Tab-separated checklist ingestion.
//!
//! Reads a headered TSV checklist into [`Classification`] records whose
//! payloads are the 1-based data row numbers, so every tree node can be
//! traced back to the source rows that attested it. Column names are
//! matched case-insensitively; unknown columns are ignored.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use taxnorm_core::interpret::NameInterpreter;
use taxnorm_core::record::trim_to_none;
use taxnorm_core::{Classification, Rank};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Header names for the eight rank columns, kingdom first.
pub const RANK_COLUMNS: [&str; 8] = [
    "kingdom",
    "phylum",
    "class",
    "order",
    "family",
    "genus",
    "species",
    "subspecies",
];

pub const AUTHOR_COLUMN: &str = "author";
pub const SCIENTIFIC_NAME_COLUMN: &str = "scientificname";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input has no header row")]
    MissingHeader,
    #[error("no recognized columns in header: {header}")]
    NoKnownColumns { header: String },
}

/// A parsed tab-separated table. Cells are trimmed, blank cells absent.
#[derive(Debug, Clone)]
pub struct TsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl TsvTable {
    /// Parses a complete TSV document. The first non-blank line is the
    /// header; rows shorter than the header are padded with absent cells,
    /// longer rows are truncated with a warning.
    pub fn parse(input: &str) -> Result<TsvTable, IngestError> {
        let mut lines = input.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        let (_, header_line) = lines.next().ok_or(IngestError::MissingHeader)?;
        let headers: Vec<String> = header_line
            .split('\t')
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let mut cells: Vec<Option<String>> =
                line.split('\t').map(trim_to_none).collect();
            if cells.len() > headers.len() {
                warn!(
                    line = line_no + 1,
                    cells = cells.len(),
                    columns = headers.len(),
                    "row has more cells than the header; extra cells dropped"
                );
                cells.truncate(headers.len());
            }
            cells.resize(headers.len(), None);
            rows.push(cells);
        }
        debug!(columns = headers.len(), rows = rows.len(), "parsed table");
        Ok(TsvTable { headers, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    fn cell(&self, row: usize, column: Option<usize>) -> Option<&str> {
        column.and_then(|c| self.rows[row][c].as_deref())
    }
}

/// Builds classification records from a parsed table, one per data row,
/// with the 1-based row number as the payload.
///
/// When an interpreter is supplied and the table has a `scientificName`
/// column, a parsed infraspecific name replaces the subspecies and a
/// parsed binomial replaces the species, the parsed authorship filling a
/// blank author either way. Unparsable names leave the row's rank
/// columns as they were.
pub fn build_records<I: NameInterpreter>(
    table: &TsvTable,
    interpreter: Option<&I>,
) -> Result<Vec<Classification<u32>>, IngestError> {
    let rank_columns: [Option<usize>; 8] =
        std::array::from_fn(|i| table.column(RANK_COLUMNS[i]));
    let author_column = table.column(AUTHOR_COLUMN);
    let name_column = table.column(SCIENTIFIC_NAME_COLUMN);
    if rank_columns.iter().all(Option::is_none) && author_column.is_none() && name_column.is_none()
    {
        return Err(IngestError::NoKnownColumns {
            header: table.headers.join("\t"),
        });
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for row in 0..table.rows.len() {
        let mut record: Classification<u32> = Classification::new();
        for (i, rank) in taxnorm_core::rank::ALL.into_iter().enumerate() {
            record.set(rank, table.cell(row, rank_columns[i]).map(str::to_string));
        }
        record.author = table.cell(row, author_column).and_then(trim_to_none);

        if let (Some(interpreter), Some(name)) = (interpreter, table.cell(row, name_column)) {
            apply_interpretation(&mut record, name, interpreter);
        }

        record.payloads.push(row as u32 + 1);
        records.push(record);
    }
    info!(records = records.len(), "built classification records");
    Ok(records)
}

/// Folds a parsed scientific name into the record.
fn apply_interpretation<P, I: NameInterpreter>(
    record: &mut Classification<P>,
    name: &str,
    interpreter: &I,
) {
    let parsed = match interpreter.interpret(name) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(%err, "scientific name ignored");
            return;
        }
    };
    if parsed.infraspecific_epithet.is_some() {
        record.set(Rank::Subspecies, Some(parsed.full_name));
        record.set(Rank::Species, None);
    } else if parsed.is_binomial {
        record.set(Rank::Species, Some(parsed.full_name));
        record.set(Rank::Subspecies, None);
    } else {
        // a lone uninomial cannot be placed at a definite rank
        debug!(name, "uninomial scientific name ignored");
        return;
    }
    if record.author.is_none() {
        record.author = parsed.authorship;
    }
}

/// Reads and parses a TSV checklist file.
pub fn read_table(path: &Path) -> Result<TsvTable> {
    let input = fs::read_to_string(path)
        .with_context(|| format!("reading checklist {}", path.display()))?;
    let table = TsvTable::parse(&input)
        .with_context(|| format!("parsing checklist {}", path.display()))?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxnorm_core::interpret::NoInterpretation;

    const SIMPLE: &str = "kingdom\tgenus\tspecies\tauthor\n\
                          Animalia\tAus\tAus bus\tL. 1758\n\
                          Animalia\tAus\t\t\n";

    #[test]
    fn rows_become_records_with_row_number_payloads() {
        let table = TsvTable::parse(SIMPLE).unwrap();
        let records = build_records::<NoInterpretation>(&table, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kingdom.as_deref(), Some("Animalia"));
        assert_eq!(records[0].species.as_deref(), Some("Aus bus"));
        assert_eq!(records[0].author.as_deref(), Some("L. 1758"));
        assert_eq!(records[0].payloads, vec![1]);
        assert_eq!(records[1].species, None);
        assert_eq!(records[1].payloads, vec![2]);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let input = "kingdom\tgenus\nAnimalia\nPlantae\tPus\textra\n";
        let table = TsvTable::parse(input).unwrap();
        let records = build_records::<NoInterpretation>(&table, None).unwrap();
        assert_eq!(records[0].kingdom.as_deref(), Some("Animalia"));
        assert_eq!(records[0].genus, None);
        assert_eq!(records[1].genus.as_deref(), Some("Pus"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let input = "Kingdom\tGENUS\nAnimalia\tAus\n";
        let table = TsvTable::parse(input).unwrap();
        let records = build_records::<NoInterpretation>(&table, None).unwrap();
        assert_eq!(records[0].genus.as_deref(), Some("Aus"));
    }

    #[test]
    fn empty_input_is_a_missing_header() {
        assert!(matches!(
            TsvTable::parse(""),
            Err(IngestError::MissingHeader)
        ));
        assert!(matches!(
            TsvTable::parse("\n  \n"),
            Err(IngestError::MissingHeader)
        ));
    }

    #[test]
    fn unrecognized_headers_are_an_error() {
        let table = TsvTable::parse("foo\tbar\nx\ty\n").unwrap();
        assert!(matches!(
            build_records::<NoInterpretation>(&table, None),
            Err(IngestError::NoKnownColumns { .. })
        ));
    }

    #[test]
    fn blank_cells_are_absent() {
        let input = "kingdom\tgenus\n   \tAus\n";
        let table = TsvTable::parse(input).unwrap();
        let records = build_records::<NoInterpretation>(&table, None).unwrap();
        assert_eq!(records[0].kingdom, None);
    }

    #[test]
    fn read_table_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checklist.tsv");
        std::fs::write(&path, SIMPLE).unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(read_table(&dir.path().join("missing.tsv")).is_err());
    }

    mod interpretation {
        use super::*;
        use taxnorm_names::ScientificNameParser;

        #[test]
        fn infraspecific_names_land_in_the_subspecies_column() {
            let input = "kingdom\tscientificName\n\
                         Protista\tAchnanthes lanceolata ssp. frequentissima (Krasske) Hust.\n";
            let table = TsvTable::parse(input).unwrap();
            let records = build_records(&table, Some(&ScientificNameParser::new())).unwrap();
            assert_eq!(
                records[0].subspecies.as_deref(),
                Some("Achnanthes lanceolata ssp. frequentissima (Krasske) Hust.")
            );
            assert_eq!(records[0].species, None);
            assert_eq!(records[0].author.as_deref(), Some("(Krasske) Hust."));
        }

        #[test]
        fn binomial_names_land_in_the_species_column() {
            let input = "kingdom\tspecies\tscientificName\n\
                         Plantae\twrong\tAbies alba Mill.\n";
            let table = TsvTable::parse(input).unwrap();
            let records = build_records(&table, Some(&ScientificNameParser::new())).unwrap();
            assert_eq!(records[0].species.as_deref(), Some("Abies alba Mill."));
            assert_eq!(records[0].subspecies, None);
            assert_eq!(records[0].author.as_deref(), Some("Mill."));
        }

        #[test]
        fn unparsable_and_uninomial_names_change_nothing() {
            let input = "kingdom\tspecies\tscientificName\n\
                         Plantae\tAbies alba\t×weird ×name\n\
                         Plantae\tAbies alba\tAbies\n";
            let table = TsvTable::parse(input).unwrap();
            let records = build_records(&table, Some(&ScientificNameParser::new())).unwrap();
            assert_eq!(records[0].species.as_deref(), Some("Abies alba"));
            assert_eq!(records[1].species.as_deref(), Some("Abies alba"));
        }

        #[test]
        fn an_explicit_author_wins_over_parsed_authorship() {
            let input = "author\tscientificName\nL. 1758\tAbies alba Mill.\n";
            let table = TsvTable::parse(input).unwrap();
            let records = build_records(&table, Some(&ScientificNameParser::new())).unwrap();
            assert_eq!(records[0].author.as_deref(), Some("L. 1758"));
        }
    }
}
