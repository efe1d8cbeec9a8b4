//! taxnorm CLI
//!
//! Normalizes denormalized taxonomic checklists:
//! - `normalize`: TSV checklist in, parent-linked taxon table out
//! - `parse-name`: show how a single scientific name is interpreted

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use taxnorm_core::interpret::NameInterpreter;
use taxnorm_core::normalizer::normalize;
use taxnorm_core::TaxonNode;
use taxnorm_ingest::{build_records, read_table};
use taxnorm_names::ScientificNameParser;

#[derive(Parser)]
#[command(name = "taxnorm")]
#[command(author, version, about = "Taxonomic checklist normalizer")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a tab-separated checklist into a parent-linked taxon table.
    Normalize {
        /// TSV checklist with a header row (kingdom..subspecies, author,
        /// optionally scientificName)
        input: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Fill species/subspecies from a scientificName column
        #[arg(long)]
        interpret_scientific_name: bool,

        /// Emit the taxon table as JSON instead of pipe-delimited lines
        #[arg(long)]
        json: bool,
    },

    /// Parse one scientific name and print its components.
    ParseName {
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Normalize {
            input,
            out,
            interpret_scientific_name,
            json,
        } => run_normalize(input, out, interpret_scientific_name, json),
        Commands::ParseName { name } => run_parse_name(&name),
    }
}

fn run_normalize(
    input: PathBuf,
    out: Option<PathBuf>,
    interpret_scientific_name: bool,
    json: bool,
) -> Result<()> {
    let started = Instant::now();
    let table = read_table(&input)?;
    let parser = ScientificNameParser::new();
    let interpreter = interpret_scientific_name.then_some(&parser);
    let mut records = build_records(&table, interpreter)
        .with_context(|| format!("ingesting {}", input.display()))?;
    let record_count = records.len();

    let nodes = normalize(&mut records, &parser);

    match &out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_nodes(BufWriter::new(file), &nodes, json)?;
        }
        None => write_nodes(io::stdout().lock(), &nodes, json)?,
    }

    eprintln!(
        "{} {} records into {} taxa in {:.2?}",
        "normalized".green().bold(),
        record_count,
        nodes.len(),
        started.elapsed()
    );
    if let Some(path) = out {
        eprintln!("{} {}", "wrote".green().bold(), path.display());
    }
    Ok(())
}

/// One line per node: `id|parentId|rank|scientificName|author|`, absent
/// fields left blank.
fn write_nodes<W: Write>(mut writer: W, nodes: &[TaxonNode<u32>], json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut writer, nodes).context("serializing taxon table")?;
        writeln!(writer)?;
    } else {
        for node in nodes {
            writeln!(
                writer,
                "{}|{}|{}|{}|{}|",
                node.id,
                node.parent_id.map(|p| p.to_string()).unwrap_or_default(),
                node.rank.code(),
                node.scientific_name,
                node.author.as_deref().unwrap_or_default(),
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn run_parse_name(name: &str) -> Result<()> {
    match ScientificNameParser::new().interpret(name) {
        Ok(parsed) => {
            println!("{} {}", "parsed".green().bold(), parsed.full_name.bold());
            let fields = [
                ("genus or above", parsed.genus_or_above),
                ("specific epithet", parsed.specific_epithet),
                ("infraspecific epithet", parsed.infraspecific_epithet),
                ("authorship", parsed.authorship),
            ];
            for (label, value) in fields {
                println!("  {label}: {}", value.as_deref().unwrap_or("-"));
            }
            println!("  binomial: {}", parsed.is_binomial);
        }
        Err(err) => {
            eprintln!("{} {}", "unparsable".red().bold(), err);
            std::process::exit(1);
        }
    }
    Ok(())
}
