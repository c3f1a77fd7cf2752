//! A binary that classifies each alignment in a SAM file against a GFF3
//! annotation.
//!
//! ```shell
//! cargo run --release --bin=classify-reads --features=binaries -- \
//!     annotation.gff3.gz alignments.sam -o classifications.tsv
//! ```
//!
//! For every mapped alignment, a line is written with the read name, the
//! aligned interval, the read category, and the exon, intron, and combo hit
//! counts. Reads that cannot be classified are written with the category
//! `out-of-range` or `unannotated` and `.` for each count. Once all
//! alignments are processed, a summary of the categories per reference
//! sequence and the number of multi-mapped reads is printed to standard
//! error.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use flate2::read::GzDecoder;
use noodles::sam;
use regionmap::annotation::Annotation;
use regionmap::annotation::Builder;
use regionmap::classify;
use regionmap::classify::Cache;
use regionmap::classify::Category;
use tabled::settings::object::Rows;
use tabled::settings::Alignment;
use tabled::settings::Style;
use tracing::debug;
use tracing::info;
use tracing::warn;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

/// The file extension for gzipped annotations.
const GZIP_EXTENSION: &str = "gz";

/// The header line of the output.
const OUTPUT_HEADER: &str = "read\treference\tstart\tend\tcategory\texons\tintrons\tcombos";

/// The category written for reads that extend past the end of their reference.
const OUT_OF_RANGE: &str = "out-of-range";

/// The category written for reads on a reference absent from the annotation.
const UNANNOTATED: &str = "unannotated";

/// The category written for reads with an invalid aligned interval.
const INVALID: &str = "invalid";

/// The placeholder for counts that do not apply.
const MISSING: &str = ".";

////////////////////////////////////////////////////////////////////////////////////////
// Tallies
////////////////////////////////////////////////////////////////////////////////////////

/// The number of reads per category for a reference sequence.
#[derive(Debug, Default)]
struct Tally {
    /// The reads per category.
    categories: BTreeMap<Category, usize>,

    /// The reads that extended past the end of the reference sequence.
    out_of_range: usize,

    /// The reads on a reference sequence absent from the annotation.
    unannotated: usize,
}

impl Tally {
    /// Adds the result of a classification to the tally.
    fn add(&mut self, result: &std::result::Result<classify::Classification, classify::Error>) {
        match result {
            Ok(classification) => {
                *self.categories.entry(classification.category()).or_default() += 1
            }
            Err(classify::Error::OutOfRange { .. }) => self.out_of_range += 1,
            Err(classify::Error::UnknownReference(_)) => self.unannotated += 1,
            Err(classify::Error::InvalidInterval(_)) => {}
        }
    }

    /// Gets the number of reads in a category.
    fn get(&self, category: Category) -> usize {
        self.categories.get(&category).copied().unwrap_or_default()
    }
}

/// Renders the per-reference tallies as a table.
fn summarize(tallies: &BTreeMap<String, Tally>) -> String {
    let mut builder = tabled::builder::Builder::default();

    let mut header = vec![String::from("Reference")];
    header.extend(Category::ALL.iter().map(|c| c.to_string()));
    header.push(String::from(OUT_OF_RANGE));
    header.push(String::from(UNANNOTATED));
    builder.push_record(header);

    for (name, tally) in tallies {
        let mut row = vec![name.clone()];
        row.extend(Category::ALL.iter().map(|c| tally.get(*c).to_string()));
        row.push(tally.out_of_range.to_string());
        row.push(tally.unannotated.to_string());
        builder.push_record(row);
    }

    builder
        .build()
        .with(Style::rounded())
        .modify(Rows::new(1..), Alignment::left())
        .to_string()
}

/// The number of alignments seen for each read name.
#[derive(Debug, Default)]
struct Alignments(HashMap<String, usize>);

impl Alignments {
    /// Counts one alignment for a read.
    fn add(&mut self, name: &str) {
        match self.0.get_mut(name) {
            Some(count) => *count += 1,
            None => {
                self.0.insert(name.to_string(), 1);
            }
        }
    }

    /// Gets the number of distinct reads.
    fn reads(&self) -> usize {
        self.0.len()
    }

    /// Gets the number of reads with more than one alignment.
    fn multi_mapped(&self) -> usize {
        self.0.values().filter(|&&count| count > 1).count()
    }

    /// Gets the greatest number of alignments for a single read.
    fn max(&self) -> usize {
        self.0.values().copied().max().unwrap_or_default()
    }
}

/// Formats a classification result as the fields following the aligned
/// interval in an output line.
fn format_result(
    result: &std::result::Result<classify::Classification, classify::Error>,
) -> String {
    match result {
        Ok(classification) => {
            let counts = classification.counts();
            format!(
                "{}\t{}\t{}\t{}",
                classification.category(),
                counts.exons(),
                counts.introns(),
                counts.combos()
            )
        }
        Err(err) => {
            let category = match err {
                classify::Error::OutOfRange { .. } => OUT_OF_RANGE,
                classify::Error::UnknownReference(_) => UNANNOTATED,
                classify::Error::InvalidInterval(_) => INVALID,
            };

            format!("{category}\t{MISSING}\t{MISSING}\t{MISSING}")
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Inputs and outputs
////////////////////////////////////////////////////////////////////////////////////////

/// Opens an annotation file, decompressing it if it ends in `.gz`.
fn open_annotation(path: &Path) -> Result<regionmap::Reader<Box<dyn BufRead>>> {
    let file = File::open(path)
        .with_context(|| format!("opening annotation file: {}", path.display()))?;

    let inner: Box<dyn BufRead> =
        if path.extension().and_then(|ext| ext.to_str()) == Some(GZIP_EXTENSION) {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

    Ok(regionmap::Reader::new(inner))
}

/// Opens the output destination, defaulting to standard output.
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating output file: {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Classifies read alignments as exonic, intronic, combo, or intergenic.
#[derive(Parser)]
struct Args {
    /// The GFF3 annotation (optionally gzipped).
    annotation: PathBuf,

    /// The SAM alignments.
    alignments: PathBuf,

    /// The file to write per-read classifications to (defaults to standard
    /// output).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// A feature kind to attach to genes. May be given more than once.
    #[arg(short, long = "feature", default_values_t = [String::from("exon")])]
    features: Vec<String>,

    /// Whether or not to skip secondary and supplementary alignments.
    #[arg(long, default_value_t = false)]
    primary_only: bool,

    /// The number of classification results to keep cached.
    #[arg(long, default_value_t = classify::cache::DEFAULT_CAPACITY)]
    cache_size: usize,

    #[command(flatten)]
    verbose: Verbosity,
}

/// Loads the annotation and reports how it went.
fn load(args: &Args) -> Result<Annotation> {
    let reader = open_annotation(&args.annotation)?;

    let loaded = Builder::default()
        .feature_kinds(args.features.iter().cloned())
        .try_build_from(reader)
        .with_context(|| format!("reading annotation: {}", args.annotation.display()))?;

    let (annotation, warnings) = loaded.into_parts();

    info!(
        "loaded annotation for {} reference sequence(s) with {} warning(s)",
        annotation.len(),
        warnings.len()
    );

    if annotation.is_empty() {
        warn!("the annotation contains no reference sequences");
    }

    Ok(annotation)
}

fn run(args: &Args) -> Result<()> {
    let annotation = load(args)?;
    let mut cache = Cache::with_capacity(args.cache_size);

    let mut reader = File::open(&args.alignments)
        .map(BufReader::new)
        .map(sam::io::Reader::new)
        .with_context(|| format!("opening alignments: {}", args.alignments.display()))?;

    let header = reader.read_header().context("reading SAM header")?;

    let mut output = open_output(args.output.as_deref())?;
    writeln!(output, "{OUTPUT_HEADER}")?;

    let mut tallies = BTreeMap::<String, Tally>::new();
    let mut alignments = Alignments::default();
    let mut skipped = 0usize;

    for (i, result) in reader.record_bufs(&header).enumerate() {
        let record = result.with_context(|| format!("reading alignment record {}", i + 1))?;
        let flags = record.flags();

        if flags.is_unmapped() {
            skipped += 1;
            continue;
        }

        if args.primary_only && (flags.is_secondary() || flags.is_supplementary()) {
            skipped += 1;
            continue;
        }

        let (reference, start, end) = match (
            record
                .reference_sequence_id()
                .and_then(|id| header.reference_sequences().get_index(id)),
            record.alignment_start(),
            record.alignment_end(),
        ) {
            (Some((name, _)), Some(start), Some(end)) => (
                name.to_string(),
                usize::from(start) as u64,
                usize::from(end) as u64,
            ),
            _ => {
                debug!("alignment record {} has no aligned interval", i + 1);
                skipped += 1;
                continue;
            }
        };

        let name = record
            .name()
            .map(|name| name.to_string())
            .unwrap_or_else(|| String::from("*"));

        let result = cache.get_or_classify(&annotation, &reference, start, end);

        if let Err(err) = &result {
            debug!("{name}: {err}");
        }

        writeln!(
            output,
            "{name}\t{reference}\t{start}\t{end}\t{}",
            format_result(&result)
        )?;

        alignments.add(&name);
        tallies.entry(reference).or_default().add(&result);
    }

    output.flush().context("flushing output")?;

    info!(
        "classified with {} cache hit(s) and {} miss(es); skipped {} alignment(s)",
        cache.hits(),
        cache.misses(),
        skipped
    );

    info!(
        "{} read(s) classified, {} with multiple alignments (at most {} for one read)",
        alignments.reads(),
        alignments.multi_mapped(),
        alignments.max()
    );

    eprintln!("{}", summarize(&tallies));
    eprintln!(
        "reads: {}, multi-mapped reads: {}",
        alignments.reads(),
        alignments.multi_mapped()
    );

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .with_writer(io::stderr)
            .init(),
    };

    run(&args)
}
