//! A builder for an [`Annotation`].
//!
//! Loading happens in two phases. While the records are streamed in, genes
//! are collected, the extent of each reference sequence is tracked, and
//! features are queued along with their declared parents. Once the stream is
//! exhausted, every queued feature is attached to its owning gene(s), each
//! gene's features are sorted once, and each reference's genes are sorted.
//! Because features are only attached after every gene has been seen, a
//! feature may precede its gene in the stream.
//!
//! Problems with individual records never abort a load. Instead, they are
//! collected as [`Warning`]s and returned alongside the annotation.

use std::collections::HashMap;
use std::collections::HashSet;
use std::io;
use std::io::BufRead;

use tracing::debug;
use tracing::warn;

use crate::annotation::Annotation;
use crate::annotation::Feature;
use crate::annotation::Gene;
use crate::annotation::Reference;
use crate::core::Interval;
use crate::core::Position;
use crate::line::Directive;
use crate::reader;
use crate::record::Record;
use crate::Line;
use crate::Reader;

/// The default feature kind for genes.
pub const DEFAULT_GENE_KIND: &str = "gene";

/// The default feature kind for records that declare a reference's length.
pub const DEFAULT_REGION_KIND: &str = "region";

/// The default feature kind attached to genes.
pub const DEFAULT_FEATURE_KIND: &str = "exon";

/// The default attribute key for record identifiers.
pub const DEFAULT_ID_KEY: &str = "ID";

/// The default attribute key for parent identifiers.
pub const DEFAULT_PARENT_KEY: &str = "Parent";

////////////////////////////////////////////////////////////////////////////////////////
// Errors and warnings
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to building an [`Annotation`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error while reading the annotation.
    Io(io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

/// A recoverable problem encountered while loading an annotation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Warning {
    /// A record that could not be used. The record was skipped.
    MalformedRecord {
        /// The line number of the record.
        line_no: usize,

        /// Why the record could not be used.
        reason: String,
    },

    /// A feature whose parent(s) did not resolve to a known gene. The feature
    /// was dropped.
    OrphanFeature {
        /// The line number of the feature record.
        line_no: usize,

        /// The name of the reference sequence.
        reference: String,

        /// The declared parent identifier(s).
        parent: String,
    },

    /// A gene whose identifier was already used on the same reference
    /// sequence. The first definition was kept.
    DuplicateGene {
        /// The line number of the duplicate gene record.
        line_no: usize,

        /// The name of the reference sequence.
        reference: String,

        /// The gene identifier.
        id: String,
    },
}

impl Warning {
    /// Gets the line number the warning refers to.
    pub fn line_no(&self) -> usize {
        match self {
            Warning::MalformedRecord { line_no, .. } => *line_no,
            Warning::OrphanFeature { line_no, .. } => *line_no,
            Warning::DuplicateGene { line_no, .. } => *line_no,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MalformedRecord { line_no, reason } => {
                write!(f, "malformed record at line {line_no}: {reason}")
            }
            Warning::OrphanFeature {
                line_no,
                reference,
                parent,
            } => write!(
                f,
                "orphan feature at line {line_no}: parent `{parent}` is not a known gene on \
                 `{reference}`"
            ),
            Warning::DuplicateGene {
                line_no,
                reference,
                id,
            } => write!(
                f,
                "duplicate gene at line {line_no}: `{id}` is already defined on `{reference}`"
            ),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Loaded
////////////////////////////////////////////////////////////////////////////////////////

/// A loaded [`Annotation`] along with the warnings raised while loading it.
#[derive(Debug)]
pub struct Loaded {
    /// The annotation.
    annotation: Annotation,

    /// The warnings, in line order.
    warnings: Vec<Warning>,
}

impl Loaded {
    /// Gets the annotation.
    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    /// Gets the warnings in line order.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Consumes self and returns the annotation and the warnings.
    pub fn into_parts(self) -> (Annotation, Vec<Warning>) {
        (self.annotation, self.warnings)
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Builder
////////////////////////////////////////////////////////////////////////////////////////

/// A builder for an [`Annotation`].
#[derive(Clone, Debug)]
pub struct Builder {
    /// The feature kinds that are attached to genes.
    feature_kinds: Vec<String>,

    /// The feature kind for genes.
    gene_kind: String,

    /// The feature kind for records declaring a reference's length.
    region_kind: String,

    /// The attribute key for identifiers.
    id_key: String,

    /// The attribute key for parent identifiers.
    parent_key: String,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            feature_kinds: vec![DEFAULT_FEATURE_KIND.to_string()],
            gene_kind: DEFAULT_GENE_KIND.to_string(),
            region_kind: DEFAULT_REGION_KIND.to_string(),
            id_key: DEFAULT_ID_KEY.to_string(),
            parent_key: DEFAULT_PARENT_KEY.to_string(),
        }
    }
}

impl Builder {
    /// Sets the feature kinds that are attached to genes (`exon` by default).
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::annotation::Builder;
    ///
    /// let builder = Builder::default().feature_kinds(["exon", "CDS"]);
    /// ```
    pub fn feature_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the feature kind for genes (`gene` by default).
    pub fn gene_kind(mut self, kind: impl Into<String>) -> Self {
        self.gene_kind = kind.into();
        self
    }

    /// Sets the feature kind for records declaring the length of a reference
    /// sequence (`region` by default).
    pub fn region_kind(mut self, kind: impl Into<String>) -> Self {
        self.region_kind = kind.into();
        self
    }

    /// Sets the attribute key for identifiers (`ID` by default).
    pub fn id_key(mut self, key: impl Into<String>) -> Self {
        self.id_key = key.into();
        self
    }

    /// Sets the attribute key for parent identifiers (`Parent` by default).
    pub fn parent_key(mut self, key: impl Into<String>) -> Self {
        self.parent_key = key.into();
        self
    }

    /// Builds an [`Annotation`] from a sequence of records.
    ///
    /// Warnings refer to records by their 1-based position in `records`.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::annotation::Builder;
    /// use regionmap::core::Strand;
    /// use regionmap::record::Record;
    ///
    /// let records = vec![
    ///     Record::new("chr1", "region", 1, 10000, Strand::Positive, "ID=chr1"),
    ///     Record::new("chr1", "gene", 1000, 2000, Strand::Positive, "ID=A"),
    ///     Record::new("chr1", "exon", 1000, 1200, Strand::Positive, "Parent=A"),
    ///     Record::new("chr1", "exon", 1800, 2000, Strand::Positive, "Parent=B"),
    /// ];
    ///
    /// let loaded = Builder::default().build_from_records(records);
    /// let reference = loaded.annotation().get("chr1").unwrap();
    ///
    /// assert_eq!(reference.length(), 10000);
    /// assert_eq!(reference.gene("A").unwrap().features().len(), 1);
    /// assert_eq!(loaded.warnings().len(), 1);
    /// assert_eq!(loaded.warnings()[0].line_no(), 4);
    /// ```
    pub fn build_from_records<I>(&self, records: I) -> Loaded
    where
        I: IntoIterator<Item = Record>,
    {
        let mut state = State::default();

        for (i, record) in records.into_iter().enumerate() {
            self.collect(&mut state, i + 1, record);
        }

        self.finish(state)
    }

    /// Attempts to build an [`Annotation`] by reading GFF3 lines from a
    /// [`Reader`].
    ///
    /// Lines that cannot be parsed are reported as
    /// [`Warning::MalformedRecord`]s. Only I/O errors abort the build.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"##gff-version 3
    /// ##sequence-region chr1 1 10000
    /// chr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A
    /// chr1\t.\tmRNA\t1000\t2000\t.\t+\t.\tID=A.1;Parent=A
    /// chr1\t.\texon\t1000\t1200\t.\t+\t.\tParent=A.1
    /// chr1\t.\texon\t1800\t2000\t.\t+\t.\tParent=A.1
    /// ";
    /// let reader = regionmap::Reader::new(&data[..]);
    /// let loaded = regionmap::annotation::Builder::default().try_build_from(reader)?;
    ///
    /// let reference = loaded.annotation().get("chr1").unwrap();
    /// assert_eq!(reference.length(), 10000);
    /// assert_eq!(reference.gene("A").unwrap().features().len(), 2);
    /// assert!(loaded.warnings().is_empty());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_build_from<T>(&self, mut reader: Reader<T>) -> Result<Loaded>
    where
        T: BufRead,
    {
        let mut state = State::default();

        for (line_no, result) in reader.numbered_lines() {
            match result {
                Ok(Line::Record(record)) => self.collect(&mut state, line_no, record),
                Ok(Line::Directive(Directive::SequenceRegion { reference, end, .. })) => {
                    state.pending(&reference).declare_length(end);
                }
                Ok(_) => {}
                Err(reader::Error::Io(err)) => return Err(Error::Io(err)),
                Err(reader::Error::Line(err)) => state.warnings.push(Warning::MalformedRecord {
                    line_no,
                    reason: err.to_string(),
                }),
            }
        }

        Ok(self.finish(state))
    }

    /// Collects a single record into the in-progress state.
    fn collect(&self, state: &mut State, line_no: usize, record: Record) {
        let interval = match Interval::try_new(record.start(), record.end()) {
            Ok(interval) => interval,
            Err(err) => {
                state.warnings.push(Warning::MalformedRecord {
                    line_no,
                    reason: err.to_string(),
                });
                return;
            }
        };

        let kind = record.kind();

        if kind == self.region_kind {
            state.pending(record.reference()).declare_length(interval.end());
        } else if kind == self.gene_kind {
            let id = match record.attribute(&self.id_key) {
                Some(id) => id.to_string(),
                None => {
                    state.warnings.push(Warning::MalformedRecord {
                        line_no,
                        reason: format!("{kind} record has no `{}` attribute", self.id_key),
                    });
                    return;
                }
            };

            state.pending(record.reference()).observe(interval.end());

            if state.pending(record.reference()).by_id.contains_key(&id) {
                state.warnings.push(Warning::DuplicateGene {
                    line_no,
                    reference: record.reference().to_string(),
                    id,
                });
                return;
            }

            let pending = state.pending(record.reference());
            pending.by_id.insert(id.clone(), pending.genes.len());
            pending
                .genes
                .push(Gene::new(id, interval, record.strand()));
        } else if self.feature_kinds.iter().any(|k| k == kind) {
            let parents = record
                .attribute_values(&self.parent_key)
                .map(String::from)
                .collect::<Vec<_>>();

            if parents.is_empty() {
                state.warnings.push(Warning::MalformedRecord {
                    line_no,
                    reason: format!("{kind} record has no `{}` attribute", self.parent_key),
                });
                return;
            }

            let pending = state.pending(record.reference());
            pending.observe(interval.end());
            pending.features.push(PendingFeature {
                line_no,
                parents,
                feature: Feature::new(kind, interval, record.strand()),
            });
        } else {
            let pending = state.pending(record.reference());
            pending.observe(interval.end());

            // Intermediate records (e.g., transcripts) link features to genes.
            if let Some(id) = record.attribute(&self.id_key) {
                let parents = record
                    .attribute_values(&self.parent_key)
                    .map(String::from)
                    .collect::<Vec<_>>();

                if !parents.is_empty() {
                    pending.links.insert(id.to_string(), parents);
                }
            }
        }
    }

    /// Attaches the queued features, sorts everything, and assembles the
    /// [`Annotation`].
    fn finish(&self, state: State) -> Loaded {
        let State {
            references,
            mut warnings,
        } = state;

        let mut built = HashMap::with_capacity(references.len());

        for (name, pending) in references {
            let reference = pending.freeze(&name, &mut warnings);

            debug!(
                "loaded reference `{}`: {} genes, length {}",
                reference.name(),
                reference.genes().len(),
                reference.length()
            );

            built.insert(name, reference);
        }

        warnings.sort_by_key(Warning::line_no);

        for warning in &warnings {
            warn!("{warning}");
        }

        Loaded {
            annotation: Annotation::new(built),
            warnings,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// In-progress state
////////////////////////////////////////////////////////////////////////////////////////

/// The in-progress state of a load.
#[derive(Debug, Default)]
struct State {
    /// The in-progress references keyed by name.
    references: HashMap<String, PendingReference>,

    /// The warnings raised so far.
    warnings: Vec<Warning>,
}

impl State {
    /// Gets the in-progress reference with the given name, creating it if
    /// needed.
    fn pending(&mut self, name: &str) -> &mut PendingReference {
        self.references.entry(name.to_string()).or_default()
    }
}

/// A feature waiting to be attached to its gene(s).
#[derive(Debug)]
struct PendingFeature {
    /// The line number of the feature record.
    line_no: usize,

    /// The declared parent identifiers.
    parents: Vec<String>,

    /// The feature.
    feature: Feature,
}

/// A reference sequence that is still being loaded.
#[derive(Debug, Default)]
struct PendingReference {
    /// The length declared by a region record or directive.
    declared_length: Option<Position>,

    /// The greatest end position seen on the reference.
    inferred_length: Position,

    /// The genes in the order they were seen.
    genes: Vec<Gene>,

    /// The index of each gene within `genes` keyed by gene identifier.
    by_id: HashMap<String, usize>,

    /// The parents of intermediate records keyed by their identifier.
    links: HashMap<String, Vec<String>>,

    /// The features waiting to be attached.
    features: Vec<PendingFeature>,
}

impl PendingReference {
    /// Records a declared length for the reference.
    fn declare_length(&mut self, length: Position) {
        self.declared_length = Some(self.declared_length.map_or(length, |l| l.max(length)));
        self.observe(length);
    }

    /// Records an end position seen on the reference.
    fn observe(&mut self, end: Position) {
        self.inferred_length = self.inferred_length.max(end);
    }

    /// Resolves the declared parents of a feature to the indices of the
    /// genes that own it.
    ///
    /// Parents that are not genes are followed through the intermediate
    /// links. Each identifier is visited at most once, so cyclic links
    /// terminate.
    fn resolve(&self, parents: &[String]) -> Vec<usize> {
        let mut genes = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = parents.iter().map(String::as_str).collect::<Vec<_>>();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }

            if let Some(&i) = self.by_id.get(id) {
                if !genes.contains(&i) {
                    genes.push(i);
                }
            } else if let Some(up) = self.links.get(id) {
                stack.extend(up.iter().map(String::as_str));
            }
        }

        genes
    }

    /// Attaches the features, sorts the genes and their features, and turns
    /// self into a [`Reference`].
    fn freeze(mut self, name: &str, warnings: &mut Vec<Warning>) -> Reference {
        let features = std::mem::take(&mut self.features);

        for pending in features {
            let owners = self.resolve(&pending.parents);

            if owners.is_empty() {
                warnings.push(Warning::OrphanFeature {
                    line_no: pending.line_no,
                    reference: name.to_string(),
                    parent: pending.parents.join(","),
                });
                continue;
            }

            for i in owners {
                self.genes[i].push_feature(pending.feature.clone());
            }
        }

        for gene in &mut self.genes {
            let outside = gene.freeze();

            if outside > 0 {
                debug!(
                    "gene `{}` on `{}` has {} feature(s) extending past its interval {}",
                    gene.id(),
                    name,
                    outside,
                    gene.interval()
                );
            }
        }

        let length = self.declared_length.unwrap_or(self.inferred_length);
        Reference::new(name, length, self.genes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Strand;

    fn record(kind: &str, start: u64, end: u64, attributes: &str) -> Record {
        Record::new("chr1", kind, start, end, Strand::Positive, attributes)
    }

    #[test]
    fn test_features_attach_regardless_of_order() {
        let loaded = Builder::default().build_from_records(vec![
            record("exon", 1800, 2000, "Parent=A"),
            record("gene", 1000, 2000, "ID=A"),
            record("exon", 1000, 1200, "Parent=A"),
        ]);

        assert!(loaded.warnings().is_empty());

        let gene = loaded.annotation().get("chr1").unwrap().gene("A").unwrap();
        let starts = gene
            .features()
            .iter()
            .map(|f| f.interval().start())
            .collect::<Vec<_>>();
        assert_eq!(starts, vec![1000, 1800]);
    }

    #[test]
    fn test_orphan_feature_is_dropped_with_warning() {
        let loaded = Builder::default().build_from_records(vec![
            record("gene", 1000, 2000, "ID=A"),
            record("exon", 1000, 1200, "Parent=missing"),
        ]);

        assert_eq!(
            loaded.warnings(),
            &[Warning::OrphanFeature {
                line_no: 2,
                reference: String::from("chr1"),
                parent: String::from("missing"),
            }]
        );
        assert_eq!(
            loaded.warnings()[0].to_string(),
            "orphan feature at line 2: parent `missing` is not a known gene on `chr1`"
        );

        let gene = loaded.annotation().get("chr1").unwrap().gene("A").unwrap();
        assert!(gene.features().is_empty());
    }

    #[test]
    fn test_malformed_records() {
        let loaded = Builder::default().build_from_records(vec![
            record("gene", 2000, 1000, "ID=A"),
            record("gene", 1000, 2000, "Name=nameless"),
            record("exon", 1000, 1200, "ID=exon1"),
        ]);

        let lines = loaded
            .warnings()
            .iter()
            .map(|w| (w.line_no(), matches!(w, Warning::MalformedRecord { .. })))
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![(1, true), (2, true), (3, true)]);

        assert_eq!(
            loaded.warnings()[1].to_string(),
            "malformed record at line 2: gene record has no `ID` attribute"
        );
    }

    #[test]
    fn test_duplicate_gene_keeps_first() {
        let loaded = Builder::default().build_from_records(vec![
            record("gene", 1000, 2000, "ID=A"),
            record("gene", 5000, 6000, "ID=A"),
        ]);

        assert!(matches!(
            loaded.warnings(),
            [Warning::DuplicateGene { line_no: 2, .. }]
        ));

        let reference = loaded.annotation().get("chr1").unwrap();
        assert_eq!(reference.genes().len(), 1);
        assert_eq!(reference.gene("A").unwrap().interval().start(), 1000);
    }

    #[test]
    fn test_inferred_length() {
        let loaded = Builder::default().build_from_records(vec![
            record("gene", 1000, 2000, "ID=A"),
            record("exon", 1000, 2500, "Parent=A"),
            record("gene", 3000, 4000, "ID=B"),
        ]);

        assert_eq!(loaded.annotation().get("chr1").unwrap().length(), 4000);
    }

    #[test]
    fn test_declared_length_wins_over_inferred() {
        let loaded = Builder::default().build_from_records(vec![
            record("gene", 1000, 2000, "ID=A"),
            record("region", 1, 10000, "ID=chr1"),
        ]);

        assert_eq!(loaded.annotation().get("chr1").unwrap().length(), 10000);
    }

    #[test]
    fn test_transcript_indirection_and_multiple_parents() {
        let loaded = Builder::default().build_from_records(vec![
            record("gene", 1000, 2000, "ID=A"),
            record("mRNA", 1000, 2000, "ID=A.1;Parent=A"),
            record("mRNA", 1000, 1500, "ID=A.2;Parent=A"),
            record("exon", 1000, 1200, "Parent=A.1,A.2"),
            record("exon", 1400, 1500, "Parent=A.2"),
        ]);

        assert!(loaded.warnings().is_empty());

        // The shared exon is only attached to the gene once.
        let gene = loaded.annotation().get("chr1").unwrap().gene("A").unwrap();
        assert_eq!(gene.features().len(), 2);
    }

    #[test]
    fn test_cyclic_links_terminate() {
        let loaded = Builder::default().build_from_records(vec![
            record("mRNA", 1000, 2000, "ID=X;Parent=Y"),
            record("mRNA", 1000, 2000, "ID=Y;Parent=X"),
            record("exon", 1000, 1200, "Parent=X"),
        ]);

        assert!(matches!(
            loaded.warnings(),
            [Warning::OrphanFeature { line_no: 3, .. }]
        ));
    }

    #[test]
    fn test_custom_feature_kinds() {
        let loaded = Builder::default()
            .feature_kinds(["CDS"])
            .build_from_records(vec![
                record("gene", 1000, 2000, "ID=A"),
                record("exon", 1000, 1200, "Parent=A"),
                record("CDS", 1100, 1200, "Parent=A"),
            ]);

        let gene = loaded.annotation().get("chr1").unwrap().gene("A").unwrap();
        assert_eq!(gene.features().len(), 1);
        assert_eq!(gene.features()[0].kind(), "CDS");
    }

    #[test]
    fn test_try_build_from_reports_unparseable_lines() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let data = b"##gff-version 3\n\
            chr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A\n\
            chr1\t.\texon\tfoo\t1200\t.\t+\t.\tParent=A\n\
            chr2\t.\tgene\t10\t20\t.\t-\t.\tID=B\n";
        let reader = Reader::new(&data[..]);
        let loaded = Builder::default().try_build_from(reader)?;

        assert_eq!(loaded.warnings().len(), 1);
        assert_eq!(loaded.warnings()[0].line_no(), 3);
        assert_eq!(loaded.annotation().len(), 2);
        assert_eq!(loaded.annotation().get("chr2").unwrap().length(), 20);

        Ok(())
    }

    #[test]
    fn test_try_build_from_propagates_io_errors() {
        struct Broken;

        impl io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "broken pipe"))
            }
        }

        let reader = Reader::new(io::BufReader::new(Broken));
        let err = Builder::default().try_build_from(reader).unwrap_err();
        assert_eq!(err.to_string(), "i/o error: broken pipe");
    }
}
