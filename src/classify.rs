//! Classification of read intervals against an annotation.
//!
//! A query is first matched against the genes of a [`Reference`]. If no gene
//! overlaps the query, the read is [`Classification::Intergenic`]. Otherwise,
//! each overlapping gene contributes to a set of [`Counts`]:
//!
//! - a gene where the query overlaps none of the features counts one
//!   **intron**;
//! - each feature that contains both endpoints of the query counts one
//!   **exon**;
//! - each other overlapping feature (the query straddles at least one of the
//!   feature's boundaries) counts one **combo**.
//!
//! Counts are summed across all overlapping genes, so a read within
//! overlapping gene models accumulates counts from each of them.

use crate::annotation::Reference;
use crate::core::interval;
use crate::core::Interval;
use crate::core::Position;
use crate::overlap::Containment;

pub mod cache;

pub use cache::Cache;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to a classification query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The query interval was invalid.
    InvalidInterval(interval::Error),

    /// No annotation exists for the named reference sequence.
    UnknownReference(String),

    /// The query extends past the end of the reference sequence.
    OutOfRange {
        /// The name of the reference sequence.
        reference: String,

        /// The end position of the query.
        end: Position,

        /// The length of the reference sequence.
        length: Position,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidInterval(err) => write!(f, "invalid interval: {err}"),
            Error::UnknownReference(name) => write!(f, "unknown reference sequence: `{name}`"),
            Error::OutOfRange {
                reference,
                end,
                length,
            } => write!(
                f,
                "query end ({end}) exceeds the length of reference sequence `{reference}` \
                 ({length})"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Classification
////////////////////////////////////////////////////////////////////////////////////////

/// The number of exon, intron, and combo hits for a query.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Counts {
    /// Features that contain the whole query.
    exons: usize,

    /// Overlapping genes where the query touches no feature.
    introns: usize,

    /// Features whose boundaries are straddled by the query.
    combos: usize,
}

impl Counts {
    /// Creates a new [`Counts`].
    pub fn new(exons: usize, introns: usize, combos: usize) -> Self {
        Self {
            exons,
            introns,
            combos,
        }
    }

    /// Gets the number of exon hits.
    pub fn exons(&self) -> usize {
        self.exons
    }

    /// Gets the number of intron hits.
    pub fn introns(&self) -> usize {
        self.introns
    }

    /// Gets the number of combo hits.
    pub fn combos(&self) -> usize {
        self.combos
    }
}

impl std::ops::AddAssign for Counts {
    fn add_assign(&mut self, other: Self) {
        self.exons += other.exons;
        self.introns += other.introns;
        self.combos += other.combos;
    }
}

/// The classification of a query.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Classification {
    /// The query overlaps no gene.
    Intergenic,

    /// The query overlaps at least one gene.
    Genic(Counts),
}

impl Classification {
    /// Reduces the classification to a single [`Category`].
    ///
    /// Ties are broken as follows:
    ///
    /// 1. any combo hit makes the read a [`Category::Combo`];
    /// 2. otherwise, exon hits alone make it [`Category::Exonic`];
    /// 3. otherwise, intron hits alone make it [`Category::Intronic`];
    /// 4. exon hits together with intron hits (possible only when genes
    ///    overlap) make it [`Category::Ambiguous`].
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::classify::Category;
    /// use regionmap::classify::Classification;
    /// use regionmap::classify::Counts;
    ///
    /// let classification = Classification::Genic(Counts::new(1, 1, 1));
    /// assert_eq!(classification.category(), Category::Combo);
    ///
    /// let classification = Classification::Genic(Counts::new(2, 0, 0));
    /// assert_eq!(classification.category(), Category::Exonic);
    ///
    /// let classification = Classification::Genic(Counts::new(1, 1, 0));
    /// assert_eq!(classification.category(), Category::Ambiguous);
    ///
    /// assert_eq!(Classification::Intergenic.category(), Category::Intergenic);
    /// ```
    pub fn category(&self) -> Category {
        match self {
            Classification::Intergenic => Category::Intergenic,
            Classification::Genic(counts) if counts.combos > 0 => Category::Combo,
            Classification::Genic(counts) if counts.introns == 0 => Category::Exonic,
            Classification::Genic(counts) if counts.exons == 0 => Category::Intronic,
            Classification::Genic(_) => Category::Ambiguous,
        }
    }

    /// Gets the counts, which are all zero for an intergenic query.
    pub fn counts(&self) -> Counts {
        match self {
            Classification::Intergenic => Counts::default(),
            Classification::Genic(counts) => *counts,
        }
    }
}

/// A single label summarizing a [`Classification`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Category {
    /// The read lies outside of all genes.
    Intergenic,

    /// The read lies within features only.
    Exonic,

    /// The read lies within genes but outside of their features.
    Intronic,

    /// The read straddles a feature boundary.
    Combo,

    /// The read lies within a feature of one gene and outside of the features
    /// of another, overlapping gene.
    Ambiguous,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 5] = [
        Category::Exonic,
        Category::Intronic,
        Category::Combo,
        Category::Ambiguous,
        Category::Intergenic,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Intergenic => write!(f, "intergenic"),
            Category::Exonic => write!(f, "exonic"),
            Category::Intronic => write!(f, "intronic"),
            Category::Combo => write!(f, "combo"),
            Category::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Classifying
////////////////////////////////////////////////////////////////////////////////////////

/// Classifies `query` against the genes of `index`.
///
/// A query extending past the end of the reference sequence is an
/// [`Error::OutOfRange`], regardless of whether it overlaps any gene.
///
/// # Examples
///
/// ```
/// use regionmap::annotation::Builder;
/// use regionmap::classify;
/// use regionmap::core::Interval;
///
/// let data = b"##sequence-region chr1 1 10000
/// chr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A
/// chr1\t.\texon\t1000\t1200\t.\t+\t.\tParent=A
/// chr1\t.\texon\t1800\t2000\t.\t+\t.\tParent=A
/// ";
/// let loaded = Builder::default().try_build_from(regionmap::Reader::new(&data[..]))?;
/// let index = loaded.annotation().get("chr1").unwrap();
///
/// let result = classify::classify(index, &"1150-1850".parse::<Interval>()?)?;
/// assert_eq!(result.counts().combos(), 2);
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn classify(index: &Reference, query: &Interval) -> Result<Classification> {
    if query.end() > index.length() {
        return Err(Error::OutOfRange {
            reference: index.name().to_string(),
            end: query.end(),
            length: index.length(),
        });
    }

    let mut genes = index.overlapping_genes(query).peekable();

    if genes.peek().is_none() {
        return Ok(Classification::Intergenic);
    }

    let mut counts = Counts::default();

    for (gene, _) in genes {
        let mut features = gene.overlapping_features(query).peekable();

        if features.peek().is_none() {
            counts.introns += 1;
            continue;
        }

        for (_, containment) in features {
            match containment {
                Containment::Both => counts.exons += 1,
                Containment::Start | Containment::End | Containment::Neither => {
                    counts.combos += 1
                }
            }
        }
    }

    Ok(Classification::Genic(counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Builder;
    use crate::core::Strand;
    use crate::record::Record;

    /// The reference `chr1` (length 10000) with gene `A` (1000-2000) and the
    /// exons 1000-1200 and 1800-2000.
    fn chr1() -> Reference {
        let loaded = Builder::default().build_from_records(vec![
            Record::new("chr1", "region", 1, 10000, Strand::Unknown, "ID=chr1"),
            Record::new("chr1", "gene", 1000, 2000, Strand::Positive, "ID=A"),
            Record::new("chr1", "exon", 1000, 1200, Strand::Positive, "Parent=A"),
            Record::new("chr1", "exon", 1800, 2000, Strand::Positive, "Parent=A"),
        ]);
        assert!(loaded.warnings().is_empty());

        let (annotation, _) = loaded.into_parts();
        annotation.get("chr1").cloned().unwrap()
    }

    fn query(start: u64, end: u64) -> Interval {
        Interval::try_new(start, end).unwrap()
    }

    #[test]
    fn test_query_within_exon() {
        let index = chr1();
        assert_eq!(
            classify(&index, &query(1100, 1150)),
            Ok(Classification::Genic(Counts::new(1, 0, 0)))
        );
    }

    #[test]
    fn test_query_within_intron() {
        let index = chr1();
        assert_eq!(
            classify(&index, &query(1300, 1400)),
            Ok(Classification::Genic(Counts::new(0, 1, 0)))
        );
    }

    #[test]
    fn test_query_straddling_exons() {
        let index = chr1();
        let result = classify(&index, &query(1150, 1850)).unwrap();

        assert!(result.counts().combos() >= 1);
        assert_eq!(result, Classification::Genic(Counts::new(0, 0, 2)));
        assert_eq!(result.category(), Category::Combo);
    }

    #[test]
    fn test_query_starting_in_exon_and_ending_in_intron() {
        let index = chr1();
        assert_eq!(
            classify(&index, &query(1150, 1300)),
            Ok(Classification::Genic(Counts::new(0, 0, 1)))
        );
    }

    #[test]
    fn test_query_covering_whole_exon() {
        let index = chr1();
        assert_eq!(
            classify(&index, &query(900, 1300)),
            Ok(Classification::Genic(Counts::new(0, 0, 1)))
        );
    }

    #[test]
    fn test_query_outside_genes() {
        let index = chr1();
        assert_eq!(
            classify(&index, &query(5000, 5100)),
            Ok(Classification::Intergenic)
        );
        assert_eq!(
            classify(&index, &query(9000, 10000)),
            Ok(Classification::Intergenic)
        );
    }

    #[test]
    fn test_query_past_reference_end() {
        let index = chr1();

        let err = classify(&index, &query(9990, 10010)).unwrap_err();
        assert_eq!(
            err,
            Error::OutOfRange {
                reference: String::from("chr1"),
                end: 10010,
                length: 10000,
            }
        );
        assert_eq!(
            err.to_string(),
            "query end (10010) exceeds the length of reference sequence `chr1` (10000)"
        );
    }

    #[test]
    fn test_gene_without_features() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let index = Reference::new(
            "chr1",
            5000,
            vec![crate::annotation::Gene::new(
                "A",
                Interval::try_new(1000, 2000)?,
                Strand::Positive,
            )],
        );

        assert_eq!(
            classify(&index, &query(500, 2500))?,
            Classification::Genic(Counts::new(0, 1, 0))
        );

        Ok(())
    }

    #[test]
    fn test_overlapping_genes_accumulate() {
        let loaded = Builder::default().build_from_records(vec![
            Record::new("chr1", "gene", 1000, 2000, Strand::Positive, "ID=A"),
            Record::new("chr1", "exon", 1000, 1200, Strand::Positive, "Parent=A"),
            Record::new("chr1", "gene", 1100, 3000, Strand::Negative, "ID=B"),
            Record::new("chr1", "exon", 2500, 3000, Strand::Negative, "Parent=B"),
        ]);
        let index = loaded.annotation().get("chr1").unwrap();

        let result = classify(index, &query(1110, 1150)).unwrap();
        assert_eq!(result, Classification::Genic(Counts::new(1, 1, 0)));
        assert_eq!(result.category(), Category::Ambiguous);
    }

    #[test]
    fn test_overlapping_features_within_a_gene() {
        let loaded = Builder::default().build_from_records(vec![
            Record::new("chr1", "gene", 100, 300, Strand::Positive, "ID=A"),
            Record::new("chr1", "exon", 100, 200, Strand::Positive, "Parent=A"),
            Record::new("chr1", "exon", 150, 250, Strand::Positive, "Parent=A"),
        ]);
        let index = loaded.annotation().get("chr1").unwrap();

        assert_eq!(
            classify(index, &query(160, 170)),
            Ok(Classification::Genic(Counts::new(2, 0, 0)))
        );
    }

    #[test]
    fn test_long_gene_followed_by_short_genes() {
        let loaded = Builder::default().build_from_records(vec![
            Record::new("chr1", "region", 1, 100000, Strand::Unknown, "ID=chr1"),
            Record::new("chr1", "gene", 1, 50000, Strand::Positive, "ID=LONG"),
            Record::new("chr1", "gene", 100, 200, Strand::Positive, "ID=S1"),
            Record::new("chr1", "gene", 300, 400, Strand::Positive, "ID=S2"),
        ]);
        let index = loaded.annotation().get("chr1").unwrap();

        assert_eq!(
            classify(index, &query(20000, 20100)),
            Ok(Classification::Genic(Counts::new(0, 1, 0)))
        );
        assert_eq!(
            classify(index, &query(60000, 60100)),
            Ok(Classification::Intergenic)
        );
    }

    #[test]
    fn test_long_exon_behind_short_exons() {
        let loaded = Builder::default().build_from_records(vec![
            Record::new("chr1", "gene", 1000, 3000, Strand::Positive, "ID=A"),
            Record::new("chr1", "exon", 1000, 2500, Strand::Positive, "Parent=A"),
            Record::new("chr1", "exon", 1100, 1200, Strand::Positive, "Parent=A"),
            Record::new("chr1", "exon", 1300, 1400, Strand::Positive, "Parent=A"),
        ]);
        let index = loaded.annotation().get("chr1").unwrap();

        let result = classify(index, &query(2000, 2100)).unwrap();
        assert_eq!(result, Classification::Genic(Counts::new(1, 0, 0)));
        assert_eq!(result.category(), Category::Exonic);

        assert_eq!(
            classify(index, &query(2600, 2700)),
            Ok(Classification::Genic(Counts::new(0, 1, 0)))
        );
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let index = chr1();

        for q in [query(1100, 1150), query(1300, 1400), query(5000, 5100)] {
            let first = classify(&index, &q);
            for _ in 0..10 {
                assert_eq!(classify(&index, &q), first);
            }
        }
    }
}
