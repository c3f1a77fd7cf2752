//! Genes and the features annotated within them.

use crate::core::Interval;
use crate::core::Strand;
use crate::overlap::Containment;
use crate::overlap::SortedSpans;
use crate::overlap::Span;

/// An annotated feature (e.g., an exon) within a [`Gene`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Feature {
    /// The feature kind (e.g., `exon`).
    kind: String,

    /// The interval spanned by the feature.
    interval: Interval,

    /// The strand of the feature.
    strand: Strand,
}

impl Feature {
    /// Creates a new [`Feature`].
    pub fn new(kind: impl Into<String>, interval: Interval, strand: Strand) -> Self {
        Self {
            kind: kind.into(),
            interval,
            strand,
        }
    }

    /// Gets the feature kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Gets the interval spanned by the feature.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Gets the strand of the feature.
    pub fn strand(&self) -> Strand {
        self.strand
    }
}

impl Span for Feature {
    fn interval(&self) -> &Interval {
        &self.interval
    }
}

/// A gene along with its features.
///
/// Once a gene is part of a loaded [`Annotation`](crate::annotation::Annotation),
/// its features are sorted in ascending order by start position (ties are
/// broken by end position).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// The gene identifier.
    id: String,

    /// The interval spanned by the gene.
    interval: Interval,

    /// The strand of the gene.
    strand: Strand,

    /// The features within the gene.
    features: SortedSpans<Feature>,
}

impl Gene {
    /// Creates a new [`Gene`] without any features.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::annotation::Gene;
    /// use regionmap::core::Interval;
    /// use regionmap::core::Strand;
    ///
    /// let gene = Gene::new("geneA", Interval::try_new(1000, 2000)?, Strand::Positive);
    ///
    /// assert_eq!(gene.id(), "geneA");
    /// assert_eq!(gene.interval().start(), 1000);
    /// assert!(gene.features().is_empty());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(id: impl Into<String>, interval: Interval, strand: Strand) -> Self {
        Self {
            id: id.into(),
            interval,
            strand,
            features: SortedSpans::default(),
        }
    }

    /// Gets the gene identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the interval spanned by the gene.
    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Gets the strand of the gene.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the features within the gene.
    pub fn features(&self) -> &[Feature] {
        self.features.entries()
    }

    /// Gets the features that overlap `query` along with the containment of
    /// the query's endpoints within each feature.
    pub fn overlapping_features<'a>(
        &'a self,
        query: &Interval,
    ) -> impl Iterator<Item = (&'a Feature, Containment)> + 'a {
        self.features.overlapping(query)
    }

    /// Pushes a feature into the gene.
    ///
    /// The features are only guaranteed to be sorted after [`Gene::freeze()`]
    /// is called.
    pub(crate) fn push_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Sorts the features and returns the number of features that are not
    /// enclosed by the gene's interval.
    pub(crate) fn freeze(&mut self) -> usize {
        self.features.sort();

        self.features
            .entries()
            .iter()
            .filter(|feature| !self.interval.encloses(&feature.interval))
            .count()
    }
}

impl Span for Gene {
    fn interval(&self) -> &Interval {
        &self.interval
    }
}
