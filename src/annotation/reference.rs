//! The annotation index for a single reference sequence.

use std::collections::HashMap;

use crate::annotation::Gene;
use crate::core::Interval;
use crate::core::Position;
use crate::overlap::Containment;
use crate::overlap::SortedSpans;

/// The genes annotated on one named reference sequence.
///
/// The genes are held in ascending order by start position (ties are broken
/// by end position) within a [`SortedSpans`], which the
/// [overlap search](crate::overlap) runs over.
#[derive(Clone, Debug)]
pub struct Reference {
    /// The name of the reference sequence.
    name: String,

    /// The length of the reference sequence.
    length: Position,

    /// The genes, sorted by their intervals.
    genes: SortedSpans<Gene>,

    /// The index of each gene within `genes` keyed by gene identifier.
    by_id: HashMap<String, usize>,
}

impl Reference {
    /// Creates a new [`Reference`].
    ///
    /// The genes are sorted as part of construction.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::annotation::Gene;
    /// use regionmap::annotation::Reference;
    /// use regionmap::core::Interval;
    /// use regionmap::core::Strand;
    ///
    /// let reference = Reference::new(
    ///     "chr1",
    ///     10000,
    ///     vec![
    ///         Gene::new("B", Interval::try_new(5000, 6000)?, Strand::Negative),
    ///         Gene::new("A", Interval::try_new(1000, 2000)?, Strand::Positive),
    ///     ],
    /// );
    ///
    /// assert_eq!(reference.name(), "chr1");
    /// assert_eq!(reference.length(), 10000);
    /// assert_eq!(reference.genes()[0].id(), "A");
    /// assert_eq!(reference.gene("B").map(|g| g.strand()), Some(Strand::Negative));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(name: impl Into<String>, length: Position, genes: Vec<Gene>) -> Self {
        let genes = SortedSpans::new(genes);

        let by_id = genes
            .entries()
            .iter()
            .enumerate()
            .map(|(i, gene)| (gene.id().to_string(), i))
            .collect();

        Self {
            name: name.into(),
            length,
            genes,
            by_id,
        }
    }

    /// Gets the name of the reference sequence.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the length of the reference sequence.
    pub fn length(&self) -> Position {
        self.length
    }

    /// Gets the genes sorted by their intervals.
    pub fn genes(&self) -> &[Gene] {
        self.genes.entries()
    }

    /// Looks up a gene by its identifier.
    pub fn gene(&self, id: &str) -> Option<&Gene> {
        self.by_id.get(id).map(|&i| &self.genes.entries()[i])
    }

    /// Gets the genes that overlap `query` along with the containment of the
    /// query's endpoints within each gene.
    pub fn overlapping_genes<'a>(
        &'a self,
        query: &Interval,
    ) -> impl Iterator<Item = (&'a Gene, Containment)> + 'a {
        self.genes.overlapping(query)
    }
}
