//! An annotation index over one or more reference sequences.
//!
//! An [`Annotation`] is built once (see [`Builder`]) and is immutable
//! afterwards. It can be shared freely across threads for classification.

use std::collections::HashMap;

use crate::classify;
use crate::classify::Classification;
use crate::core::Interval;
use crate::core::Position;

pub mod builder;
pub mod gene;
pub mod reference;

pub use builder::Builder;
pub use builder::Loaded;
pub use builder::Warning;
pub use gene::Feature;
pub use gene::Gene;
pub use reference::Reference;

/// The annotated genes for each reference sequence, keyed by reference name.
#[derive(Clone, Debug, Default)]
pub struct Annotation {
    /// The references keyed by name.
    references: HashMap<String, Reference>,
}

impl Annotation {
    /// Creates a new [`Annotation`] from references keyed by name.
    pub(crate) fn new(references: HashMap<String, Reference>) -> Self {
        Self { references }
    }

    /// Gets the reference with the given name.
    pub fn get(&self, name: &str) -> Option<&Reference> {
        self.references.get(name)
    }

    /// Gets an iterator over the references in no particular order.
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.references.values()
    }

    /// Gets the number of references.
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Returns whether there are no references.
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Classifies the interval from `start` to `end` (inclusive) on the
    /// named reference sequence.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::annotation::Builder;
    /// use regionmap::classify::Classification;
    /// use regionmap::classify::Counts;
    /// use regionmap::classify::Error;
    /// use regionmap::core::Strand;
    /// use regionmap::record::Record;
    ///
    /// let loaded = Builder::default().build_from_records(vec![
    ///     Record::new("chr1", "region", 1, 10000, Strand::Unknown, ""),
    ///     Record::new("chr1", "gene", 1000, 2000, Strand::Positive, "ID=A"),
    ///     Record::new("chr1", "exon", 1000, 1200, Strand::Positive, "Parent=A"),
    /// ]);
    /// let annotation = loaded.annotation();
    ///
    /// assert_eq!(
    ///     annotation.classify("chr1", 1100, 1150),
    ///     Ok(Classification::Genic(Counts::new(1, 0, 0)))
    /// );
    /// assert_eq!(
    ///     annotation.classify("chr1", 5000, 5100),
    ///     Ok(Classification::Intergenic)
    /// );
    /// assert!(matches!(
    ///     annotation.classify("chrX", 1, 2),
    ///     Err(Error::UnknownReference(_))
    /// ));
    /// ```
    pub fn classify(
        &self,
        reference: &str,
        start: Position,
        end: Position,
    ) -> Result<Classification, classify::Error> {
        let query = Interval::try_new(start, end).map_err(classify::Error::InvalidInterval)?;
        let index = self
            .get(reference)
            .ok_or_else(|| classify::Error::UnknownReference(reference.to_string()))?;

        classify::classify(index, &query)
    }
}
