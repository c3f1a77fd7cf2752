//! A bounded cache of classification results.
//!
//! Sorted alignment files tend to contain runs of reads with identical
//! coordinates (duplicates, or reads stacked on the same exon). The cache
//! keeps the most recently used results so that those runs are only
//! classified once.

use cached::Cached;
use cached::SizedCache;

use crate::annotation::Annotation;
use crate::classify::Classification;
use crate::classify::Error;
use crate::core::Position;

/// The default number of results kept in a [`Cache`].
pub const DEFAULT_CAPACITY: usize = 4096;

/// The key for a cached result.
type Key = (String, Position, Position);

/// A least-recently-used cache of classification results keyed by reference
/// name and query coordinates.
///
/// Both successful classifications and errors are cached.
pub struct Cache {
    /// The underlying store.
    store: SizedCache<Key, Result<Classification, Error>>,

    /// The number of lookups answered from the store.
    hits: u64,

    /// The number of lookups that required a classification.
    misses: u64,
}

impl Cache {
    /// Creates a new [`Cache`] holding at most `capacity` results.
    ///
    /// A `capacity` of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: SizedCache::with_size(capacity.max(1)),
            hits: 0,
            misses: 0,
        }
    }

    /// Gets the cached result for a query or classifies it against
    /// `annotation` and caches the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::annotation::Builder;
    /// use regionmap::classify::Cache;
    /// use regionmap::classify::Classification;
    /// use regionmap::core::Strand;
    /// use regionmap::record::Record;
    ///
    /// let loaded = Builder::default().build_from_records(vec![
    ///     Record::new("chr1", "gene", 1000, 2000, Strand::Positive, "ID=A"),
    /// ]);
    ///
    /// let mut cache = Cache::default();
    /// let first = cache.get_or_classify(loaded.annotation(), "chr1", 1100, 1150);
    /// let second = cache.get_or_classify(loaded.annotation(), "chr1", 1100, 1150);
    ///
    /// assert_eq!(first, second);
    /// assert_eq!(cache.hits(), 1);
    /// assert_eq!(cache.misses(), 1);
    /// ```
    pub fn get_or_classify(
        &mut self,
        annotation: &Annotation,
        reference: &str,
        start: Position,
        end: Position,
    ) -> Result<Classification, Error> {
        let key = (reference.to_string(), start, end);

        if let Some(result) = self.store.cache_get(&key) {
            self.hits += 1;
            return result.clone();
        }

        self.misses += 1;
        let result = annotation.classify(reference, start, end);
        self.store.cache_set(key, result.clone());
        result
    }

    /// Gets the number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Gets the number of lookups that required a classification.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Gets the number of results currently held.
    pub fn len(&self) -> usize {
        self.store.cache_size()
    }

    /// Returns whether the cache holds no results.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("len", &self.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}
