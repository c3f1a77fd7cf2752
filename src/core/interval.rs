//! A closed interval consisting of a start and end position.
//!
//! Positions follow the GFF3 convention: they are 1-based and both the start
//! and the end position are included within the interval.
//!
//! ```text
//! ================ seq0 ===============
//!
//! | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9 |
//! -------------------------------------
//! |   |   | X | X | X | X | X |   |   |  <= 3-7
//! |   |   |   |   |   | X | X | X | X |  <= 6-9
//! ```
//!
//! The two intervals above overlap because they share positions 6 and 7.
//!
//! ## Parsing Intervals
//!
//! Intervals can be parsed from strings in the form `<start>-<end>` (e.g.,
//! `1000-2000`) or from a single position (e.g., `1000`), which is
//! interpreted as an interval containing only that position.

use std::cmp::Ordering;
use std::str::FromStr;

/// A position within a reference sequence.
pub type Position = u64;

/// An error related to an interval.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The start position is greater than the end position.
    StartGreaterThanEnd(Position, Position),

    /// Could not parse an interval from the given value.
    ParseError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::StartGreaterThanEnd(start, end) => write!(
                f,
                "start position ({start}) cannot be greater than the end position ({end})"
            ),
            Error::ParseError(val) => write!(f, "could not parse interval from the value: {val}"),
        }
    }
}

impl std::error::Error for Error {}

/// A closed interval consisting of a start and end position.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Interval {
    /// The start position.
    start: Position,

    /// The end position.
    end: Position,
}

impl Interval {
    /// Attempts to create a new [`Interval`].
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::core::Interval;
    ///
    /// let interval = Interval::try_new(1000, 2000)?;
    /// assert_eq!(interval.start(), 1000);
    /// assert_eq!(interval.end(), 2000);
    ///
    /// // Single-position intervals are allowed.
    /// Interval::try_new(5, 5)?;
    ///
    /// assert!(Interval::try_new(2000, 1000).is_err());
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn try_new(start: Position, end: Position) -> Result<Interval, Error> {
        if start > end {
            return Err(Error::StartGreaterThanEnd(start, end));
        }

        Ok(Interval { start, end })
    }

    /// Gets the start position of the interval.
    pub fn start(&self) -> Position {
        self.start
    }

    /// Gets the end position of the interval.
    pub fn end(&self) -> Position {
        self.end
    }

    /// Gets the number of positions covered by the interval.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::core::Interval;
    ///
    /// assert_eq!(Interval::try_new(1000, 1999)?.len(), 1000);
    /// assert_eq!(Interval::try_new(7, 7)?.len(), 1);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Gets the midpoint of the interval, rounded down.
    pub fn midpoint(&self) -> Position {
        self.start + (self.end - self.start) / 2
    }

    /// Indicates whether a position falls within the interval.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::core::Interval;
    ///
    /// let interval = "1000-1200".parse::<Interval>()?;
    ///
    /// assert!(interval.contains(1000));
    /// assert!(interval.contains(1100));
    /// assert!(interval.contains(1200));
    ///
    /// assert!(!interval.contains(999));
    /// assert!(!interval.contains(1201));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    /// Indicates whether the two intervals share at least one position.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::core::Interval;
    ///
    /// let a = "100-200".parse::<Interval>()?;
    ///
    /// assert!(a.overlaps(&"150-250".parse::<Interval>()?));
    /// assert!(a.overlaps(&"200-300".parse::<Interval>()?));
    /// assert!(a.overlaps(&"120-130".parse::<Interval>()?));
    /// assert!(a.overlaps(&"1-1000".parse::<Interval>()?));
    ///
    /// assert!(!a.overlaps(&"201-300".parse::<Interval>()?));
    /// assert!(!a.overlaps(&"1-99".parse::<Interval>()?));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Indicates whether `other` lies completely within this interval.
    pub fn encloses(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |value: &str| {
            value
                .trim()
                .replace(',', "")
                .parse::<Position>()
                .map_err(|_| Error::ParseError(s.to_string()))
        };

        match s.split_once('-') {
            Some((start, end)) => Interval::try_new(parse(start)?, parse(end)?),
            None => {
                let position = parse(s)?;
                Interval::try_new(position, position)
            }
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
