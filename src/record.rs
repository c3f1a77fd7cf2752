//! An annotation record.
//!
//! Annotation records follow the nine, tab-delimited columns of the GFF3
//! format:
//!
//! ```text
//! seqid  source  type  start  end  score  strand  phase  attributes
//! ```
//!
//! Only the columns needed to build an annotation index are kept: the
//! reference sequence name (`seqid`), the feature kind (`type`), the start and
//! end positions, the strand, and the raw attribute string.

use std::num::ParseIntError;
use std::str::FromStr;

use crate::core::strand::ParseStrandError;
use crate::core::Position;
use crate::core::Strand;

/// The delimiter between the columns of a record.
pub const DELIMITER: char = '\t';

/// The number of expected fields in a record.
pub const NUM_FIELDS: usize = 9;

/// The delimiter between attributes.
pub const ATTRIBUTE_DELIMITER: char = ';';

/// The separator between an attribute key and its value.
pub const ATTRIBUTE_SEPARATOR: char = '=';

/// The delimiter between multiple values of a single attribute.
pub const VALUE_DELIMITER: char = ',';

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error associated with parsing a record.
#[derive(Debug)]
pub enum ParseError {
    /// An incorrect number of fields in the line.
    IncorrectNumberOfFields(usize),

    /// An empty reference sequence name.
    EmptyReference,

    /// An empty feature kind.
    EmptyKind,

    /// An invalid start position.
    InvalidStart(ParseIntError),

    /// An invalid end position.
    InvalidEnd(ParseIntError),

    /// An invalid strand.
    InvalidStrand(ParseStrandError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IncorrectNumberOfFields(fields) => write!(
                f,
                "invalid number of fields in record: expected {NUM_FIELDS} fields, found \
                 {fields} fields"
            ),
            ParseError::EmptyReference => write!(f, "empty reference sequence name"),
            ParseError::EmptyKind => write!(f, "empty feature kind"),
            ParseError::InvalidStart(err) => write!(f, "invalid start position: {err}"),
            ParseError::InvalidEnd(err) => write!(f, "invalid end position: {err}"),
            ParseError::InvalidStrand(err) => write!(f, "invalid strand: {err}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An error related to a [`Record`].
#[derive(Debug)]
pub enum Error {
    /// A parse error.
    Parse(ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "parse error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Record
////////////////////////////////////////////////////////////////////////////////////////

/// An annotation record.
///
/// A record is not validated beyond its syntax: for instance, a record whose
/// start position is greater than its end position can be constructed and is
/// only rejected when it is loaded into an
/// [`Annotation`](crate::annotation::Annotation).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    /// The name of the reference sequence.
    reference: String,

    /// The feature kind (e.g., `gene` or `exon`).
    kind: String,

    /// The start position.
    start: Position,

    /// The end position.
    end: Position,

    /// The strand.
    strand: Strand,

    /// The raw attribute string.
    attributes: String,
}

impl Record {
    /// Creates a new [`Record`].
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::core::Strand;
    /// use regionmap::record::Record;
    ///
    /// let record = Record::new("chr1", "gene", 1000, 2000, Strand::Positive, "ID=geneA");
    /// assert_eq!(record.reference(), "chr1");
    /// assert_eq!(record.kind(), "gene");
    /// assert_eq!(record.attribute("ID"), Some("geneA"));
    /// ```
    pub fn new(
        reference: impl Into<String>,
        kind: impl Into<String>,
        start: Position,
        end: Position,
        strand: Strand,
        attributes: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            kind: kind.into(),
            start,
            end,
            strand,
            attributes: attributes.into(),
        }
    }

    /// Gets the name of the reference sequence.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Gets the feature kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Gets the start position.
    pub fn start(&self) -> Position {
        self.start
    }

    /// Gets the end position.
    pub fn end(&self) -> Position {
        self.end
    }

    /// Gets the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Gets the raw attribute string.
    pub fn attributes(&self) -> &str {
        &self.attributes
    }

    /// Looks up the value of the first attribute with the given key.
    ///
    /// Attributes without a value and attributes with an empty value are
    /// treated as missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::record::Record;
    ///
    /// let record = "chr1\t.\texon\t1000\t1200\t.\t+\t.\tID=exon1; Parent=tx1,tx2"
    ///     .parse::<Record>()?;
    ///
    /// assert_eq!(record.attribute("ID"), Some("exon1"));
    /// assert_eq!(record.attribute("Parent"), Some("tx1,tx2"));
    /// assert_eq!(record.attribute("Name"), None);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .split(ATTRIBUTE_DELIMITER)
            .filter_map(|pair| pair.trim().split_once(ATTRIBUTE_SEPARATOR))
            .find(|(k, _)| k.trim() == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Looks up all of the comma-separated values of the first attribute with
    /// the given key.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::record::Record;
    ///
    /// let record = "chr1\t.\texon\t1000\t1200\t.\t+\t.\tParent=tx1,tx2"
    ///     .parse::<Record>()?;
    ///
    /// let parents = record.attribute_values("Parent").collect::<Vec<_>>();
    /// assert_eq!(parents, vec!["tx1", "tx2"]);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn attribute_values<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.attribute(key)
            .into_iter()
            .flat_map(|value| value.split(VALUE_DELIMITER))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s.split(DELIMITER).collect::<Vec<_>>();
        if parts.len() != NUM_FIELDS {
            return Err(Error::Parse(ParseError::IncorrectNumberOfFields(
                parts.len(),
            )));
        }

        let reference = parts[0];
        if reference.is_empty() {
            return Err(Error::Parse(ParseError::EmptyReference));
        }

        let kind = parts[2];
        if kind.is_empty() {
            return Err(Error::Parse(ParseError::EmptyKind));
        }

        let start = parts[3]
            .parse()
            .map_err(|err| Error::Parse(ParseError::InvalidStart(err)))?;
        let end = parts[4]
            .parse()
            .map_err(|err| Error::Parse(ParseError::InvalidEnd(err)))?;
        let strand = parts[6]
            .parse()
            .map_err(|err| Error::Parse(ParseError::InvalidStrand(err)))?;

        Ok(Record {
            reference: reference.to_string(),
            kind: kind.to_string(),
            start,
            end,
            strand,
            attributes: parts[8].to_string(),
        })
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t.\t{}\t{}\t{}\t.\t{}\t.\t{}",
            self.reference, self.kind, self.start, self.end, self.strand, self.attributes
        )
    }
}
