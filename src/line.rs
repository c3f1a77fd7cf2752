//! A line within a GFF3 annotation file.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::Position;
use crate::record;
use crate::record::Record;

/// The prefix for a comment line.
pub const COMMENT_PREFIX: &str = "#";

/// The prefix for a directive line.
pub const DIRECTIVE_PREFIX: &str = "##";

/// The directive that starts the trailing FASTA section of a file.
pub const FASTA_DIRECTIVE: &str = "##FASTA";

/// Matches a `##sequence-region <seqid> <start> <end>` directive.
static SEQUENCE_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##sequence-region\s+(\S+)\s+(\d+)\s+(\d+)\s*$")
        .unwrap_or_else(|err| unreachable!("sequence region pattern is valid: {err}"))
});

/// An error associated with parsing a line.
#[derive(Debug)]
pub enum ParseError {
    /// An invalid record.
    InvalidRecord(record::Error, String),

    /// An invalid `##sequence-region` directive.
    InvalidSequenceRegion(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidRecord(err, line) => {
                write!(f, "invalid record: {err}\n\nline: {line}")
            }
            ParseError::InvalidSequenceRegion(line) => {
                write!(f, "invalid sequence region directive\n\nline: {line}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A directive line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Directive {
    /// A `##sequence-region` directive declaring the extent of a reference
    /// sequence.
    SequenceRegion {
        /// The name of the reference sequence.
        reference: String,

        /// The first position of the reference sequence.
        start: Position,

        /// The last position of the reference sequence.
        end: Position,
    },

    /// The `##FASTA` directive, after which no more records follow.
    Fasta,

    /// Any other directive, kept verbatim.
    Other(String),
}

/// A line within a GFF3 annotation file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// An empty line.
    Empty,

    /// A comment line.
    Comment(String),

    /// A directive line.
    Directive(Directive),

    /// An annotation record.
    Record(Record),
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Line::Empty => write!(f, ""),
            Line::Comment(comment) => write!(f, "{comment}"),
            Line::Directive(Directive::SequenceRegion {
                reference,
                start,
                end,
            }) => write!(f, "##sequence-region {reference} {start} {end}"),
            Line::Directive(Directive::Fasta) => write!(f, "{FASTA_DIRECTIVE}"),
            Line::Directive(Directive::Other(directive)) => write!(f, "{directive}"),
            Line::Record(record) => write!(f, "{record}"),
        }
    }
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            Ok(Self::Empty)
        } else if s.starts_with(FASTA_DIRECTIVE) {
            Ok(Self::Directive(Directive::Fasta))
        } else if s.starts_with("##sequence-region") {
            let captures = SEQUENCE_REGION
                .captures(s)
                .ok_or_else(|| ParseError::InvalidSequenceRegion(s.into()))?;

            let position = |i: usize| {
                captures[i]
                    .parse::<Position>()
                    .map_err(|_| ParseError::InvalidSequenceRegion(s.into()))
            };

            Ok(Self::Directive(Directive::SequenceRegion {
                reference: captures[1].to_string(),
                start: position(2)?,
                end: position(3)?,
            }))
        } else if s.starts_with(DIRECTIVE_PREFIX) {
            Ok(Self::Directive(Directive::Other(s.into())))
        } else if s.starts_with(COMMENT_PREFIX) {
            Ok(Self::Comment(s.into()))
        } else {
            s.parse::<Record>()
                .map(Line::Record)
                .map_err(|e| ParseError::InvalidRecord(e, s.into()))
        }
    }
}
