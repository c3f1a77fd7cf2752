//! The strand upon which an annotated feature is located.

use std::str::FromStr;

/// An error related to the parsing of a strand.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseStrandError(String);

impl std::fmt::Display for ParseStrandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse strand error: {} is not a valid strand", self.0)
    }
}

impl std::error::Error for ParseStrandError {}

/// The strand of an annotation record.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Strand {
    /// The positive strand (`+`).
    Positive,

    /// The negative strand (`-`).
    Negative,

    /// The strand is not known or not relevant (`.` or `?`).
    #[default]
    Unknown,
}

impl FromStr for Strand {
    type Err = ParseStrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Positive),
            "-" => Ok(Self::Negative),
            "." | "?" => Ok(Self::Unknown),
            c => Err(ParseStrandError(c.to_string())),
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Positive => write!(f, "+"),
            Strand::Negative => write!(f, "-"),
            Strand::Unknown => write!(f, "."),
        }
    }
}
