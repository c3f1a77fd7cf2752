//! `regionmap` is a crate for classifying read alignments against a genome
//! annotation.
//!
//! Given the aligned interval of a read on a named reference sequence, the
//! crate determines whether the read falls within an annotated exon, within an
//! intron (inside a gene but outside all of its features), across an
//! exon/intron boundary (a "combo"), or outside of all genes ("intergenic").
//!
//! The crate provides two main points of entry:
//!
//! - Parsing and reading GFF3 files directly.
//! - Building an [`Annotation`](crate::annotation::Annotation) and classifying
//!   intervals against it.
//!
//! ## Parsing and reading GFF3 files
//!
//! The [`Reader`] facility reads a GFF3 file line by line. Each line is parsed
//! into a [`Line`], which is either empty, a comment, a
//! [directive](crate::line::Directive), or a
//! [record](crate::record::Record). Most users will not need to work with
//! the lines directly.
//!
//! ```
//! use regionmap as rm;
//!
//! let data = b"##gff-version 3\nchr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A";
//! let mut reader = rm::Reader::new(&data[..]);
//!
//! for result in reader.lines() {
//!     let line = result?;
//!     println!("{}", line);
//! }
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Classifying intervals
//!
//! An [`Annotation`](crate::annotation::Annotation) cannot be instantiated
//! directly. Instead, use [`annotation::Builder`] and either
//! [`annotation::Builder::try_build_from()`] (to read from a GFF3 [`Reader`])
//! or [`annotation::Builder::build_from_records()`] (to build from records
//! produced elsewhere). Problems with individual records do not abort the
//! load; they are returned as [`annotation::Warning`]s alongside the
//! annotation.
//!
//! Once loaded, an annotation is immutable and may be shared across threads.
//! Each query is classified with
//! [`Annotation::classify()`](crate::annotation::Annotation::classify). For
//! inputs with many repeated queries, a [`classify::Cache`] can be placed in
//! front of the annotation.
//!
//! ```
//! use regionmap as rm;
//! use rm::classify::Category;
//!
//! let data = b"##sequence-region chr1 1 10000
//! chr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A
//! chr1\t.\texon\t1000\t1200\t.\t+\t.\tParent=A
//! chr1\t.\texon\t1800\t2000\t.\t+\t.\tParent=A
//! ";
//! let reader = rm::Reader::new(&data[..]);
//! let loaded = rm::annotation::Builder::default().try_build_from(reader)?;
//! let annotation = loaded.annotation();
//!
//! assert_eq!(annotation.classify("chr1", 1100, 1150)?.category(), Category::Exonic);
//! assert_eq!(annotation.classify("chr1", 1300, 1400)?.category(), Category::Intronic);
//! assert_eq!(annotation.classify("chr1", 1150, 1850)?.category(), Category::Combo);
//! assert_eq!(annotation.classify("chr1", 5000, 5100)?.category(), Category::Intergenic);
//! assert!(annotation.classify("chr1", 9990, 10010).is_err());
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod annotation;
pub mod classify;
pub mod core;
pub mod line;
pub mod overlap;
pub mod reader;
pub mod record;

pub use line::Line;

pub use self::reader::Reader;
