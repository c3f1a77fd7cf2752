//! A GFF3 annotation reader.

use std::io::BufRead;
use std::io::{self};
use std::iter;

use crate::line;
use crate::line::Directive;
use crate::Line;

/// The new line character.
const NEW_LINE: char = '\n';

/// The carriage return character.
const CARRIAGE_RETURN: char = '\r';

/// An error related to a [`Reader`].
#[derive(Debug)]
pub enum Error {
    /// An I/O error.
    Io(io::Error),

    /// A line error.
    Line(line::ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "i/o error: {err}"),
            Error::Line(err) => write!(f, "line error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A GFF3 annotation reader.
#[derive(Clone, Debug)]
pub struct Reader<T>(T)
where
    T: BufRead;

impl<T> Reader<T>
where
    T: BufRead,
{
    /// Creates an annotation reader.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"##gff-version 3\nchr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A";
    /// let reader = regionmap::Reader::new(&data[..]);
    /// ```
    pub fn new(inner: T) -> Self {
        Self::from(inner)
    }

    /// Gets a reference to the inner reader.
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Gets a mutable reference to the inner reader.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.0
    }

    /// Consumes self and returns the inner reader.
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Reads a raw, textual line from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// let data = b"##gff-version 3\r\nchr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A";
    /// let mut reader = regionmap::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 17);
    /// assert_eq!(buffer, "##gff-version 3");
    ///
    /// reader.read_line_raw(&mut buffer)?;
    /// assert_eq!(buffer, "chr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A");
    ///
    /// assert_eq!(reader.read_line_raw(&mut buffer)?, 0);
    ///
    /// # Ok::<(), io::Error>(())
    /// ```
    pub fn read_line_raw(&mut self, buffer: &mut String) -> io::Result<usize> {
        read_line(self.inner_mut(), buffer)
    }

    /// Attempts to read a [`Line`] from the underlying reader.
    ///
    /// # Examples
    ///
    /// ```
    /// use regionmap::Line;
    ///
    /// let data = b"##gff-version 3\nchr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A";
    /// let mut reader = regionmap::Reader::new(&data[..]);
    ///
    /// let mut buffer = String::new();
    /// assert!(matches!(
    ///     reader.read_line(&mut buffer)?,
    ///     Some(Line::Directive(_))
    /// ));
    /// assert!(matches!(
    ///     reader.read_line(&mut buffer)?,
    ///     Some(Line::Record(_))
    /// ));
    /// assert!(matches!(reader.read_line(&mut buffer)?, None));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_line(&mut self, buffer: &mut String) -> Result<Option<Line>, Error> {
        let read = self.read_line_raw(buffer).map_err(Error::Io)?;

        match read {
            0 => Ok(None),
            _ => {
                let line = buffer.parse::<Line>().map_err(Error::Line)?;
                Ok(Some(line))
            }
        }
    }

    /// Returns an iterator over the `Line`s in the underlying reader.
    ///
    /// Unlike [`Reader::numbered_lines()`], this iterator does not stop at a
    /// `##FASTA` directive.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"##gff-version 3\nchr1\t.\tgene\t1000\t2000\t.\t+\t.\tID=A\n";
    /// let mut reader = regionmap::Reader::new(&data[..]);
    ///
    /// let lines = reader.lines().collect::<Vec<_>>();
    /// assert_eq!(lines.len(), 2);
    /// ```
    pub fn lines(&mut self) -> impl Iterator<Item = io::Result<Line>> + '_ {
        let mut buffer = String::new();

        iter::from_fn(move || {
            buffer.clear();

            match self.read_line_raw(&mut buffer) {
                Ok(0) => None,
                Ok(_) => Some(
                    buffer
                        .parse()
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
                ),
                Err(e) => Some(Err(e)),
            }
        })
    }

    /// Returns an iterator over the annotation section of the underlying
    /// reader where each item is paired with its 1-based line number.
    ///
    /// Parse errors are yielded in place and iteration continues with the
    /// next line. Iteration ends at the end of the input, at the first I/O
    /// error, or at a `##FASTA` directive.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = b"##gff-version 3\nnot a record\nchr1\t.\tgene\t1\t2\t.\t+\t.\tID=A\n##FASTA\n>chr1";
    /// let mut reader = regionmap::Reader::new(&data[..]);
    ///
    /// let lines = reader.numbered_lines().collect::<Vec<_>>();
    /// assert_eq!(lines.len(), 3);
    ///
    /// assert_eq!(lines[1].0, 2);
    /// assert!(lines[1].1.is_err());
    ///
    /// assert_eq!(lines[2].0, 3);
    /// assert!(lines[2].1.is_ok());
    /// ```
    pub fn numbered_lines(&mut self) -> NumberedLines<'_, T> {
        NumberedLines::new(self)
    }
}

impl<T> From<T> for Reader<T>
where
    T: BufRead,
{
    fn from(inner: T) -> Self {
        Self(inner)
    }
}

/// An iterator over the lines of a [`Reader`] paired with their line
/// numbers.
#[derive(Debug)]
pub struct NumberedLines<'a, T>
where
    T: BufRead,
{
    /// The inner reader.
    reader: &'a mut Reader<T>,

    /// The line buffer.
    buffer: String,

    /// The line number of the last line read.
    line_no: usize,

    /// Whether the iterator is exhausted.
    done: bool,
}

impl<'a, T> NumberedLines<'a, T>
where
    T: BufRead,
{
    /// Creates a new [`NumberedLines`].
    pub(crate) fn new(reader: &'a mut Reader<T>) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line_no: 0usize,
            done: false,
        }
    }
}

impl<T> Iterator for NumberedLines<'_, T>
where
    T: BufRead,
{
    type Item = (usize, Result<Line, Error>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.line_no += 1;

        match self.reader.read_line(&mut self.buffer) {
            Ok(None) | Ok(Some(Line::Directive(Directive::Fasta))) => {
                self.done = true;
                None
            }
            Ok(Some(line)) => Some((self.line_no, Ok(line))),
            Err(Error::Io(err)) => {
                self.done = true;
                Some((self.line_no, Err(Error::Io(err))))
            }
            Err(err) => Some((self.line_no, Err(err))),
        }
    }
}

/// Reads a line from a buffered reader.
///
/// Trailing new line and carriage return characters are removed.
fn read_line<T>(reader: &mut T, buffer: &mut String) -> io::Result<usize>
where
    T: BufRead,
{
    buffer.clear();

    match reader.read_line(buffer) {
        Ok(0) => Ok(0),
        Ok(n) => {
            if buffer.ends_with(NEW_LINE) {
                buffer.pop();

                if buffer.ends_with(CARRIAGE_RETURN) {
                    buffer.pop();
                }
            }

            Ok(n)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn test_read_line() {
        let data = b"hello\r\nworld!";
        let mut cursor = io::Cursor::new(data);

        let mut buffer = String::new();
        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "hello");
        assert_eq!(len, 7);

        let len = read_line(&mut cursor, &mut buffer).unwrap();
        assert_eq!(buffer, "world!");
        assert_eq!(len, 6);
    }

    #[test]
    fn test_numbered_lines_continue_past_parse_errors() {
        let data = b"# comment\nchr1\tbad\nchr1\t.\tgene\t1\t100\t.\t+\t.\tID=A\n";
        let mut reader = Reader::new(&data[..]);

        let lines = reader.numbered_lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);

        assert_eq!(lines[0].0, 1);
        assert!(matches!(lines[0].1, Ok(Line::Comment(_))));

        assert_eq!(lines[1].0, 2);
        assert!(matches!(lines[1].1, Err(Error::Line(_))));

        assert_eq!(lines[2].0, 3);
        assert!(matches!(lines[2].1, Ok(Line::Record(_))));
    }

    #[test]
    fn test_numbered_lines_stop_at_fasta() {
        let data = b"chr1\t.\tgene\t1\t100\t.\t+\t.\tID=A\n##FASTA\n>chr1\nACGT\n";
        let mut reader = Reader::new(&data[..]);

        let lines = reader.numbered_lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 1);
    }
}
