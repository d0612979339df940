//! Plain-text duplicate report.
//!
//! Each group is written as its member paths joined by a separator
//! character, optionally preceded by a size label, and closed by a blank
//! line:
//!
//! ```text
//! size [5]:
//! /data/a.txt
//! /data/b.txt
//!
//! ```
//!
//! The writer is flushed after every group so partial results show up while
//! the resolver is still comparing. On unix, paths are written as their raw
//! bytes, so names that are not valid UTF-8 survive intact.

use std::io::{self, Write};
use std::path::Path;

use crate::duplicates::{DuplicateGroup, FinderError};

/// Streams duplicate groups to a writer.
#[derive(Debug)]
pub struct TextReporter<W: Write> {
    writer: W,
    separator: char,
    show_size: bool,
    groups_written: usize,
}

impl<W: Write> TextReporter<W> {
    /// Create a reporter with the default newline separator and no size labels.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            separator: '\n',
            show_size: false,
            groups_written: 0,
        }
    }

    /// Set the character written between member paths.
    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Print a `size [N]:` label before each group.
    #[must_use]
    pub fn with_show_size(mut self, show_size: bool) -> Self {
        self.show_size = show_size;
        self
    }

    /// Number of groups written so far.
    #[must_use]
    pub fn groups_written(&self) -> usize {
        self.groups_written
    }

    /// Write one group and flush. Empty groups produce no output.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn write_group(&mut self, group: &DuplicateGroup) -> io::Result<()> {
        if group.is_empty() {
            return Ok(());
        }

        if self.show_size {
            writeln!(self.writer, "size [{}]:", group.size)?;
        }

        let mut buf = [0u8; 4];
        let separator = self.separator.encode_utf8(&mut buf).as_bytes();
        for (index, path) in group.files.iter().enumerate() {
            if index > 0 {
                self.writer.write_all(separator)?;
            }
            write_path(&mut self.writer, path)?;
        }
        self.writer.write_all(b"\n\n")?;
        self.writer.flush()?;

        self.groups_written += 1;
        Ok(())
    }

    /// Write every group from a lazy sequence, stopping at the first error.
    ///
    /// Groups already written stay written; the error is returned after them.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline error, or a write failure wrapped as
    /// [`ReportError::Io`].
    pub fn report<I>(&mut self, groups: I) -> Result<usize, ReportError>
    where
        I: IntoIterator<Item = Result<DuplicateGroup, FinderError>>,
    {
        for group in groups {
            self.write_group(&group?)?;
        }
        Ok(self.groups_written)
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(unix)]
fn write_path<W: Write>(writer: &mut W, path: &Path) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    writer.write_all(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn write_path<W: Write>(writer: &mut W, path: &Path) -> io::Result<()> {
    write!(writer, "{}", path.display())
}

/// Failure while producing the report.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// The pipeline failed while producing groups.
    #[error(transparent)]
    Finder(#[from] FinderError),

    /// The output could not be written.
    #[error("Failed to write report: {0}")]
    Io(#[from] io::Error),
}
