//! Source positions, spans and the diagnostic reporter.

pub mod report;

/// A loaded source file: the raw bytes, its path, and the lines pre-split
/// for cheap excerpt rendering. Lexer, parser and every `Span` borrow from
/// one of these for the lifetime of a single compile.
pub struct SourceFile {
    pub path: String,
    pub source: String,
    pub lines: Vec<String>,
}

impl SourceFile {
    pub fn new<P: Into<String>, S: Into<String>>(path: P, source: S) -> Self {
        let source = source.into();
        let lines = source.split('\n').map(|line| line.to_string()).collect();
        SourceFile {
            path: path.into(),
            source,
            lines,
        }
    }
}

/// One endpoint of a [`Span`]: byte offset into the source, 0-based line
/// number, and byte offset within that line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub index: usize,
    pub line_index: usize,
    pub lineno: usize,
}

/// A half-open `[from, to)` interval over a [`SourceFile`].
#[derive(Clone, Copy)]
pub struct Span<'a> {
    pub from: Position,
    pub to: Position,
    pub file: &'a SourceFile,
}

impl<'a> Span<'a> {
    /// The substring of the source between the two byte indices.
    pub fn string(&self) -> &'a str {
        &self.file.source[self.from.index..self.to.index]
    }

    /// Merges two spans, taking the min `from` and max `to` by byte index.
    pub fn merge(&self, other: Span<'a>) -> Span<'a> {
        let from = if self.from.index <= other.from.index {
            self.from
        } else {
            other.from
        };
        let to = if self.to.index >= other.to.index {
            self.to
        } else {
            other.to
        };
        Span {
            from,
            to,
            file: self.file,
        }
    }
}

impl<'a> std::fmt::Debug for Span<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.file.path,
            self.from.lineno + 1,
            self.from.line_index + 1,
            self.to.lineno + 1,
            self.to.line_index + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(index: usize, lineno: usize, line_index: usize) -> Position {
        Position {
            index,
            lineno,
            line_index,
        }
    }

    #[test]
    fn merge_takes_min_from_and_max_to() {
        let file = SourceFile::new("test.yum", "abcdef");
        let a = Span {
            from: pos(2, 0, 2),
            to: pos(4, 0, 4),
            file: &file,
        };
        let b = Span {
            from: pos(0, 0, 0),
            to: pos(3, 0, 3),
            file: &file,
        };
        let merged = a.merge(b);
        assert_eq!(merged.from.index, 0);
        assert_eq!(merged.to.index, 4);
    }

    #[test]
    fn string_slices_the_source() {
        let file = SourceFile::new("test.yum", "hello world");
        let span = Span {
            from: pos(0, 0, 0),
            to: pos(5, 0, 5),
            file: &file,
        };
        assert_eq!(span.string(), "hello");
    }
}
