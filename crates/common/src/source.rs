//! Source locations and line extraction for diagnostics.

/// A position in source text.
///
/// The byte offset is the authoritative cursor; `line` and `col` are
/// 1-based counters maintained for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    /// Byte offset into the source text.
    pub offset: u32,
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based).
    pub col: u32,
}

impl SourceLoc {
    pub fn new(offset: u32, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }

    /// The location of the first character of a text.
    pub fn start() -> Self {
        Self::new(0, 1, 1)
    }
}

impl Default for SourceLoc {
    fn default() -> Self {
        Self::start()
    }
}

/// The full line of `source` containing the byte at `offset`, without its
/// trailing newline. An offset at or past the end yields the last line.
pub fn line_containing(source: &str, offset: usize) -> &str {
    let offset = offset.min(source.len());
    let start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = source[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(source.len());
    &source[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_line_one_col_one() {
        let loc = SourceLoc::start();
        assert_eq!(loc.offset, 0);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.col, 1);
    }

    #[test]
    fn line_containing_single_line() {
        assert_eq!(line_containing("hello", 0), "hello");
        assert_eq!(line_containing("hello", 3), "hello");
    }

    #[test]
    fn line_containing_middle_line() {
        let src = "one\ntwo\nthree";
        assert_eq!(line_containing(src, 0), "one");
        assert_eq!(line_containing(src, 4), "two");
        assert_eq!(line_containing(src, 6), "two");
        assert_eq!(line_containing(src, 8), "three");
    }

    #[test]
    fn line_containing_past_end() {
        assert_eq!(line_containing("a\nb", 100), "b");
        assert_eq!(line_containing("", 0), "");
    }
}
