//! Diagnostic formatting for parse errors.

use common::line_containing;

use crate::error::ParseError;

/// Format one error as `name:line:col: message` followed by the offending
/// source line and a caret.
pub fn format_error(err: &ParseError, source: &str, name: &str) -> String {
    let line = line_containing(source, err.begin.offset as usize);
    let caret_pad = " ".repeat(err.begin.col.saturating_sub(1) as usize);
    format!(
        "{}:{}:{}: {}\n  {}\n  {}^",
        name,
        err.begin.line,
        err.begin.col,
        err.message(),
        line,
        caret_pad
    )
}

/// Format a batch of errors, one block per error.
pub fn format_errors(errors: &[ParseError], source: &str, name: &str) -> String {
    errors
        .iter()
        .map(|e| format_error(e, source, name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use common::SourceLoc;

    #[test]
    fn caret_lines_up_with_column() {
        let err = ParseError::new(
            ErrorKind::Syntax,
            SourceLoc::new(2, 1, 3),
            SourceLoc::new(3, 1, 4),
        );
        let out = format_error(&err, "1+!", "calc");
        assert_eq!(out, "calc:1:3: syntax error\n  1+!\n    ^");
    }

    #[test]
    fn second_line_errors_show_their_own_line() {
        let err = ParseError::new(
            ErrorKind::InvalidEof,
            SourceLoc::new(4, 2, 1),
            SourceLoc::new(4, 2, 1),
        );
        let out = format_error(&err, "ok\n!rest", "f");
        assert_eq!(out, "f:2:1: expected end of input\n  !rest\n  ^");
    }
}
