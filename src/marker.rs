//! Position markers.
//!
//! Rewritten spans are followed by a Go line directive comment,
//! `/*line :L:C*/`, so the Go toolchain reports diagnostics against the
//! original line and column.

use std::fmt;

/// 1-based line and byte column in the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineMarker {
    pub line: usize,
    pub column: usize,
}

const PREFIX: &str = "/*line :";
const SUFFIX: &str = "*/";

impl LineMarker {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Parse a marker of the form `/*line :L:C*/`. Surrounding text is not
    /// accepted.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
        let (line, column) = body.split_once(':')?;
        let line = line.parse().ok()?;
        let column = column.parse().ok()?;
        if line == 0 || column == 0 {
            return None;
        }
        Some(Self { line, column })
    }
}

impl fmt::Display for LineMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}:{}{SUFFIX}", self.line, self.column)
    }
}

/// Every well-formed marker in `text`, with its byte offset.
pub fn scan_markers(text: &str) -> Vec<(usize, LineMarker)> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some(rel) = text[from..].find(PREFIX) {
        let start = from + rel;
        let Some(end_rel) = text[start..].find(SUFFIX) else {
            break;
        };
        let end = start + end_rel + SUFFIX.len();
        if let Some(marker) = LineMarker::parse(&text[start..end]) {
            found.push((start, marker));
        }
        from = start + PREFIX.len();
    }
    found
}

/// Maps absolute positions of one file to line/column.
#[derive(Debug, Clone)]
pub struct LineIndex {
    base: usize,
    len: usize,
    /// Local offsets at which each line starts
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str, base: usize) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            base,
            len: source.len(),
            line_starts,
        }
    }

    /// Line and column of absolute position `pos`; `None` outside the file.
    pub fn position(&self, pos: usize) -> Option<LineMarker> {
        let offset = pos.checked_sub(self.base)?;
        if offset > self.len {
            return None;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let column = offset - self.line_starts[line - 1] + 1;
        Some(LineMarker { line, column })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_format() {
        assert_eq!(LineMarker::new(12, 7).to_string(), "/*line :12:7*/");
    }

    #[test]
    fn marker_parse() {
        assert_eq!(
            LineMarker::parse("/*line :3:14*/"),
            Some(LineMarker::new(3, 14))
        );
        assert_eq!(LineMarker::parse("/*line :3*/"), None);
        assert_eq!(LineMarker::parse("/*line :0:1*/"), None);
        assert_eq!(LineMarker::parse("/* line :3:4 */"), None);
        assert_eq!(LineMarker::parse("/*line :x:4*/"), None);
    }

    #[test]
    fn scan_finds_all_markers() {
        let text = "f(1, 2,/*line :4:3*/x) // /*line :bad*/ g(/*line :9:10*/)";
        let found = scan_markers(text);
        assert_eq!(
            found,
            vec![
                (7, LineMarker::new(4, 3)),
                (42, LineMarker::new(9, 10)),
            ]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let index = LineIndex::new("ab\ncd\n", 10);
        assert_eq!(index.position(10), Some(LineMarker::new(1, 1)));
        assert_eq!(index.position(12), Some(LineMarker::new(1, 3)));
        assert_eq!(index.position(13), Some(LineMarker::new(2, 1)));
        assert_eq!(index.position(14), Some(LineMarker::new(2, 2)));
        assert_eq!(index.position(16), Some(LineMarker::new(3, 1)));
        assert_eq!(index.position(9), None);
        assert_eq!(index.position(17), None);
    }
}
