use thiserror::Error;

/// A single byte-span replacement against the *original* buffer. Inserts are
/// empty spans and deletes have empty text.
///
/// Offsets are local to the buffer (absolute positions minus the file base).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Text spliced in place of [byte_start, byte_end)
    pub new_text: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Invalid byte range: [{byte_start}, {byte_end}) in buffer of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("Position {pos} precedes file base {base}")]
    BeforeBase { pos: usize, base: usize },

    #[error(
        "Overlapping edits: [{first_start}, {first_end}) and [{second_start}, {second_end})"
    )]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("Edits would create malformed UTF-8")]
    InvalidUtf8Edit,
}

/// Collects edits over an immutable source buffer and splices them on demand.
///
/// Positions passed to [`insert`](Self::insert), [`replace`](Self::replace)
/// and [`delete`](Self::delete) are absolute: the buffer subtracts `base`,
/// the file's offset within the set of parsed files. Edits may be recorded in
/// any order; they are sorted once in [`materialize`](Self::materialize).
#[derive(Debug)]
pub struct EditBuffer<'a> {
    original: &'a [u8],
    base: usize,
    edits: Vec<Edit>,
}

impl<'a> EditBuffer<'a> {
    pub fn new(original: &'a [u8], base: usize) -> Self {
        Self {
            original,
            base,
            edits: Vec::new(),
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn original(&self) -> &'a [u8] {
        self.original
    }

    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Edits in recording order.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn insert(&mut self, pos: usize, text: impl Into<String>) -> Result<(), EditError> {
        self.record(pos, pos, text.into())
    }

    pub fn replace(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<(), EditError> {
        self.record(start, end, text.into())
    }

    pub fn delete(&mut self, start: usize, end: usize) -> Result<(), EditError> {
        self.record(start, end, String::new())
    }

    fn record(
        &mut self,
        start: usize,
        end: usize,
        new_text: String,
    ) -> Result<(), EditError> {
        let byte_start = self.local(start)?;
        let byte_end = self.local(end)?;

        if byte_start > byte_end || byte_end > self.original.len() {
            return Err(EditError::InvalidByteRange {
                byte_start,
                byte_end,
                len: self.original.len(),
            });
        }

        self.edits.push(Edit {
            byte_start,
            byte_end,
            new_text,
        });
        Ok(())
    }

    fn local(&self, pos: usize) -> Result<usize, EditError> {
        pos.checked_sub(self.base).ok_or(EditError::BeforeBase {
            pos,
            base: self.base,
        })
    }

    /// Produce the rewritten buffer.
    ///
    /// Edits are ordered by start offset, zero-width inserts first at a shared
    /// offset, then by recording order. Two edits whose ranges intersect are
    /// rejected: each source span may be claimed by one rewrite only.
    pub fn materialize(&self) -> Result<String, EditError> {
        let mut ordered: Vec<&Edit> = self.edits.iter().collect();
        // Stable sort keeps recording order for identical ranges
        ordered.sort_by_key(|edit| (edit.byte_start, edit.byte_end));

        for window in ordered.windows(2) {
            let (first, second) = (window[0], window[1]);
            if first.byte_end > second.byte_start {
                return Err(EditError::Overlap {
                    first_start: first.byte_start,
                    first_end: first.byte_end,
                    second_start: second.byte_start,
                    second_end: second.byte_end,
                });
            }
        }

        let added: usize = ordered.iter().map(|edit| edit.new_text.len()).sum();
        let mut out = Vec::with_capacity(self.original.len() + added);
        let mut cursor = 0;
        for edit in ordered {
            out.extend_from_slice(&self.original[cursor..edit.byte_start]);
            out.extend_from_slice(edit.new_text.as_bytes());
            cursor = edit.byte_end;
        }
        out.extend_from_slice(&self.original[cursor..]);

        String::from_utf8(out).map_err(|_| EditError::InvalidUtf8Edit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edits_is_identity() {
        let buf = EditBuffer::new(b"package main\n", 1);
        assert_eq!(buf.materialize().unwrap(), "package main\n");
    }

    #[test]
    fn edits_use_absolute_positions() {
        let source = b"hello world";
        let mut buf = EditBuffer::new(source, 100);
        buf.replace(100, 105, "HELLO").unwrap();
        buf.insert(111, "!").unwrap();
        assert_eq!(buf.materialize().unwrap(), "HELLO world!");
    }

    #[test]
    fn append_order_is_irrelevant() {
        let source = b"line1\nline2\nline3\n";
        let mut buf = EditBuffer::new(source, 0);
        buf.replace(12, 17, "LINE3").unwrap();
        buf.delete(6, 12).unwrap();
        buf.replace(0, 5, "LINE1").unwrap();
        assert_eq!(buf.materialize().unwrap(), "LINE1\nLINE3\n");
    }

    #[test]
    fn insert_before_replace_at_same_offset() {
        let mut buf = EditBuffer::new(b"foo(x)", 0);
        buf.replace(0, 3, "bar").unwrap();
        buf.insert(0, "pkg.").unwrap();
        buf.insert(4, "1, ").unwrap();
        assert_eq!(buf.materialize().unwrap(), "pkg.bar(1, x)");
    }

    #[test]
    fn inserts_at_same_offset_keep_recording_order() {
        let mut buf = EditBuffer::new(b"()", 0);
        buf.insert(1, "a").unwrap();
        buf.insert(1, "b").unwrap();
        assert_eq!(buf.materialize().unwrap(), "(ab)");
    }

    #[test]
    fn inserts_and_deletes_are_recorded_as_spans() {
        let mut buf = EditBuffer::new(b"abcdef", 10);
        buf.insert(12, "X").unwrap();
        buf.delete(13, 15).unwrap();
        assert_eq!(
            buf.edits(),
            &[
                Edit {
                    byte_start: 2,
                    byte_end: 2,
                    new_text: "X".to_string(),
                },
                Edit {
                    byte_start: 3,
                    byte_end: 5,
                    new_text: String::new(),
                },
            ]
        );
        assert_eq!(buf.materialize().unwrap(), "abXcf");
    }

    #[test]
    fn adjacent_edits_do_not_overlap() {
        let mut buf = EditBuffer::new(b"abcdef", 0);
        buf.replace(0, 3, "X").unwrap();
        buf.replace(3, 6, "Y").unwrap();
        assert_eq!(buf.materialize().unwrap(), "XY");
    }

    #[test]
    fn overlapping_edits_are_rejected() {
        let mut buf = EditBuffer::new(b"abcdef", 0);
        buf.replace(0, 4, "X").unwrap();
        buf.delete(2, 6).unwrap();
        assert!(matches!(
            buf.materialize(),
            Err(EditError::Overlap {
                first_start: 0,
                first_end: 4,
                second_start: 2,
                second_end: 6,
            })
        ));
    }

    #[test]
    fn insert_inside_replaced_span_is_overlap() {
        let mut buf = EditBuffer::new(b"abcdef", 0);
        buf.replace(1, 5, "X").unwrap();
        buf.insert(3, "Y").unwrap();
        assert!(matches!(buf.materialize(), Err(EditError::Overlap { .. })));
    }

    #[test]
    fn out_of_range_edit_is_rejected_when_recorded() {
        let mut buf = EditBuffer::new(b"hello", 0);
        assert!(matches!(
            buf.replace(3, 9, "x"),
            Err(EditError::InvalidByteRange { .. })
        ));
        assert!(matches!(
            buf.replace(4, 2, "x"),
            Err(EditError::InvalidByteRange { .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn position_before_base_is_rejected() {
        let mut buf = EditBuffer::new(b"hello", 10);
        assert_eq!(
            buf.insert(3, "x"),
            Err(EditError::BeforeBase { pos: 3, base: 10 })
        );
    }

    #[test]
    fn splitting_a_multibyte_char_is_rejected() {
        let source = "é".as_bytes();
        let mut buf = EditBuffer::new(source, 0);
        buf.delete(0, 1).unwrap();
        assert_eq!(buf.materialize(), Err(EditError::InvalidUtf8Edit));
    }
}
