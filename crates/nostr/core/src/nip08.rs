//! NIP-08: Handling Mentions (deprecated in favour of NIP-27)
//!
//! Older clients reference tags from the content with `#[<index>]`, where the
//! index points into the event's tag list. A backreference only counts when
//! it starts the content or follows whitespace.

/// A `#[<digits>]` token found in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backreference<'a> {
    /// The digits between the brackets, unparsed
    pub digits: &'a str,
    /// Byte offset of `#`
    pub start: usize,
    /// Byte offset just past `]`
    pub end: usize,
}

impl Backreference<'_> {
    /// Tag index this token points at, or `None` if it doesn't fit in `usize`.
    pub fn index(&self) -> Option<usize> {
        self.digits.parse().ok()
    }
}

/// Lazy scanner over the backreferences in `content`.
///
/// Clone the iterator to restart from the same position.
#[derive(Debug, Clone)]
pub struct Backreferences<'a> {
    content: &'a str,
    pos: usize,
}

/// Scan `content` for `#[n]` backreferences.
pub fn backreferences(content: &str) -> Backreferences<'_> {
    Backreferences { content, pos: 0 }
}

// Whitespace as understood by `\s` in the classic regex dialects.
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}

impl<'a> Iterator for Backreferences<'a> {
    type Item = Backreference<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.content.as_bytes();

        while let Some(offset) = self.content[self.pos..].find("#[") {
            let start = self.pos + offset;
            self.pos = start + 2;

            if start > 0 && !is_space(bytes[start - 1]) {
                continue;
            }

            let digits_start = start + 2;
            let digits_len = bytes[digits_start..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let digits_end = digits_start + digits_len;

            if digits_len == 0 || bytes.get(digits_end) != Some(&b']') {
                continue;
            }

            self.pos = digits_end + 1;
            return Some(Backreference {
                digits: &self.content[digits_start..digits_end],
                start,
                end: self.pos,
            });
        }

        self.pos = self.content.len();
        None
    }
}
