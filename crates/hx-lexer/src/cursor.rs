/// Character cursor over a source string, tracking the byte offset of the
/// next unread character.
pub struct Cursor<'src> {
    source: &'src str,
    pos: u32,
    chars: std::str::Chars<'src>,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            chars: source.chars(),
        }
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn peek_next(&self) -> Option<char> {
        self.peek_nth(1)
    }

    /// The character `n` positions ahead (`peek_nth(0) == peek()`).
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n)
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8() as u32;
        Some(c)
    }

    /// Consume `c` if it is the next character.
    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Whether the unread input starts with `s`.
    pub fn starts_with(&self, s: &str) -> bool {
        self.chars.as_str().starts_with(s)
    }

    /// Source text between two byte offsets previously returned by [`Cursor::pos`].
    pub fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peeking_does_not_consume() {
        let cursor = Cursor::new("abc");
        assert_eq!(cursor.peek(), Some('a'));
        assert_eq!(cursor.peek_next(), Some('b'));
        assert_eq!(cursor.peek_nth(2), Some('c'));
        assert_eq!(cursor.peek_nth(3), None);
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn advance_counts_utf8_bytes() {
        let mut cursor = Cursor::new("\u{00E9}x");
        assert_eq!(cursor.advance(), Some('\u{00E9}'));
        assert_eq!(cursor.pos(), 2);
        assert_eq!(cursor.advance(), Some('x'));
        assert_eq!(cursor.peek(), None);
    }

    #[test]
    fn eat_and_eat_while() {
        let mut cursor = Cursor::new("==abc1");
        assert!(cursor.eat('='));
        assert!(!cursor.eat('x'));
        cursor.eat_while(|c| c == '=');
        cursor.eat_while(char::is_alphabetic);
        assert_eq!(cursor.pos(), 5);
        assert_eq!(cursor.slice(2, 5), "abc");
    }

    #[test]
    fn starts_with_checks_remaining_input() {
        let mut cursor = Cursor::new("a...b");
        cursor.advance();
        assert!(cursor.starts_with("..."));
        assert!(!cursor.starts_with("...b!"));
    }
}
