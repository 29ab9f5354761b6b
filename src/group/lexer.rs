//! Query tokenizer

use crate::tree::ConjunctionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    GroupBegin,
    GroupEnd,
    Conjunction(ConjunctionKind),
    /// Quote opening a literal that never closes
    UnterminatedQuote,
    /// One character (or one quoted literal) of an expression
    Expression,
    Eof,
}

/// A token with its byte span in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

/// Splits a query into parentheses, conjunction keywords and expression text
///
/// `AND` / `OR` are keywords only when followed by whitespace and preceded by
/// whitespace, a parenthesis or the start of input. Quoted literals are
/// opaque: keywords and parentheses inside them belong to the expression.
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn next_token(&mut self) -> Token {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }

        let start = self.pos;
        if start >= bytes.len() {
            return self.token(TokenKind::Eof, start);
        }

        match bytes[start] {
            b'(' => {
                self.pos += 1;
                self.token(TokenKind::GroupBegin, start)
            }
            b')' => {
                self.pos += 1;
                self.token(TokenKind::GroupEnd, start)
            }
            quote @ (b'"' | b'\'') if self.opens_literal(start) => {
                match bytes[start + 1..].iter().position(|&b| b == quote) {
                    Some(offset) => {
                        self.pos = start + 1 + offset + 1;
                        self.token(TokenKind::Expression, start)
                    }
                    None => {
                        self.pos = bytes.len();
                        self.token(TokenKind::UnterminatedQuote, start)
                    }
                }
            }
            _ => {
                if let Some((kind, end)) = self.keyword_at(start) {
                    self.pos = end;
                    return self.token(TokenKind::Conjunction(kind), start);
                }
                let width = self.src[start..].chars().next().map_or(1, char::len_utf8);
                self.pos += width;
                self.token(TokenKind::Expression, start)
            }
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            start,
            end: self.pos,
        }
    }

    /// A quote starts a literal only where a value can begin; inside a word
    /// (`O'Brien`) it is an ordinary character
    fn opens_literal(&self, start: usize) -> bool {
        start == 0
            || matches!(
                self.src.as_bytes()[start - 1],
                b' ' | b'\t' | b'\n' | b'\r' | b'=' | b'!' | b'<' | b'>' | b'(' | b'[' | b','
            )
    }

    fn keyword_at(&self, start: usize) -> Option<(ConjunctionKind, usize)> {
        let bytes = self.src.as_bytes();
        if start > 0 {
            let prev = bytes[start - 1];
            if !(prev.is_ascii_whitespace() || prev == b'(' || prev == b')') {
                return None;
            }
        }

        [(ConjunctionKind::And, "AND"), (ConjunctionKind::Or, "OR")]
            .into_iter()
            .find_map(|(kind, word)| {
                let end = start + word.len();
                let matches = bytes.len() > end
                    && bytes[start..end].eq_ignore_ascii_case(word.as_bytes())
                    && bytes[end].is_ascii_whitespace();
                matches.then_some((kind, end + 1))
            })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Expression)
            .collect()
    }

    #[test]
    fn test_keywords_and_parens() {
        assert_eq!(
            kinds("(a=1 or b=2) AND c=3"),
            vec![
                TokenKind::GroupBegin,
                TokenKind::Conjunction(ConjunctionKind::Or),
                TokenKind::GroupEnd,
                TokenKind::Conjunction(ConjunctionKind::And),
            ]
        );
    }

    #[test]
    fn test_keyword_needs_boundaries() {
        assert!(kinds("BRAND = x").is_empty());
        assert!(kinds("ORDER = x").is_empty());
        assert!(kinds("a = 1 AND").is_empty());
    }

    #[test]
    fn test_quoted_literal_is_opaque() {
        let tokens: Vec<Token> = Lexer::new("out = 'x AND (y)' OR z").collect();
        let quoted = tokens[4];
        assert_eq!(quoted.kind, TokenKind::Expression);
        assert_eq!((quoted.start, quoted.end), (6, 17));
        assert_eq!(
            kinds("out = 'x AND (y)' OR z"),
            vec![TokenKind::Conjunction(ConjunctionKind::Or)]
        );
    }

    #[test]
    fn test_quote_inside_word_is_plain() {
        assert_eq!(
            kinds("author = O'Brien AND state = 2"),
            vec![TokenKind::Conjunction(ConjunctionKind::And)]
        );
        assert_eq!(kinds("name=\"x OR y\" OR z"), vec![TokenKind::Conjunction(ConjunctionKind::Or)]);
    }

    #[test]
    fn test_unterminated_quote() {
        let tokens: Vec<Token> = Lexer::new("out = 'disk AND state = 2").collect();
        let last = tokens[tokens.len() - 1];
        assert_eq!(last.kind, TokenKind::UnterminatedQuote);
        assert_eq!(last.start, 6);
    }

    #[test]
    fn test_multibyte_characters() {
        let tokens: Vec<Token> = Lexer::new("näme = ü").collect();
        assert_eq!(tokens[1].start, 1);
        assert_eq!(tokens[1].end, 3);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Expression));
    }
}
