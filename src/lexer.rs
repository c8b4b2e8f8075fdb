//! Expression-level lexer. Tokenizes a single logical line (already stitched
//! together across continuations by the line parser) into tokens the Pratt
//! parser consumes.

use crate::error::DslError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    String,
    Name,
    And,
    Or,
    Not,
    True,
    False,
    EqEq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBrack,
    RBrack,
    Comma,
    Dot,
    Colon,
    Eq,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// 0-based offset into the line being tokenized.
    pub column: usize,
}

/// Tokenizes `text`. `base_column` is the 1-based column in the original
/// source where `text` begins, used to translate token offsets into
/// absolute source locations; `line`/`source_line` feed error reporting.
pub struct ExpressionLexer<'a> {
    text: &'a str,
    chars: Vec<char>,
    index: usize,
    base_column: usize,
    line: usize,
    source_line: &'a str,
}

impl<'a> ExpressionLexer<'a> {
    pub fn new(text: &'a str, base_column: usize, line: usize, source_line: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            index: 0,
            base_column,
            line,
            source_line,
        }
    }

    fn error(&self, message: impl Into<String>, column: usize) -> DslError {
        DslError::syntax(message, self.line, self.base_column + column, self.source_line)
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, DslError> {
        let mut tokens = Vec::new();
        while self.index < self.chars.len() {
            let ch = self.chars[self.index];
            if ch.is_whitespace() {
                self.index += 1;
                continue;
            }

            let start = self.index;
            let two: Option<(char, char)> = self.chars.get(self.index + 1).map(|&c2| (ch, c2));
            if let Some(kind) = two.and_then(|(a, b)| match (a, b) {
                ('=', '=') => Some(TokenKind::EqEq),
                ('!', '=') => Some(TokenKind::Neq),
                ('<', '=') => Some(TokenKind::Lte),
                ('>', '=') => Some(TokenKind::Gte),
                _ => None,
            }) {
                let value: String = self.chars[self.index..self.index + 2].iter().collect();
                tokens.push(Token { kind, value, column: start });
                self.index += 2;
                continue;
            }

            if let Some(kind) = single_char_kind(ch) {
                tokens.push(Token {
                    kind,
                    value: ch.to_string(),
                    column: start,
                });
                self.index += 1;
                continue;
            }

            if ch.is_ascii_digit() {
                self.index += 1;
                while self.index < self.chars.len() && self.chars[self.index].is_ascii_digit() {
                    self.index += 1;
                }
                let value: String = self.chars[start..self.index].iter().collect();
                tokens.push(Token {
                    kind: TokenKind::Number,
                    value,
                    column: start,
                });
                continue;
            }

            if ch == '\'' || ch == '"' {
                tokens.push(self.read_string()?);
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                self.index += 1;
                while self.index < self.chars.len() {
                    let c = self.chars[self.index];
                    if c.is_alphanumeric() || c == '_' {
                        self.index += 1;
                        continue;
                    }
                    break;
                }
                let value: String = self.chars[start..self.index].iter().collect();
                let kind = match value.as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "not" => TokenKind::Not,
                    "True" | "true" => TokenKind::True,
                    "False" | "false" => TokenKind::False,
                    _ => TokenKind::Name,
                };
                tokens.push(Token { kind, value, column: start });
                continue;
            }

            return Err(self.error(format!("Unexpected character '{ch}'"), start));
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            value: String::new(),
            column: self.chars.len(),
        });
        Ok(tokens)
    }

    fn read_string(&mut self) -> Result<Token, DslError> {
        let quote = self.chars[self.index];
        let start = self.index;
        self.index += 1;
        let mut out = String::new();
        while self.index < self.chars.len() {
            let ch = self.chars[self.index];
            if ch == quote {
                self.index += 1;
                return Ok(Token {
                    kind: TokenKind::String,
                    value: out,
                    column: start,
                });
            }
            if ch == '\\' {
                if self.index + 1 >= self.chars.len() {
                    return Err(self.error("Unterminated escape in string literal", start));
                }
                let escaped = self.chars[self.index + 1];
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '\\' => '\\',
                    '\'' => '\'',
                    '"' => '"',
                    other => other,
                });
                self.index += 2;
                continue;
            }
            out.push(ch);
            self.index += 1;
        }
        Err(self.error("Unterminated string literal", start))
    }

    #[allow(dead_code)]
    fn source_line_ref(&self) -> &str {
        self.source_line
    }

    #[allow(dead_code)]
    fn text_ref(&self) -> &str {
        self.text
    }
}

fn single_char_kind(ch: char) -> Option<TokenKind> {
    Some(match ch {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '[' => TokenKind::LBrack,
        ']' => TokenKind::RBrack,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        ':' => TokenKind::Colon,
        '=' => TokenKind::Eq,
        '<' => TokenKind::Lt,
        '>' => TokenKind::Gt,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        ExpressionLexer::new(text, 1, 1, text)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_comparisons() {
        assert_eq!(
            kinds("a == b"),
            vec![TokenKind::Name, TokenKind::EqEq, TokenKind::Name, TokenKind::Eof]
        );
    }

    #[test]
    fn tokenizes_string_with_escapes() {
        let tokens = ExpressionLexer::new(r#" "a\nb" "#, 1, 1, r#" "a\nb" "#)
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "a\nb");
    }

    #[test]
    fn unterminated_string_is_error() {
        assert!(ExpressionLexer::new("'abc", 1, 1, "'abc").tokenize().is_err());
    }
}
