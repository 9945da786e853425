use crate::error::SyntaxError;
use crate::parser::ast::CompareOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    And,
    Or,
    Not,
    Compare(CompareOp),
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        match word.to_ascii_lowercase().as_str() {
            "and" => Some(Keyword::And),
            "or" => Some(Keyword::Or),
            "not" => Some(Keyword::Not),
            other => CompareOp::from_keyword(other).map(Keyword::Compare),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Attribute name, possibly with embedded dots (`name.formatted`)
    Identifier,
    /// Unescaped contents of a double-quoted literal
    StringLiteral(String),
    NumberLiteral(serde_json::Number),
    BooleanLiteral(bool),
    Keyword(Keyword),
    Punct(Punct),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Lexeme exactly as it appears in the input
    pub text: String,
    /// Byte offset of the first character of the lexeme
    pub offset: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Identifier => format!("attribute '{}'", self.text),
            TokenKind::StringLiteral(_) => format!("string {}", self.text),
            TokenKind::NumberLiteral(_) => format!("number {}", self.text),
            TokenKind::BooleanLiteral(_) => format!("boolean {}", self.text),
            TokenKind::Keyword(_) => format!("keyword '{}'", self.text),
            TokenKind::Punct(_) => format!("'{}'", self.text),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Split a filter string into tokens. Whitespace separates tokens and is
/// never emitted.
pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let punct = match c {
            '(' => Some(Punct::LParen),
            ')' => Some(Punct::RParen),
            '[' => Some(Punct::LBracket),
            ']' => Some(Punct::RBracket),
            '.' => Some(Punct::Dot),
            _ => None,
        };
        if let Some(punct) = punct {
            chars.next();
            tokens.push(Token {
                kind: TokenKind::Punct(punct),
                text: c.to_string(),
                offset: start,
            });
            continue;
        }

        if c == '"' {
            tokens.push(lex_string(input, start, &mut chars)?);
            continue;
        }

        if c.is_ascii_digit() || (c == '-' && next_is_digit(input, start + 1)) {
            tokens.push(lex_number(input, start, &mut chars)?);
            continue;
        }

        if is_ident_start(c) {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if !is_ident_char(ch) {
                    break;
                }
                end = i + ch.len_utf8();
                chars.next();
            }
            let text = &input[start..end];
            let kind = match text {
                "true" => TokenKind::BooleanLiteral(true),
                "false" => TokenKind::BooleanLiteral(false),
                _ => match Keyword::lookup(text) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Identifier,
                },
            };
            tokens.push(Token {
                kind,
                text: text.to_string(),
                offset: start,
            });
            continue;
        }

        return Err(SyntaxError::new(
            start,
            format!("unrecognized character '{}'", c),
        ));
    }

    Ok(tokens)
}

fn next_is_digit(input: &str, at: usize) -> bool {
    input[at..].chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn lex_string(
    input: &str,
    start: usize,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<Token, SyntaxError> {
    chars.next(); // opening quote
    let mut value = String::new();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => {
                return Ok(Token {
                    kind: TokenKind::StringLiteral(value),
                    text: input[start..i + 1].to_string(),
                    offset: start,
                });
            }
            '\\' => match chars.next() {
                Some((_, '"')) => value.push('"'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, other)) => {
                    return Err(SyntaxError::new(
                        i,
                        format!("invalid escape sequence '\\{}'", other),
                    ));
                }
                None => break,
            },
            other => value.push(other),
        }
    }

    Err(SyntaxError::new(start, "unterminated string literal"))
}

fn lex_number(
    input: &str,
    start: usize,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<Token, SyntaxError> {
    let mut end = start;
    let mut seen_dot = false;

    if let Some(&(i, '-')) = chars.peek() {
        end = i + 1;
        chars.next();
    }
    while let Some(&(i, ch)) = chars.peek() {
        if ch.is_ascii_digit() {
            end = i + 1;
            chars.next();
        } else if ch == '.' && !seen_dot && next_is_digit(input, i + 1) {
            seen_dot = true;
            end = i + 1;
            chars.next();
        } else {
            break;
        }
    }

    let text = &input[start..end];
    let as_float = || text.parse::<f64>().ok().and_then(serde_json::Number::from_f64);
    // Integers too wide for i64 widen to u64, then to f64
    let number = if seen_dot {
        as_float()
    } else {
        text.parse::<i64>()
            .map(serde_json::Number::from)
            .or_else(|_| text.parse::<u64>().map(serde_json::Number::from))
            .ok()
            .or_else(as_float)
    };

    match number {
        Some(number) => Ok(Token {
            kind: TokenKind::NumberLiteral(number),
            text: text.to_string(),
            offset: start,
        }),
        None => Err(SyntaxError::new(start, format!("invalid number '{}'", text))),
    }
}
