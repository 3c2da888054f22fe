//! Tokenizer for filter condition strings

use std::fmt;

use super::FilterParseError;

/// Token types in a filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Field or bare-word identifier
    Ident(String),
    /// Numeric literal
    Number(f64),
    /// Quoted string literal
    Str(String),
    /// Equals operator
    OpEq,
    /// Greater than operator
    OpGt,
    /// Less than operator
    OpLt,
    /// Left parenthesis
    Lpar,
    /// Right parenthesis
    Rpar,
    /// Value-list separator
    Comma,
    /// IN keyword
    KeywordIn,
    /// BETWEEN keyword
    KeywordBetween,
    /// AND keyword
    KeywordAnd,
    /// LIKE keyword
    KeywordLike,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{}", s),
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::OpEq => write!(f, "="),
            Token::OpGt => write!(f, ">"),
            Token::OpLt => write!(f, "<"),
            Token::Lpar => write!(f, "("),
            Token::Rpar => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::KeywordIn => write!(f, "IN"),
            Token::KeywordBetween => write!(f, "BETWEEN"),
            Token::KeywordAnd => write!(f, "AND"),
            Token::KeywordLike => write!(f, "LIKE"),
        }
    }
}

impl Token {
    /// Check whether a bare word is a keyword
    fn from_keyword(word: &str) -> Option<Token> {
        if word.eq_ignore_ascii_case("in") {
            Some(Token::KeywordIn)
        } else if word.eq_ignore_ascii_case("between") {
            Some(Token::KeywordBetween)
        } else if word.eq_ignore_ascii_case("and") {
            Some(Token::KeywordAnd)
        } else if word.eq_ignore_ascii_case("like") {
            Some(Token::KeywordLike)
        } else {
            None
        }
    }
}

/// Tokenize a filter condition string.
///
/// Conditions are single comparisons (`protocol = "TCP"`,
/// `utilization BETWEEN 50 AND 90`), so the whole token stream is collected
/// up front.
pub fn tokenize(input: &str) -> Result<Vec<Token>, FilterParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '=' => {
                chars.next();
                tokens.push(Token::OpEq);
            }
            '>' => {
                chars.next();
                tokens.push(Token::OpGt);
            }
            '<' => {
                chars.next();
                tokens.push(Token::OpLt);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Lpar);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Rpar);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '"' | '\'' => {
                let quote = ch;
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(FilterParseError::UnterminatedString);
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut literal = String::new();
                literal.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' || d == '_' {
                        if d != '_' {
                            literal.push(d);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number: f64 = literal
                    .parse()
                    .map_err(|_| FilterParseError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' || d == '.' || d == '-' {
                        word.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match Token::from_keyword(&word) {
                    Some(keyword) => tokens.push(keyword),
                    None => tokens.push(Token::Ident(word)),
                }
            }
            other => return Err(FilterParseError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}
