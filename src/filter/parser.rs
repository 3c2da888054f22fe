//! Parser for tokenized filter conditions

use super::lexer::Token;
use super::{FilterExpr, FilterParseError};
use crate::record::FieldValue;

/// Parse a token stream into a single comparison expression.
///
/// The grammar is deliberately flat: one field, one operator, literal
/// operands. Nested boolean expressions and OR are not part of the filter
/// language; multiple conditions AND-combine at the [`super::FilterSet`]
/// level.
pub fn parse(tokens: &[Token]) -> Result<FilterExpr, FilterParseError> {
    let mut cursor = Cursor {
        tokens,
        position: 0,
    };

    let field = cursor.expect_ident()?;
    let expr = match cursor.next()? {
        Token::OpEq => FilterExpr::Eq {
            field,
            value: cursor.expect_literal()?,
        },
        Token::OpGt => FilterExpr::Gt {
            field,
            value: cursor.expect_number()?,
        },
        Token::OpLt => FilterExpr::Lt {
            field,
            value: cursor.expect_number()?,
        },
        Token::KeywordIn => {
            cursor.expect(Token::Lpar)?;
            let mut values = vec![cursor.expect_literal()?];
            loop {
                match cursor.next()? {
                    Token::Comma => values.push(cursor.expect_literal()?),
                    Token::Rpar => break,
                    other => {
                        return Err(FilterParseError::UnexpectedToken {
                            expected: ", or )".to_string(),
                            found: other.to_string(),
                        })
                    }
                }
            }
            FilterExpr::In { field, values }
        }
        Token::KeywordBetween => {
            let low = cursor.expect_number()?;
            cursor.expect(Token::KeywordAnd)?;
            let high = cursor.expect_number()?;
            FilterExpr::Between { field, low, high }
        }
        Token::KeywordLike => {
            let pattern = match cursor.next()? {
                Token::Str(s) => s,
                other => {
                    return Err(FilterParseError::UnexpectedToken {
                        expected: "string pattern".to_string(),
                        found: other.to_string(),
                    })
                }
            };
            FilterExpr::like(field, &pattern)?
        }
        other => {
            return Err(FilterParseError::UnexpectedToken {
                expected: "comparison operator".to_string(),
                found: other.to_string(),
            })
        }
    };

    cursor.expect_eof()?;
    Ok(expr)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl Cursor<'_> {
    fn next(&mut self) -> Result<Token, FilterParseError> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or(FilterParseError::UnexpectedEof)?;
        self.position += 1;
        Ok(token)
    }

    fn expect(&mut self, want: Token) -> Result<(), FilterParseError> {
        let found = self.next()?;
        if found == want {
            Ok(())
        } else {
            Err(FilterParseError::UnexpectedToken {
                expected: want.to_string(),
                found: found.to_string(),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<String, FilterParseError> {
        match self.next()? {
            Token::Ident(name) => Ok(name),
            other => Err(FilterParseError::UnexpectedToken {
                expected: "field name".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect_number(&mut self) -> Result<f64, FilterParseError> {
        match self.next()? {
            Token::Number(n) => Ok(n),
            other => Err(FilterParseError::UnexpectedToken {
                expected: "number".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect_literal(&mut self) -> Result<FieldValue, FilterParseError> {
        match self.next()? {
            Token::Str(s) => Ok(FieldValue::str(s)),
            Token::Number(n) => Ok(FieldValue::Float(n)),
            other => Err(FilterParseError::UnexpectedToken {
                expected: "literal value".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect_eof(&mut self) -> Result<(), FilterParseError> {
        match self.tokens.get(self.position) {
            None => Ok(()),
            Some(extra) => Err(FilterParseError::UnexpectedToken {
                expected: "end of condition".to_string(),
                found: extra.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse_str(input: &str) -> Result<FilterExpr, FilterParseError> {
        parse(&tokenize(input)?)
    }

    #[test]
    fn test_parse_equality() {
        let expr = parse_str("severity = \"high\"").unwrap();
        match expr {
            FilterExpr::Eq { field, value } => {
                assert_eq!(field, "severity");
                assert_eq!(value.as_str(), Some("high"));
            }
            other => panic!("unexpected expr: {:?}", other),
        }
    }

    #[test]
    fn test_parse_in_list() {
        let expr = parse_str("protocol IN (\"HTTP\", \"HTTPS\")").unwrap();
        match expr {
            FilterExpr::In { field, values } => {
                assert_eq!(field, "protocol");
                assert_eq!(values.len(), 2);
            }
            other => panic!("unexpected expr: {:?}", other),
        }
    }

    #[test]
    fn test_parse_between() {
        let expr = parse_str("cpu BETWEEN 50 AND 90").unwrap();
        assert!(matches!(
            expr,
            FilterExpr::Between { low, high, .. } if low == 50.0 && high == 90.0
        ));
    }

    #[test]
    fn test_parse_threshold() {
        assert!(matches!(
            parse_str("bytes_transferred > 1000000").unwrap(),
            FilterExpr::Gt { .. }
        ));
        assert!(matches!(
            parse_str("utilization < 50").unwrap(),
            FilterExpr::Lt { .. }
        ));
    }

    #[test]
    fn test_parse_like() {
        assert!(matches!(
            parse_str("location LIKE \"Edge%\"").unwrap(),
            FilterExpr::Like { .. }
        ));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        assert!(parse_str("cpu > 50 extra").is_err());
    }

    #[test]
    fn test_missing_operand_rejected() {
        assert!(matches!(
            parse_str("cpu >"),
            Err(FilterParseError::UnexpectedEof)
        ));
    }
}
