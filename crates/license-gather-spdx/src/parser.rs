//! SPDX license expression parser
//!
//! Recursive descent over the SPDX expression grammar:
//!
//! ```text
//! or    := and ("OR" and)*
//! and   := with ("AND" with)*
//! with  := atom ("WITH" exception-id)?
//! atom  := license-id | "(" or ")"
//! ```
//!
//! `WITH` binds tightest, then `AND`, then `OR`; both binary operators are
//! left-associative. Operators are accepted in upper or lower case.
//!
//! Parenthesis nesting is capped at [`MAX_NESTING`] levels and the number of
//! license identifiers at [`MAX_TERMS`], so parsed trees stay shallow enough
//! to walk recursively.

use tracing::trace;

use crate::error::{ParseError, Result};
use crate::expression::{LicenseExpression, SimpleLicense};

/// Deepest parenthesis nesting accepted
pub const MAX_NESTING: usize = 64;

/// Most license identifiers accepted in one expression
pub const MAX_TERMS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    LParen,
    RParen,
    And,
    Or,
    With,
    Ident(String),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

impl Token {
    fn text(&self) -> String {
        match &self.kind {
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::And => "AND".to_string(),
            TokenKind::Or => "OR".to_string(),
            TokenKind::With => "WITH".to_string(),
            TokenKind::Ident(id) => id.clone(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':')
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        match c {
            '(' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::LParen,
                    position,
                });
            }
            ')' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::RParen,
                    position,
                });
            }
            c if is_ident_char(c) => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                // "or later" suffix, only valid as the final character
                if let Some(&(_, '+')) = chars.peek() {
                    word.push('+');
                    chars.next();
                    if let Some(&(next_pos, next)) = chars.peek() {
                        if is_ident_char(next) || next == '+' {
                            return Err(ParseError::UnexpectedCharacter {
                                character: next,
                                position: next_pos,
                            });
                        }
                    }
                }

                let kind = match word.as_str() {
                    "AND" | "and" => TokenKind::And,
                    "OR" | "or" => TokenKind::Or,
                    "WITH" | "with" => TokenKind::With,
                    _ => TokenKind::Ident(word),
                };
                tokens.push(Token { kind, position });
            }
            other => {
                return Err(ParseError::UnexpectedCharacter {
                    character: other,
                    position,
                });
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    depth: usize,
    terms: usize,
}

/// A parsed atom and whether it was written in parentheses
struct Atom {
    expr: LicenseExpression,
    parenthesized: bool,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<LicenseExpression> {
        let mut expr = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            expr = expr.or(right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<LicenseExpression> {
        let mut expr = self.parse_with()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_with()?;
            expr = expr.and(right);
        }
        Ok(expr)
    }

    fn parse_with(&mut self) -> Result<LicenseExpression> {
        let atom = self.parse_atom()?;

        let with_position = match self.peek() {
            Some(Token {
                kind: TokenKind::With,
                position,
            }) => *position,
            _ => return Ok(atom.expr),
        };
        self.cursor += 1;

        // WITH only qualifies a bare license id, never a parenthesised one
        let license = match atom.expr {
            LicenseExpression::Simple(license)
                if license.exception.is_none() && !atom.parenthesized =>
            {
                license
            }
            _ => {
                return Err(ParseError::CompoundException {
                    position: with_position,
                })
            }
        };

        match self.next() {
            Some(Token {
                kind: TokenKind::Ident(exception),
                ..
            }) => Ok(LicenseExpression::Simple(license.with(exception))),
            Some(token) => Err(ParseError::UnexpectedToken {
                token: token.text(),
                position: token.position,
                expected: "an exception identifier",
            }),
            None => Err(ParseError::UnexpectedEnd {
                expected: "an exception identifier",
            }),
        }
    }

    fn parse_atom(&mut self) -> Result<Atom> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Ident(id),
                position,
            }) => {
                self.terms += 1;
                if self.terms > MAX_TERMS {
                    return Err(ParseError::TooManyTerms {
                        position,
                        limit: MAX_TERMS,
                    });
                }
                Ok(Atom {
                    expr: LicenseExpression::Simple(SimpleLicense::new(id)),
                    parenthesized: false,
                })
            }
            Some(Token {
                kind: TokenKind::LParen,
                position,
            }) => {
                if self.depth == MAX_NESTING {
                    return Err(ParseError::TooDeep {
                        position,
                        limit: MAX_NESTING,
                    });
                }
                self.depth += 1;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(Atom {
                        expr: inner,
                        parenthesized: true,
                    }),
                    Some(token) => Err(ParseError::UnexpectedToken {
                        token: token.text(),
                        position: token.position,
                        expected: "')'",
                    }),
                    None => Err(ParseError::UnclosedParenthesis { position }),
                }
            }
            Some(token) => Err(ParseError::UnexpectedToken {
                token: token.text(),
                position: token.position,
                expected: "a license identifier or '('",
            }),
            None => Err(ParseError::UnexpectedEnd {
                expected: "a license identifier or '('",
            }),
        }
    }
}

/// Parse an SPDX license expression such as
/// `"MIT OR (Apache-2.0 AND GPL-2.0-only WITH Classpath-exception-2.0)"`
pub fn parse_expression(input: &str) -> Result<LicenseExpression> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    trace!(tokens = tokens.len(), "parsing license expression");

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        terms: 0,
    };
    let expr = parser.parse_or()?;

    if let Some(token) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            token: token.text(),
            position: token.position,
            expected: "AND, OR or end of expression",
        });
    }

    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lic(id: &str) -> LicenseExpression {
        LicenseExpression::license(id)
    }

    #[test]
    fn test_parse_single() {
        assert_eq!(parse_expression("MIT").unwrap(), lic("MIT"));
        assert_eq!(parse_expression("  Apache-2.0 ").unwrap(), lic("Apache-2.0"));
    }

    #[test]
    fn test_parse_or_later_and_refs() {
        assert_eq!(parse_expression("GPL-2.0+").unwrap(), lic("GPL-2.0+"));
        assert_eq!(
            parse_expression("LicenseRef-Proprietary").unwrap(),
            lic("LicenseRef-Proprietary")
        );
        assert_eq!(
            parse_expression("DocumentRef-spdx:LicenseRef-1").unwrap(),
            lic("DocumentRef-spdx:LicenseRef-1")
        );
    }

    #[test]
    fn test_parse_with() {
        assert_eq!(
            parse_expression("GPL-2.0-or-later WITH Classpath-exception-2.0").unwrap(),
            LicenseExpression::with_exception("GPL-2.0-or-later", "Classpath-exception-2.0")
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse_expression("MIT OR Apache-2.0 AND ISC").unwrap();
        assert_eq!(expr, lic("MIT").or(lic("Apache-2.0").and(lic("ISC"))));
    }

    #[test]
    fn test_left_associative() {
        let expr = parse_expression("MIT AND ISC AND Zlib").unwrap();
        assert_eq!(expr, lic("MIT").and(lic("ISC")).and(lic("Zlib")));

        let expr = parse_expression("MIT OR ISC OR Zlib").unwrap();
        assert_eq!(expr, lic("MIT").or(lic("ISC")).or(lic("Zlib")));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse_expression("(MIT OR Apache-2.0) AND ISC").unwrap();
        assert_eq!(expr, lic("MIT").or(lic("Apache-2.0")).and(lic("ISC")));
    }

    #[test]
    fn test_lowercase_operators() {
        let expr = parse_expression("mit or apache-2.0 with llvm-exception").unwrap();
        assert_eq!(
            expr,
            lic("mit").or(LicenseExpression::with_exception("apache-2.0", "llvm-exception"))
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse_expression(""), Err(ParseError::Empty));
        assert_eq!(parse_expression("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_dangling_operator() {
        assert!(matches!(
            parse_expression("MIT AND"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_expression("OR MIT"),
            Err(ParseError::UnexpectedToken { position: 0, .. })
        ));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(
            parse_expression("(MIT OR ISC"),
            Err(ParseError::UnclosedParenthesis { position: 0 })
        );
        let err = parse_expression("MIT OR ISC)").unwrap_err();
        assert_eq!(err.position(), Some(10));
    }

    #[test]
    fn test_with_on_compound_is_rejected() {
        assert_eq!(
            parse_expression("(MIT OR ISC) WITH Classpath-exception-2.0"),
            Err(ParseError::CompoundException { position: 13 })
        );
    }

    #[test]
    fn test_with_on_parenthesized_license_is_rejected() {
        assert_eq!(
            parse_expression("(MIT) WITH Classpath-exception-2.0"),
            Err(ParseError::CompoundException { position: 6 })
        );
        assert_eq!(
            parse_expression("(GPL-2.0-only WITH Classpath-exception-2.0)").unwrap(),
            LicenseExpression::with_exception("GPL-2.0-only", "Classpath-exception-2.0")
        );
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}MIT{}", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(parse_expression(&nested(MAX_NESTING)).unwrap(), lic("MIT"));
        assert_eq!(
            parse_expression(&nested(MAX_NESTING + 1)),
            Err(ParseError::TooDeep {
                position: MAX_NESTING,
                limit: MAX_NESTING
            })
        );

        let err = parse_expression(&nested(1000)).unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { .. }));
    }

    #[test]
    fn test_nesting_depth_is_not_cumulative() {
        let group = format!("{}MIT{}", "(".repeat(40), ")".repeat(40));
        let expr = format!("{} AND {}", group, group);
        assert_eq!(parse_expression(&expr).unwrap(), lic("MIT").and(lic("MIT")));
    }

    #[test]
    fn test_term_limit() {
        let chain = |terms: usize| vec!["MIT"; terms].join(" AND ");

        let expr = parse_expression(&chain(MAX_TERMS)).unwrap();
        assert_eq!(expr.licenses().len(), MAX_TERMS);

        // "MIT AND " is 8 bytes, so term N starts at (N - 1) * 8
        assert_eq!(
            parse_expression(&chain(MAX_TERMS + 1)),
            Err(ParseError::TooManyTerms {
                position: MAX_TERMS * 8,
                limit: MAX_TERMS
            })
        );

        let err = parse_expression(&chain(20_000)).unwrap_err();
        assert!(matches!(err, ParseError::TooManyTerms { .. }));
    }

    #[test]
    fn test_missing_exception() {
        assert!(matches!(
            parse_expression("GPL-2.0-only WITH"),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse_expression("GPL-2.0-only WITH (MIT)"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            parse_expression("MIT / ISC"),
            Err(ParseError::UnexpectedCharacter {
                character: '/',
                position: 4
            })
        );
        assert!(matches!(
            parse_expression("GPL-2.0+x"),
            Err(ParseError::UnexpectedCharacter { character: 'x', .. })
        ));
    }

    #[test]
    fn test_adjacent_identifiers() {
        assert!(matches!(
            parse_expression("MIT ISC"),
            Err(ParseError::UnexpectedToken { position: 4, .. })
        ));
    }
}
