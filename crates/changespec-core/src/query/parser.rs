use super::lexer::{Token, TokenKind};
use super::{Expr, QuerySyntaxError, Special};

/// Deepest nesting of parentheses and NOT accepted.
const MAX_DEPTH: usize = 256;
/// Longest token stream accepted. Also bounds the depth of AND/OR chains.
const MAX_TOKENS: usize = 4096;

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    /// Character length of the input, reported for end-of-input errors.
    end: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>, end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            end,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, QuerySyntaxError> {
        if self.tokens.is_empty() {
            return Err(QuerySyntaxError::new("empty query", 0));
        }
        if let Some(tok) = self.tokens.get(MAX_TOKENS) {
            return Err(QuerySyntaxError::new("query too long", tok.pos));
        }
        let expr = self.parse_or()?;
        if let Some(tok) = self.peek() {
            let message = match tok.kind {
                TokenKind::RParen => "unmatched ')'",
                _ => "unexpected trailing token",
            };
            return Err(QuerySyntaxError::new(message, tok.pos));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn descend(&mut self, pos: usize) -> Result<(), QuerySyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(QuerySyntaxError::new("query nested too deeply", pos));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, QuerySyntaxError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek_kind(), Some(TokenKind::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, QuerySyntaxError> {
        let mut left = self.parse_not()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::And) => {
                    self.advance();
                }
                // Juxtaposition is an implicit AND.
                Some(
                    TokenKind::LParen
                    | TokenKind::Not { .. }
                    | TokenKind::NotError
                    | TokenKind::Special(_)
                    | TokenKind::Term { .. },
                ) => {}
                _ => break,
            }
            let right = self.parse_not()?;
            left = Expr::and(left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, QuerySyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Not { bang }) => {
                let bang = *bang;
                let tok = self.advance();
                let nothing_to_negate = matches!(
                    self.peek_kind(),
                    None | Some(TokenKind::RParen | TokenKind::And | TokenKind::Or)
                );
                let pos = tok.map_or(self.end, |t| t.pos);
                if nothing_to_negate {
                    // A lone `!` is the error shorthand.
                    if bang {
                        return Ok(Expr::Special(Special::Error));
                    }
                    return Err(QuerySyntaxError::new("expected expression after NOT", pos));
                }
                self.descend(pos)?;
                let inner = self.parse_not()?;
                self.depth -= 1;
                Ok(Expr::not(inner))
            }
            Some(TokenKind::NotError) => {
                self.advance();
                Ok(Expr::not(Expr::Special(Special::Error)))
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, QuerySyntaxError> {
        let Some(tok) = self.advance() else {
            return Err(QuerySyntaxError::new("unexpected end of query", self.end));
        };
        match tok.kind {
            TokenKind::LParen => {
                self.descend(tok.pos)?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    _ => Err(QuerySyntaxError::new("unclosed '('", tok.pos)),
                }
            }
            TokenKind::Term {
                text,
                case_sensitive,
            } => Ok(Expr::Term {
                text,
                case_sensitive,
            }),
            TokenKind::Special(s) => Ok(Expr::Special(s)),
            TokenKind::RParen => Err(QuerySyntaxError::new("unexpected ')'", tok.pos)),
            TokenKind::And => Err(QuerySyntaxError::new("expected expression, found AND", tok.pos)),
            TokenKind::Or => Err(QuerySyntaxError::new("expected expression, found OR", tok.pos)),
            TokenKind::Not { .. } | TokenKind::NotError => {
                Err(QuerySyntaxError::new("unexpected operator", tok.pos))
            }
        }
    }
}
