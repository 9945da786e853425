use crate::error::SyntaxError;
use crate::parser::ast::{AttributePath, CompareOp, FilterNode, Literal, LogicalOp, PathSegment};
use crate::parser::tokenizer::{tokenize, Keyword, Punct, Token, TokenKind};

/// Parse SCIM filter text into an expression tree
pub fn parse_filter(filter_str: &str) -> Result<FilterNode, SyntaxError> {
    let tokens = tokenize(filter_str)?;
    if tokens.is_empty() {
        return Err(SyntaxError::expected(filter_str.len(), "filter expression", "end of input"));
    }
    parse(tokens)
}

/// Parse an already tokenized filter
pub fn parse(tokens: Vec<Token>) -> Result<FilterNode, SyntaxError> {
    let mut parser = FilterParser::new(tokens);
    let node = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(node)
}

/// Parse a bare attribute path such as a `sortBy` value
pub fn parse_attribute_path(path_str: &str) -> Result<AttributePath, SyntaxError> {
    let mut parser = FilterParser::new(tokenize(path_str)?);
    let path = parser.parse_path()?;
    parser.expect_end()?;
    Ok(path)
}

struct FilterParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl FilterParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map(Token::end).unwrap_or(0)
    }

    fn error_here(&self, expected: &str) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError::expected(token.offset, expected, &token.describe()),
            None => SyntaxError::expected(self.end_offset(), expected, "end of input"),
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek_kind() == Some(&TokenKind::Keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.peek_kind() == Some(&TokenKind::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct, expected: &str) -> Result<(), SyntaxError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error_here(expected))
        }
    }

    fn expect_end(&self) -> Result<(), SyntaxError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(SyntaxError::expected(
                token.offset,
                "end of filter",
                &token.describe(),
            )),
        }
    }

    // expr := orExpr
    fn parse_expr(&mut self) -> Result<FilterNode, SyntaxError> {
        self.parse_or()
    }

    // orExpr := andExpr (OR andExpr)*
    fn parse_or(&mut self) -> Result<FilterNode, SyntaxError> {
        let mut node = self.parse_and()?;
        while self.eat_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            node = FilterNode::Logical {
                op: LogicalOp::Or,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    // andExpr := notExpr (AND notExpr)*
    fn parse_and(&mut self) -> Result<FilterNode, SyntaxError> {
        let mut node = self.parse_not()?;
        while self.eat_keyword(Keyword::And) {
            let right = self.parse_not()?;
            node = FilterNode::Logical {
                op: LogicalOp::And,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    // notExpr := [NOT] primary
    fn parse_not(&mut self) -> Result<FilterNode, SyntaxError> {
        if self.eat_keyword(Keyword::Not) {
            let operand = self.parse_primary()?;
            return Ok(FilterNode::Negation(Box::new(operand)));
        }
        self.parse_primary()
    }

    // primary := '(' expr ')' | comparison
    fn parse_primary(&mut self) -> Result<FilterNode, SyntaxError> {
        if self.eat_punct(Punct::LParen) {
            let node = self.parse_expr()?;
            self.expect_punct(Punct::RParen, "')'")?;
            return Ok(node);
        }
        self.parse_comparison()
    }

    // comparison := attributePath ( 'pr' | compOperator literal )
    fn parse_comparison(&mut self) -> Result<FilterNode, SyntaxError> {
        let path = self.parse_path()?;

        match self.peek_kind() {
            Some(TokenKind::Keyword(Keyword::Compare(CompareOp::Pr))) => {
                self.pos += 1;
                if let Some(TokenKind::Keyword(Keyword::Compare(_))) = self.peek_kind() {
                    return Err(self.error_here("'and', 'or', ')' or end of filter after 'pr'"));
                }
                Ok(FilterNode::Comparison {
                    path,
                    op: CompareOp::Pr,
                    value: None,
                })
            }
            Some(TokenKind::Keyword(Keyword::Compare(op))) => {
                let op = *op;
                self.pos += 1;
                let value = self.parse_literal(op)?;
                Ok(FilterNode::Comparison {
                    path,
                    op,
                    value: Some(value),
                })
            }
            // `emails[type eq "work"]` on its own tests for a matching element
            _ if path.segments.last().is_some_and(|s| s.filter.is_some()) => {
                Ok(FilterNode::Comparison {
                    path,
                    op: CompareOp::Pr,
                    value: None,
                })
            }
            _ => Err(self.error_here("comparison operator")),
        }
    }

    fn parse_literal(&mut self, op: CompareOp) -> Result<Literal, SyntaxError> {
        let literal = match self.peek_kind() {
            Some(TokenKind::StringLiteral(s)) => Literal::String(s.clone()),
            Some(TokenKind::NumberLiteral(n)) => Literal::Number(n.clone()),
            Some(TokenKind::BooleanLiteral(b)) => Literal::Boolean(*b),
            _ => return Err(self.error_here(&format!("literal value after '{}'", op.as_str()))),
        };
        self.pos += 1;
        Ok(literal)
    }

    // attributePath := segment ('.' segment)*, a segment optionally followed
    // by '[' expr ']'. Dotted identifiers are consumed greedily before any
    // operator keyword is considered.
    fn parse_path(&mut self) -> Result<AttributePath, SyntaxError> {
        let mut segments = Vec::new();
        self.parse_segments(&mut segments, false)?;

        loop {
            if self.eat_punct(Punct::LBracket) {
                let filter = self.parse_expr()?;
                self.expect_punct(Punct::RBracket, "']'")?;
                if let Some(last) = segments.last_mut() {
                    if last.filter.is_some() {
                        return Err(self.error_here("'.' before another attribute filter"));
                    }
                    last.filter = Some(Box::new(filter));
                }
                continue;
            }
            if self.eat_punct(Punct::Dot) {
                self.parse_segments(&mut segments, true)?;
                continue;
            }
            break;
        }

        Ok(AttributePath { segments })
    }

    /// Consume one identifier token and split it on its embedded dots
    fn parse_segments(
        &mut self,
        segments: &mut Vec<PathSegment>,
        after_dot: bool,
    ) -> Result<(), SyntaxError> {
        let token = match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => token.clone(),
            // After an explicit '.', a keyword-shaped name is still a name
            Some(token) if after_dot && matches!(token.kind, TokenKind::Keyword(_)) => token.clone(),
            _ => return Err(self.error_here("attribute name")),
        };
        self.advance();

        let mut offset = token.offset;
        for part in token.text.split('.') {
            if part.is_empty() {
                return Err(SyntaxError::new(offset, "empty attribute path segment"));
            }
            segments.push(PathSegment::named(part));
            offset += part.len() + 1;
        }
        Ok(())
    }
}
