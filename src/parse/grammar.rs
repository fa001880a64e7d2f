//! Purpose: Recursive-descent grammar that turns the token stream into a `Node` tree.
//! Exports: `Grammar`, `MAX_NESTING`.
//! Role: Called once per parse by `Parser::do_parse`.
//! Invariants: Always returns a well-formed tree; bad input yields `error` nodes
//! plus diagnostics instead of aborting.
//! Invariants: Every loop consumes at least one token or stops at a terminator.
use std::collections::HashSet;

use crate::core::diagnostic::{Diagnostic, DiagnosticMessage};
use crate::core::loc::Loc;
use crate::core::node::{Node, NodeKind};
use crate::core::token::{Token, token_name, token_type};
use crate::parse::TokenStream;

/// Deepest expression nesting accepted before parsing stops.
pub const MAX_NESTING: usize = 256;

pub struct Grammar<'a> {
    tokens: TokenStream<'a>,
    diagnostics: Vec<Diagnostic>,
    scopes: Vec<HashSet<String>>,
    depth: usize,
    too_deep: bool,
    debug: bool,
}

fn is_separator(kind: u32) -> bool {
    kind == token_type::T_NL || kind == token_type::T_SEMI
}

fn starts_argument(kind: u32) -> bool {
    matches!(
        kind,
        token_type::T_INTEGER
            | token_type::T_STRING
            | token_type::T_IDENTIFIER
            | token_type::T_CONSTANT
            | token_type::T_UMINUS
            | token_type::T_LPAREN
            | token_type::K_NIL
            | token_type::K_TRUE
            | token_type::K_FALSE
            | token_type::K_SELF
    )
}

// `begin..end`, with `end` raised to `begin` when a rewritten token sits earlier in the input.
fn span(begin: usize, end: usize) -> Loc {
    Loc::new(begin, end.max(begin))
}

fn source_text(token: &Token) -> String {
    token.to_string_lossy()
}

impl<'a> Grammar<'a> {
    pub fn new(tokens: TokenStream<'a>, debug: bool) -> Self {
        Self {
            tokens,
            diagnostics: Vec::new(),
            scopes: vec![HashSet::new()],
            depth: 0,
            too_deep: false,
            debug,
        }
    }

    pub fn into_parts(self) -> (Vec<Diagnostic>, TokenStream<'a>) {
        (self.diagnostics, self.tokens)
    }

    /// Root `begin` node spanning `0..input_len`.
    pub fn parse_program(&mut self, input_len: usize) -> Node {
        let statements = self.parse_statements(&[token_type::END_OF_INPUT]);
        let root = Node::new(NodeKind::Begin, Loc::new(0, input_len), statements);
        if self.debug {
            tracing::debug!(nodes = root.count(), diagnostics = self.diagnostics.len(), "parsed program");
        }
        root
    }

    fn peek_type(&mut self, offset: usize) -> u32 {
        self.tokens.peek(offset).token_type()
    }

    fn peek_loc(&mut self) -> Loc {
        *self.tokens.peek(0).loc()
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if self.too_deep {
            return;
        }
        if self.debug {
            tracing::debug!(diagnostic = ?diagnostic, "grammar diagnostic");
        }
        self.diagnostics.push(diagnostic);
    }

    fn unexpected(&mut self, token: &Token) {
        let loc = *token.loc();
        self.report(Diagnostic::error(
            DiagnosticMessage::UnexpectedToken {
                token_name: token.token_name().to_string(),
            },
            loc,
        ));
    }

    fn expect(&mut self, kind: u32) -> Option<Token> {
        if self.peek_type(0) == kind {
            return Some(self.tokens.next());
        }
        let found = self.tokens.peek(0);
        let found_name = found.token_name().to_string();
        let loc = *found.loc();
        self.report(Diagnostic::error(
            DiagnosticMessage::ExpectedToken {
                expected: token_name(kind).to_string(),
                found: found_name,
            },
            loc,
        ));
        None
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.contains(name))
    }

    fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    // Parses statements up to (not including) one of `terminators` or end of input.
    fn parse_statements(&mut self, terminators: &[u32]) -> Vec<Node> {
        let mut statements = Vec::new();
        loop {
            while is_separator(self.peek_type(0)) {
                self.tokens.next();
            }
            let kind = self.peek_type(0);
            if kind == token_type::END_OF_INPUT || terminators.contains(&kind) {
                break;
            }

            statements.push(self.parse_expression());

            let kind = self.peek_type(0);
            if is_separator(kind) || kind == token_type::END_OF_INPUT || terminators.contains(&kind)
            {
                continue;
            }
            self.recover(terminators);
        }
        statements
    }

    // Skips to the next separator, terminator or end of input, reporting the first skipped token.
    fn recover(&mut self, terminators: &[u32]) {
        let token = self.tokens.next();
        self.unexpected(&token);
        loop {
            let kind = self.peek_type(0);
            if is_separator(kind) || kind == token_type::END_OF_INPUT || terminators.contains(&kind)
            {
                break;
            }
            self.tokens.next();
        }
    }

    fn enter(&mut self) -> bool {
        self.depth += 1;
        if self.depth <= MAX_NESTING {
            return true;
        }
        if !self.too_deep {
            let loc = self.peek_loc();
            self.report(Diagnostic::error(DiagnosticMessage::NestingTooDeep, loc));
            self.too_deep = true;
        }
        while !self.tokens.peek(0).is_end_of_input() {
            self.tokens.next();
        }
        false
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expression(&mut self) -> Node {
        if !self.enter() {
            self.leave();
            let loc = self.peek_loc();
            return Node::leaf(NodeKind::Error, loc);
        }
        let node = if self.peek_type(0) == token_type::T_IDENTIFIER
            && self.peek_type(1) == token_type::T_EQL
        {
            self.parse_assignment()
        } else {
            self.parse_additive()
        };
        self.leave();
        node
    }

    fn parse_assignment(&mut self) -> Node {
        let name_token = self.tokens.next();
        let name = source_text(&name_token);
        self.tokens.next();
        self.declare_local(&name);
        let value = self.parse_expression();
        let loc = name_token.loc().join(value.loc());
        if self.debug {
            tracing::debug!(name = %name, loc = ?loc, "reduce lvasgn");
        }
        Node::new(NodeKind::Lvasgn { name }, loc, vec![value])
    }

    fn binary(receiver: Node, operator: &Token, argument: Node) -> Node {
        let loc = receiver.loc().join(argument.loc());
        let method = match operator.token_type() {
            token_type::T_UMINUS => "-".to_string(),
            _ => source_text(operator),
        };
        Node::new(
            NodeKind::Send {
                method,
                has_receiver: true,
            },
            loc,
            vec![receiver, argument],
        )
    }

    fn parse_additive(&mut self) -> Node {
        let mut left = self.parse_multiplicative();
        while matches!(
            self.peek_type(0),
            token_type::T_PLUS | token_type::T_MINUS | token_type::T_UMINUS
        ) {
            let operator = self.tokens.next();
            let right = self.parse_multiplicative();
            left = Self::binary(left, &operator, right);
        }
        left
    }

    fn parse_multiplicative(&mut self) -> Node {
        let mut left = self.parse_unary();
        while matches!(self.peek_type(0), token_type::T_STAR | token_type::T_DIVIDE) {
            let operator = self.tokens.next();
            let right = self.parse_unary();
            left = Self::binary(left, &operator, right);
        }
        left
    }

    fn parse_unary(&mut self) -> Node {
        if self.peek_type(0) != token_type::T_UMINUS {
            return self.parse_postfix();
        }
        if !self.enter() {
            self.leave();
            let loc = self.peek_loc();
            return Node::leaf(NodeKind::Error, loc);
        }
        let minus = self.tokens.next();
        let operand = self.parse_unary();
        self.leave();

        let loc = minus.loc().join(operand.loc());
        let adjacent = minus.loc().end() == operand.loc().begin();
        if let NodeKind::Int { value } = operand.kind() {
            if adjacent && !value.starts_with('-') {
                return Node::leaf(
                    NodeKind::Int {
                        value: format!("-{value}"),
                    },
                    loc,
                );
            }
        }
        Node::new(
            NodeKind::Send {
                method: "-@".to_string(),
                has_receiver: true,
            },
            loc,
            vec![operand],
        )
    }

    fn parse_postfix(&mut self) -> Node {
        let mut node = self.parse_primary();
        while self.peek_type(0) == token_type::T_DOT {
            self.tokens.next();
            let kind = self.peek_type(0);
            if kind != token_type::T_IDENTIFIER && kind != token_type::T_CONSTANT {
                self.expect(token_type::T_IDENTIFIER);
                break;
            }
            let name_token = self.tokens.next();
            let mut children = vec![node];
            let mut end = name_token.loc().end();
            if self.paren_follows(&name_token) {
                let (arguments, close) = self.parse_paren_arguments();
                children.extend(arguments);
                end = end.max(close);
            }
            let receiver = children[0].loc();
            let loc = span(receiver.begin(), end.max(receiver.end()));
            node = Node::new(
                NodeKind::Send {
                    method: source_text(&name_token),
                    has_receiver: true,
                },
                loc,
                children,
            );
        }
        node
    }

    fn paren_follows(&mut self, name_token: &Token) -> bool {
        let next = self.tokens.peek(0);
        next.token_type() == token_type::T_LPAREN && next.loc().begin() == name_token.loc().end()
    }

    // `( args )`; returns the arguments and the end offset of the closing paren.
    fn parse_paren_arguments(&mut self) -> (Vec<Node>, usize) {
        let open = self.tokens.next();
        let mut arguments = Vec::new();
        let mut end = open.loc().end();
        while is_separator(self.peek_type(0)) {
            self.tokens.next();
        }
        if self.peek_type(0) != token_type::T_RPAREN {
            loop {
                let argument = self.parse_expression();
                end = end.max(argument.loc().end());
                arguments.push(argument);
                if self.peek_type(0) != token_type::T_COMMA {
                    break;
                }
                self.tokens.next();
            }
        }
        if let Some(close) = self.expect(token_type::T_RPAREN) {
            end = close.loc().end();
        }
        (arguments, end)
    }

    fn parse_command_arguments(&mut self) -> Vec<Node> {
        let mut arguments = vec![self.parse_expression()];
        while self.peek_type(0) == token_type::T_COMMA {
            self.tokens.next();
            arguments.push(self.parse_expression());
        }
        arguments
    }

    fn parse_identifier(&mut self) -> Node {
        let token = self.tokens.next();
        let name = source_text(&token);
        let loc = *token.loc();

        if self.paren_follows(&token) {
            let (arguments, end) = self.parse_paren_arguments();
            return Node::new(
                NodeKind::Send {
                    method: name,
                    has_receiver: false,
                },
                span(loc.begin(), end.max(loc.end())),
                arguments,
            );
        }
        if self.is_local(&name) {
            return Node::leaf(NodeKind::Lvar { name }, loc);
        }

        let mut arguments = Vec::new();
        if starts_argument(self.peek_type(0)) {
            arguments = self.parse_command_arguments();
        }
        let end = arguments
            .last()
            .map_or(loc.end(), |argument| argument.loc().end());
        Node::new(
            NodeKind::Send {
                method: name,
                has_receiver: false,
            },
            span(loc.begin(), end.max(loc.end())),
            arguments,
        )
    }

    fn parse_primary(&mut self) -> Node {
        let kind = self.peek_type(0);
        match kind {
            token_type::T_IDENTIFIER => return self.parse_identifier(),
            token_type::T_LPAREN => return self.parse_parenthesized(),
            token_type::K_DEF => return self.parse_def(),
            _ => {}
        }

        let token = self.tokens.peek(0).clone();
        let loc = *token.loc();
        let literal = match kind {
            token_type::T_INTEGER => Some(NodeKind::Int {
                value: source_text(&token).replace('_', ""),
            }),
            token_type::T_STRING => Some(NodeKind::Str {
                value: token.token_value().clone(),
            }),
            token_type::T_CONSTANT => Some(NodeKind::Const {
                name: source_text(&token),
            }),
            token_type::K_NIL => Some(NodeKind::Nil),
            token_type::K_TRUE => Some(NodeKind::True),
            token_type::K_FALSE => Some(NodeKind::False),
            token_type::K_SELF => Some(NodeKind::Self_),
            _ => None,
        };
        if let Some(literal) = literal {
            self.tokens.next();
            return Node::leaf(literal, loc);
        }

        self.unexpected(&token);
        let stops = matches!(
            kind,
            token_type::END_OF_INPUT
                | token_type::T_NL
                | token_type::T_SEMI
                | token_type::K_END
                | token_type::T_RPAREN
        );
        if stops {
            Node::leaf(NodeKind::Error, Loc::new(loc.begin(), loc.begin()))
        } else {
            self.tokens.next();
            Node::leaf(NodeKind::Error, loc)
        }
    }

    fn parse_parenthesized(&mut self) -> Node {
        let open = self.tokens.next();
        if !self.enter() {
            self.leave();
            return Node::leaf(NodeKind::Error, *open.loc());
        }
        let statements = self.parse_statements(&[token_type::T_RPAREN]);
        self.leave();
        let end = match self.expect(token_type::T_RPAREN) {
            Some(close) => close.loc().end(),
            None => statements
                .last()
                .map_or(open.loc().end(), |statement| {
                    statement.loc().end().max(open.loc().end())
                }),
        };
        Node::new(NodeKind::Begin, span(open.loc().begin(), end), statements)
    }

    fn parse_def(&mut self) -> Node {
        let def = self.tokens.next();
        let mut end = def.loc().end();

        let name = match self.peek_type(0) {
            token_type::T_IDENTIFIER | token_type::T_CONSTANT => {
                let token = self.tokens.next();
                end = token.loc().end();
                Some(source_text(&token))
            }
            _ => {
                let loc = self.peek_loc();
                self.report(Diagnostic::error(DiagnosticMessage::MissingMethodName, loc));
                None
            }
        };

        self.scopes.push(HashSet::new());
        let args = self.parse_params(end);
        end = end.max(args.loc().end());

        let mut body = self.parse_statements(&[token_type::K_END]);
        if let Some(last) = body.last() {
            end = end.max(last.loc().end());
        }
        if let Some(close) = self.expect(token_type::K_END) {
            end = close.loc().end();
        }
        self.scopes.pop();

        let mut children = vec![args];
        match body.len() {
            0 => {}
            1 => children.append(&mut body),
            _ => {
                let loc = body[0].loc().join(body[body.len() - 1].loc());
                children.push(Node::new(NodeKind::Begin, loc, body));
            }
        }
        if self.debug {
            tracing::debug!(name = ?name, "reduce def");
        }
        Node::new(NodeKind::Def { name }, span(def.loc().begin(), end), children)
    }

    fn parse_params(&mut self, name_end: usize) -> Node {
        let mut args = Node::leaf(NodeKind::Args, Loc::new(name_end, name_end));
        if self.peek_type(0) != token_type::T_LPAREN {
            return args;
        }
        let open = self.tokens.next();
        args = Node::leaf(NodeKind::Args, *open.loc());
        loop {
            match self.peek_type(0) {
                token_type::T_RPAREN | token_type::END_OF_INPUT => break,
                token_type::T_IDENTIFIER => {
                    let token = self.tokens.next();
                    let name = source_text(&token);
                    self.declare_local(&name);
                    args.push_child(Node::leaf(NodeKind::Arg { name }, *token.loc()));
                }
                _ => {
                    self.expect(token_type::T_IDENTIFIER);
                    if self.peek_type(0) == token_type::K_END {
                        return args;
                    }
                    self.tokens.next();
                    continue;
                }
            }
            if self.peek_type(0) != token_type::T_COMMA {
                break;
            }
            self.tokens.next();
        }
        if let Some(close) = self.expect(token_type::T_RPAREN) {
            args.extend_loc(close.loc());
        }
        args
    }
}
