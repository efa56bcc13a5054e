//! Recursive descent parser implementation

use callsift_ast::*;
use callsift_lexer::{Token, TokenKind};

use crate::SyntaxError;

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    file: FileId,
    next_node: u32,
    /// End of the last consumed token, for precise spans
    prev_end: usize,
    /// Negative inside `if`/`for`/`switch` headers, where `T {` opens a block
    /// rather than a composite literal
    expr_lev: i32,
}

/// One `name type` entry before names are grouped with their types
struct ParamEntry {
    name: Option<Ident>,
    ty: TypeExpr,
    variadic: bool,
    start: usize,
}

enum ForHeader {
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        subject: Expr,
    },
    Loop {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
    },
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token>, file: FileId) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            file,
            next_node: 0,
            prev_end: 0,
            expr_lev: 0,
        }
    }

    /// Number of node ids handed out so far
    pub fn node_count(&self) -> u32 {
        self.next_node
    }

    // === Utilities ===

    fn current(&self) -> Token {
        let eof = Token {
            kind: TokenKind::Eof,
            span: Span::new(self.source.len(), self.source.len()),
        };
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .copied()
            .unwrap_or(eof)
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_ahead(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        if !token.is_implicit() && token.kind != TokenKind::Eof {
            self.prev_end = token.span.end;
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek())
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(SyntaxError::unexpected(
                kind.describe(),
                self.peek(),
                self.current().span,
            ))
        }
    }

    fn text(&self, token: Token) -> &'a str {
        token.text(self.source)
    }

    fn start(&self) -> usize {
        self.current().span.start
    }

    fn finish(&self, start: usize) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(self.file, self.next_node);
        self.next_node += 1;
        id
    }

    fn mk_expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        Expr {
            kind,
            span,
            id: self.next_id(),
            synthetic: false,
        }
    }

    /// Statement terminator. Optional before a closing `)` or `}`.
    fn expect_semi(&mut self) -> Result<(), SyntaxError> {
        match self.peek() {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            found => Err(SyntaxError::unexpected(
                "';' or newline",
                found,
                self.current().span,
            )),
        }
    }

    fn with_expr_lev<T>(
        &mut self,
        lev: i32,
        f: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        let saved = self.expr_lev;
        self.expr_lev = lev;
        let result = f(self);
        self.expr_lev = saved;
        result
    }

    fn parse_ident(&mut self) -> Result<Ident, SyntaxError> {
        let token = self.consume(TokenKind::Ident)?;
        let id = self.next_id();
        Ok(Ident::new(self.text(token), token.span, id))
    }

    // === File ===

    pub fn parse_file(&mut self) -> Result<File, SyntaxError> {
        if !self.at(TokenKind::Package) {
            return Err(SyntaxError::MissingPackage {
                span: self.current().span,
            });
        }
        self.advance();
        let package = self.parse_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.at(TokenKind::Import) {
            self.parse_import_decl(&mut imports)?;
            self.expect_semi()?;
        }

        let mut decls = Vec::new();
        while !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            decls.push(self.parse_top_decl()?);
            self.expect_semi()?;
        }

        Ok(File {
            package,
            imports,
            decls,
            span: Span::new(0, self.source.len()),
        })
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> Result<(), SyntaxError> {
        self.consume(TokenKind::Import)?;
        if self.eat(TokenKind::LParen) {
            while !self.at_any(&[TokenKind::RParen, TokenKind::Eof]) {
                if self.eat(TokenKind::Semicolon) {
                    continue;
                }
                imports.push(self.parse_import_spec()?);
                self.expect_semi()?;
            }
            self.consume(TokenKind::RParen)?;
        } else {
            imports.push(self.parse_import_spec()?);
        }
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, SyntaxError> {
        let start = self.start();
        let alias = match self.peek() {
            TokenKind::Ident => Some(self.parse_ident()?),
            TokenKind::Dot => {
                let token = self.advance();
                let id = self.next_id();
                Some(Ident::new(".", token.span, id))
            }
            _ => None,
        };
        let token = self.consume(TokenKind::String)?;
        let raw = self.text(token);
        let path = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
        Ok(ImportSpec {
            alias,
            path: path.to_string(),
            span: self.finish(start),
        })
    }

    // === Declarations ===

    fn parse_top_decl(&mut self) -> Result<Decl, SyntaxError> {
        match self.peek() {
            TokenKind::Func => Ok(Decl::Func(self.parse_func_decl()?)),
            TokenKind::Var | TokenKind::Const | TokenKind::Type => {
                Ok(Decl::Gen(self.parse_gen_decl()?))
            }
            _ => Err(SyntaxError::ExpectedDeclaration {
                span: self.current().span,
            }),
        }
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, SyntaxError> {
        let start = self.start();
        self.consume(TokenKind::Func)?;
        let recv = if self.at(TokenKind::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };
        let name = self.parse_ident()?;
        let ty = self.parse_signature()?;
        let body = if self.at(TokenKind::LBrace) {
            Some(self.with_expr_lev(0, |p| p.parse_block())?)
        } else {
            None
        };
        Ok(FuncDecl {
            recv,
            name,
            ty,
            body,
            span: self.finish(start),
        })
    }

    fn parse_receiver(&mut self) -> Result<Receiver, SyntaxError> {
        let start = self.start();
        let params = self.parse_params()?;
        let span = self.finish(start);
        let count = params.len();
        match params.into_iter().next() {
            Some(param) if count == 1 => Ok(Receiver {
                name: param.name,
                ty: param.ty,
                span,
            }),
            _ => Err(SyntaxError::UnexpectedToken {
                expected: "exactly one receiver".to_string(),
                found: format!("{} receivers", count),
                span,
            }),
        }
    }

    /// `(a, b int, c ...string)` or `(int, string)`
    fn parse_params(&mut self) -> Result<Vec<Param>, SyntaxError> {
        let open = self.consume(TokenKind::LParen)?;
        let mut entries = Vec::new();

        while !self.at_any(&[TokenKind::RParen, TokenKind::Eof]) {
            let start = self.start();
            let entry = if self.eat(TokenKind::Ellipsis) {
                ParamEntry {
                    name: None,
                    ty: self.parse_type()?,
                    variadic: true,
                    start,
                }
            } else {
                let ty = self.parse_type()?;
                if self.at_any(&[TokenKind::Comma, TokenKind::RParen]) {
                    ParamEntry {
                        name: None,
                        ty,
                        variadic: false,
                        start,
                    }
                } else {
                    // What looked like a type was the parameter name
                    let name = match ty.kind {
                        TypeExprKind::Name(ident) => ident,
                        _ => {
                            return Err(SyntaxError::unexpected(
                                "',' or ')'",
                                self.peek(),
                                self.current().span,
                            ))
                        }
                    };
                    let variadic = self.eat(TokenKind::Ellipsis);
                    ParamEntry {
                        name: Some(name),
                        ty: self.parse_type()?,
                        variadic,
                        start,
                    }
                }
            };
            entries.push(entry);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RParen)?;

        if entries.iter().all(|e| e.name.is_none()) {
            return Ok(entries
                .into_iter()
                .map(|e| Param {
                    name: None,
                    span: Span::new(e.start, e.ty.span.end),
                    ty: e.ty,
                    variadic: e.variadic,
                })
                .collect());
        }

        // `a, b int`: bare names take the type of the next named entry
        let mut params = Vec::new();
        let mut pending: Vec<Ident> = Vec::new();
        for entry in entries {
            match entry.name {
                None => {
                    let span = entry.ty.span;
                    match entry.ty.kind {
                        TypeExprKind::Name(ident) if !entry.variadic => pending.push(ident),
                        _ => return Err(SyntaxError::MixedParameters { span }),
                    }
                }
                Some(name) => {
                    for ident in pending.drain(..) {
                        params.push(Param {
                            span: ident.span,
                            name: Some(ident),
                            ty: entry.ty.clone(),
                            variadic: entry.variadic,
                        });
                    }
                    params.push(Param {
                        name: Some(name),
                        span: Span::new(entry.start, entry.ty.span.end),
                        ty: entry.ty,
                        variadic: entry.variadic,
                    });
                }
            }
        }
        if !pending.is_empty() {
            return Err(SyntaxError::MixedParameters {
                span: open.span.merge(Span::new(self.prev_end, self.prev_end)),
            });
        }
        Ok(params)
    }

    fn parse_signature(&mut self) -> Result<FuncType, SyntaxError> {
        let start = self.start();
        let params = self.parse_params()?;
        let results = if self.at(TokenKind::LParen) {
            self.parse_params()?
        } else if self.at_type_start() {
            let ty = self.parse_type()?;
            vec![Param {
                name: None,
                span: ty.span,
                ty,
                variadic: false,
            }]
        } else {
            Vec::new()
        };
        Ok(FuncType {
            params,
            results,
            span: self.finish(start),
        })
    }

    fn at_type_start(&self) -> bool {
        self.at_any(&[
            TokenKind::Ident,
            TokenKind::Star,
            TokenKind::LBracket,
            TokenKind::Map,
            TokenKind::Chan,
            TokenKind::Func,
            TokenKind::Struct,
            TokenKind::Interface,
            TokenKind::Arrow,
        ])
    }

    fn parse_gen_decl(&mut self) -> Result<GenDecl, SyntaxError> {
        match self.advance().kind {
            TokenKind::Type => Ok(GenDecl::Type(self.parse_group(Self::parse_type_spec)?)),
            TokenKind::Var => Ok(GenDecl::Var(self.parse_group(Self::parse_value_spec)?)),
            _ => Ok(GenDecl::Const(self.parse_group(Self::parse_value_spec)?)),
        }
    }

    /// A single spec, or a parenthesized group of them
    fn parse_group<T>(
        &mut self,
        mut spec: impl FnMut(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<Vec<T>, SyntaxError> {
        if !self.eat(TokenKind::LParen) {
            return Ok(vec![spec(self)?]);
        }
        let mut specs = Vec::new();
        while !self.at_any(&[TokenKind::RParen, TokenKind::Eof]) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            specs.push(spec(self)?);
            self.expect_semi()?;
        }
        self.consume(TokenKind::RParen)?;
        Ok(specs)
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec, SyntaxError> {
        let start = self.start();
        let name = self.parse_ident()?;
        let alias = self.eat(TokenKind::Eq);
        let ty = self.parse_type()?;
        Ok(TypeSpec {
            name,
            alias,
            ty,
            span: self.finish(start),
        })
    }

    fn parse_value_spec(&mut self) -> Result<ValueSpec, SyntaxError> {
        let start = self.start();
        let mut names = vec![self.parse_ident()?];
        while self.eat(TokenKind::Comma) {
            names.push(self.parse_ident()?);
        }
        let ty = if self.at_any(&[TokenKind::Eq, TokenKind::Semicolon, TokenKind::RParen]) {
            None
        } else {
            Some(self.parse_type()?)
        };
        let values = if self.eat(TokenKind::Eq) {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        Ok(ValueSpec {
            names,
            ty,
            values,
            span: self.finish(start),
        })
    }

    // === Types ===

    pub fn parse_type(&mut self) -> Result<TypeExpr, SyntaxError> {
        let start = self.start();
        let kind = match self.peek() {
            TokenKind::Ident => {
                let name = self.parse_ident()?;
                if self.at(TokenKind::Dot) && self.peek_ahead(1) == TokenKind::Ident {
                    self.advance();
                    let member = self.parse_ident()?;
                    TypeExprKind::Qualified {
                        package: name,
                        name: member,
                    }
                } else {
                    TypeExprKind::Name(name)
                }
            }
            TokenKind::Star => {
                self.advance();
                TypeExprKind::Pointer(Box::new(self.parse_type()?))
            }
            TokenKind::LBracket => {
                self.advance();
                if self.eat(TokenKind::RBracket) {
                    TypeExprKind::Slice(Box::new(self.parse_type()?))
                } else {
                    let len = if self.eat(TokenKind::Ellipsis) {
                        None
                    } else {
                        Some(Box::new(self.with_expr_lev(0, |p| p.parse_expr())?))
                    };
                    self.consume(TokenKind::RBracket)?;
                    TypeExprKind::Array {
                        len,
                        elem: Box::new(self.parse_type()?),
                    }
                }
            }
            TokenKind::Map => {
                self.advance();
                self.consume(TokenKind::LBracket)?;
                let key = self.parse_type()?;
                self.consume(TokenKind::RBracket)?;
                TypeExprKind::Map {
                    key: Box::new(key),
                    value: Box::new(self.parse_type()?),
                }
            }
            TokenKind::Chan => {
                self.advance();
                let dir = if self.eat(TokenKind::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                TypeExprKind::Chan {
                    dir,
                    elem: Box::new(self.parse_type()?),
                }
            }
            TokenKind::Arrow => {
                self.advance();
                self.consume(TokenKind::Chan)?;
                TypeExprKind::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.parse_type()?),
                }
            }
            TokenKind::Func => {
                self.advance();
                TypeExprKind::Func(self.parse_signature()?)
            }
            TokenKind::Struct => TypeExprKind::Struct(self.parse_struct_type()?),
            TokenKind::Interface => TypeExprKind::Interface(self.parse_interface_type()?),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.consume(TokenKind::RParen)?;
                TypeExprKind::Paren(Box::new(inner))
            }
            _ => {
                return Err(SyntaxError::ExpectedType {
                    span: self.current().span,
                })
            }
        };
        let span = self.finish(start);
        Ok(TypeExpr {
            kind,
            span,
            id: self.next_id(),
        })
    }

    fn parse_struct_type(&mut self) -> Result<StructType, SyntaxError> {
        self.consume(TokenKind::Struct)?;
        self.consume(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at_any(&[TokenKind::RBrace, TokenKind::Eof]) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            fields.push(self.parse_field_decl()?);
            self.expect_semi()?;
        }
        self.consume(TokenKind::RBrace)?;
        Ok(StructType { fields })
    }

    fn parse_field_decl(&mut self) -> Result<FieldDecl, SyntaxError> {
        let start = self.start();
        let embedded = self.at(TokenKind::Star)
            || (self.at(TokenKind::Ident)
                && matches!(
                    self.peek_ahead(1),
                    TokenKind::Dot | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::String
                ));
        let (names, ty) = if embedded {
            (Vec::new(), self.parse_type()?)
        } else {
            let mut names = vec![self.parse_ident()?];
            while self.eat(TokenKind::Comma) {
                names.push(self.parse_ident()?);
            }
            (names, self.parse_type()?)
        };
        let tag = if self.at(TokenKind::String) {
            let token = self.advance();
            Some(self.text(token).to_string())
        } else {
            None
        };
        Ok(FieldDecl {
            names,
            ty,
            embedded,
            tag,
            span: self.finish(start),
        })
    }

    fn parse_interface_type(&mut self) -> Result<InterfaceType, SyntaxError> {
        self.consume(TokenKind::Interface)?;
        self.consume(TokenKind::LBrace)?;
        let mut elems = Vec::new();
        while !self.at_any(&[TokenKind::RBrace, TokenKind::Eof]) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            if self.at(TokenKind::Ident) && self.peek_ahead(1) == TokenKind::LParen {
                let name = self.parse_ident()?;
                let ty = self.parse_signature()?;
                elems.push(InterfaceElem::Method { name, ty });
            } else {
                elems.push(InterfaceElem::Embedded(self.parse_type()?));
            }
            self.expect_semi()?;
        }
        self.consume(TokenKind::RBrace)?;
        Ok(InterfaceType { elems })
    }

    // === Statements ===

    fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        let start = self.start();
        self.consume(TokenKind::LBrace)?;
        let stmts = self.parse_stmt_list()?;
        self.consume(TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: self.finish(start),
        })
    }

    fn parse_stmt_list(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut stmts = Vec::new();
        while !self.at_any(&[
            TokenKind::RBrace,
            TokenKind::Eof,
            TokenKind::Case,
            TokenKind::Default,
        ]) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            stmts.push(self.parse_stmt()?);
            self.expect_semi()?;
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.start();
        let kind = match self.peek() {
            TokenKind::Var | TokenKind::Const | TokenKind::Type => {
                StmtKind::Decl(self.parse_gen_decl()?)
            }
            TokenKind::Go => {
                self.advance();
                StmtKind::Go(self.parse_expr()?)
            }
            TokenKind::Defer => {
                self.advance();
                StmtKind::Defer(self.parse_expr()?)
            }
            TokenKind::Return => {
                self.advance();
                if self.at_any(&[TokenKind::Semicolon, TokenKind::RBrace]) {
                    StmtKind::Return(Vec::new())
                } else {
                    StmtKind::Return(self.parse_expr_list()?)
                }
            }
            TokenKind::Break | TokenKind::Continue | TokenKind::Goto | TokenKind::Fallthrough => {
                let kind = match self.advance().kind {
                    TokenKind::Break => BranchKind::Break,
                    TokenKind::Continue => BranchKind::Continue,
                    TokenKind::Goto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let label = if self.at(TokenKind::Ident) {
                    Some(self.parse_ident()?)
                } else {
                    None
                };
                StmtKind::Branch { kind, label }
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::If => return self.parse_if_stmt(),
            TokenKind::For => return self.parse_for_stmt(),
            TokenKind::Switch => return self.parse_switch_stmt(),
            TokenKind::Select => return self.parse_select_stmt(),
            TokenKind::Ident if self.peek_ahead(1) == TokenKind::Colon => {
                let label = self.parse_ident()?;
                self.advance();
                let stmt = if self.at_any(&[TokenKind::RBrace, TokenKind::Semicolon]) {
                    let at = self.prev_end;
                    Stmt {
                        kind: StmtKind::Empty,
                        span: Span::new(at, at),
                    }
                } else {
                    self.parse_stmt()?
                };
                StmtKind::Labeled {
                    label,
                    stmt: Box::new(stmt),
                }
            }
            _ => return self.parse_simple_stmt(false),
        };
        Ok(Stmt {
            kind,
            span: self.finish(start),
        })
    }

    /// Expression, send, inc/dec, assignment or short variable declaration.
    /// With `range_ok`, also the `k, v := range x` clause of a `for`.
    fn parse_simple_stmt(&mut self, range_ok: bool) -> Result<Stmt, SyntaxError> {
        let start = self.start();
        if range_ok && self.eat(TokenKind::Range) {
            let subject = self.parse_expr()?;
            return Ok(Stmt {
                kind: range_kind(None, None, false, subject),
                span: self.finish(start),
            });
        }

        let lhs = self.parse_expr_list()?;
        let kind = match self.peek() {
            op if assign_op(op).is_some() || op == TokenKind::ColonEq => {
                let token = self.advance();
                let define = token.kind == TokenKind::ColonEq;
                if range_ok && (define || token.kind == TokenKind::Eq) && self.eat(TokenKind::Range)
                {
                    let subject = self.parse_expr()?;
                    let mut parts = lhs.into_iter();
                    range_kind(parts.next(), parts.next(), define, subject)
                } else {
                    let rhs = self.parse_expr_list()?;
                    if define {
                        let names = lhs
                            .into_iter()
                            .map(|e| {
                                let span = e.span;
                                match e.kind {
                                    ExprKind::Ident(ident) => Ok(ident),
                                    _ => Err(SyntaxError::InvalidLhs {
                                        expected: "identifier",
                                        op: "':='",
                                        span,
                                    }),
                                }
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        StmtKind::Define { names, values: rhs }
                    } else {
                        StmtKind::Assign {
                            lhs,
                            op: assign_op(token.kind).unwrap_or(AssignOp::Assign),
                            rhs,
                        }
                    }
                }
            }
            TokenKind::Arrow => {
                let channel = single(lhs, "'<-'")?;
                self.advance();
                let value = self.parse_expr()?;
                StmtKind::Send { channel, value }
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let target = single(lhs, "'++' or '--'")?;
                let inc = self.advance().kind == TokenKind::PlusPlus;
                StmtKind::IncDec { target, inc }
            }
            _ => StmtKind::Expr(single(lhs, "end of statement")?),
        };
        Ok(Stmt {
            kind,
            span: self.finish(start),
        })
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.start();
        self.consume(TokenKind::If)?;
        let (init, cond) = self.with_expr_lev(-1, |p| {
            let first = if p.at(TokenKind::Semicolon) {
                None
            } else {
                Some(p.parse_simple_stmt(false)?)
            };
            if p.eat(TokenKind::Semicolon) {
                let cond = p.parse_expr()?;
                return Ok((first.map(Box::new), cond));
            }
            match first {
                Some(Stmt {
                    kind: StmtKind::Expr(cond),
                    ..
                }) => Ok((None, cond)),
                _ => Err(SyntaxError::ExpectedExpression {
                    span: p.current().span,
                }),
            }
        })?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.eat(TokenKind::Else) {
            let stmt = if self.at(TokenKind::If) {
                self.parse_if_stmt()?
            } else {
                let block = self.parse_block()?;
                Stmt {
                    span: block.span,
                    kind: StmtKind::Block(block),
                }
            };
            Some(Box::new(stmt))
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                init,
                cond,
                then_branch,
                else_branch,
            },
            span: self.finish(start),
        })
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.start();
        self.consume(TokenKind::For)?;
        let header = self.with_expr_lev(-1, |p| p.parse_for_header())?;
        let body = self.parse_block()?;
        let kind = match header {
            ForHeader::Range {
                key,
                value,
                define,
                subject,
            } => StmtKind::Range {
                key,
                value,
                define,
                subject,
                body,
            },
            ForHeader::Loop { init, cond, post } => StmtKind::For {
                init,
                cond,
                post,
                body,
            },
        };
        Ok(Stmt {
            kind,
            span: self.finish(start),
        })
    }

    fn parse_for_header(&mut self) -> Result<ForHeader, SyntaxError> {
        if self.at(TokenKind::LBrace) {
            return Ok(ForHeader::Loop {
                init: None,
                cond: None,
                post: None,
            });
        }
        let first = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_simple_stmt(true)?)
        };
        let first = match first {
            Some(Stmt {
                kind:
                    StmtKind::Range {
                        key,
                        value,
                        define,
                        subject,
                        ..
                    },
                ..
            }) => {
                return Ok(ForHeader::Range {
                    key,
                    value,
                    define,
                    subject,
                })
            }
            other => other,
        };

        if self.eat(TokenKind::Semicolon) {
            let cond = if self.at(TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.consume(TokenKind::Semicolon)?;
            let post = if self.at(TokenKind::LBrace) {
                None
            } else {
                Some(Box::new(self.parse_simple_stmt(false)?))
            };
            return Ok(ForHeader::Loop {
                init: first.map(Box::new),
                cond,
                post,
            });
        }

        match first {
            Some(Stmt {
                kind: StmtKind::Expr(cond),
                ..
            }) => Ok(ForHeader::Loop {
                init: None,
                cond: Some(cond),
                post: None,
            }),
            _ => Err(SyntaxError::ExpectedExpression {
                span: self.current().span,
            }),
        }
    }

    fn parse_switch_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.start();
        self.consume(TokenKind::Switch)?;
        let (init, guard) = self.with_expr_lev(-1, |p| {
            if p.at(TokenKind::LBrace) {
                return Ok((None, None));
            }
            let first = if p.at(TokenKind::Semicolon) {
                None
            } else {
                Some(p.parse_simple_stmt(false)?)
            };
            if p.eat(TokenKind::Semicolon) {
                let second = if p.at(TokenKind::LBrace) {
                    None
                } else {
                    Some(p.parse_simple_stmt(false)?)
                };
                Ok((first.map(Box::new), second))
            } else {
                Ok((None, first))
            }
        })?;
        self.consume(TokenKind::LBrace)?;

        let kind = match guard {
            Some(guard) if is_type_guard(&guard) => {
                let (binding, subject) = split_type_guard(guard)?;
                let mut clauses = Vec::new();
                while self.at_any(&[TokenKind::Case, TokenKind::Default]) {
                    clauses.push(self.parse_type_case_clause()?);
                }
                StmtKind::TypeSwitch {
                    init,
                    binding,
                    subject,
                    clauses,
                }
            }
            guard => {
                let tag = match guard.map(|s| (s.span, s.kind)) {
                    None => None,
                    Some((_, StmtKind::Expr(tag))) => Some(tag),
                    Some((span, _)) => return Err(SyntaxError::ExpectedExpression { span }),
                };
                let mut clauses = Vec::new();
                while self.at_any(&[TokenKind::Case, TokenKind::Default]) {
                    clauses.push(self.parse_case_clause()?);
                }
                StmtKind::Switch { init, tag, clauses }
            }
        };
        self.consume(TokenKind::RBrace)?;
        Ok(Stmt {
            kind,
            span: self.finish(start),
        })
    }

    fn parse_case_clause(&mut self) -> Result<CaseClause, SyntaxError> {
        let start = self.start();
        let exprs = if self.eat(TokenKind::Default) {
            None
        } else {
            self.consume(TokenKind::Case)?;
            Some(self.parse_expr_list()?)
        };
        self.consume(TokenKind::Colon)?;
        let body = self.parse_stmt_list()?;
        Ok(CaseClause {
            exprs,
            body,
            span: self.finish(start),
        })
    }

    fn parse_type_case_clause(&mut self) -> Result<TypeCaseClause, SyntaxError> {
        let start = self.start();
        let types = if self.eat(TokenKind::Default) {
            None
        } else {
            self.consume(TokenKind::Case)?;
            let mut types = vec![self.parse_type()?];
            while self.eat(TokenKind::Comma) {
                types.push(self.parse_type()?);
            }
            Some(types)
        };
        self.consume(TokenKind::Colon)?;
        let body = self.parse_stmt_list()?;
        Ok(TypeCaseClause {
            types,
            body,
            span: self.finish(start),
        })
    }

    fn parse_select_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.start();
        self.consume(TokenKind::Select)?;
        self.consume(TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        while self.at_any(&[TokenKind::Case, TokenKind::Default]) {
            let clause_start = self.start();
            let comm = if self.eat(TokenKind::Default) {
                None
            } else {
                self.consume(TokenKind::Case)?;
                Some(Box::new(self.parse_simple_stmt(false)?))
            };
            self.consume(TokenKind::Colon)?;
            let body = self.parse_stmt_list()?;
            clauses.push(CommClause {
                comm,
                body,
                span: self.finish(clause_start),
            });
        }
        self.consume(TokenKind::RBrace)?;
        Ok(Stmt {
            kind: StmtKind::Select { clauses },
            span: self.finish(start),
        })
    }

    // === Expressions ===

    pub fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_binary(1)
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    /// Precedence climbing over the five binary levels
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = binary_op(self.peek()) {
            if op.precedence() < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(op.precedence() + 1)?;
            let span = left.span.merge(right.span);
            left = self.mk_expr(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.start();
        let op = match self.peek() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Caret => Some(UnaryOp::BitNot),
            TokenKind::Star => Some(UnaryOp::Deref),
            TokenKind::Amp => Some(UnaryOp::AddrOf),
            // `<-chan T` is a type, not a receive
            TokenKind::Arrow if self.peek_ahead(1) != TokenKind::Chan => Some(UnaryOp::Recv),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let operand = self.parse_unary()?;
                let span = self.finish(start);
                Ok(self.mk_expr(
                    ExprKind::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    span,
                ))
            }
            None => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.start();
        let mut expr = self.parse_operand()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    if self.eat(TokenKind::LParen) {
                        let ty = if self.eat(TokenKind::Type) {
                            None
                        } else {
                            Some(self.parse_type()?)
                        };
                        self.consume(TokenKind::RParen)?;
                        let span = self.finish(start);
                        expr = self.mk_expr(
                            ExprKind::TypeAssert {
                                operand: Box::new(expr),
                                ty,
                            },
                            span,
                        );
                    } else {
                        let member = self.parse_ident()?;
                        let span = self.finish(start);
                        expr = self.mk_expr(
                            ExprKind::Selector {
                                operand: Box::new(expr),
                                member,
                            },
                            span,
                        );
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.with_expr_lev(0, move |p| p.parse_index_or_slice(expr, start))?;
                }
                TokenKind::LParen => {
                    self.advance();
                    let (args, ellipsis) = self.with_expr_lev(0, |p| p.parse_call_args())?;
                    let span = self.finish(start);
                    expr = self.mk_expr(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                            ellipsis,
                        },
                        span,
                    );
                }
                TokenKind::LBrace if self.is_literal_type(&expr) => {
                    let ty = expr_to_type(expr)?;
                    expr = self.parse_composite_lit(Some(ty), start)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_operand(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.start();
        match self.peek() {
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imag
            | TokenKind::Char
            | TokenKind::String => {
                let token = self.advance();
                let kind = match token.kind {
                    TokenKind::Int => LitKind::Int,
                    TokenKind::Float => LitKind::Float,
                    TokenKind::Imag => LitKind::Imag,
                    TokenKind::Char => LitKind::Char,
                    _ => LitKind::String,
                };
                let lit = BasicLit {
                    kind,
                    raw: self.text(token).to_string(),
                };
                Ok(self.mk_expr(ExprKind::BasicLit(lit), token.span))
            }
            TokenKind::Ident => {
                let ident = self.parse_ident()?;
                Ok(Expr {
                    span: ident.span,
                    id: ident.id,
                    kind: ExprKind::Ident(ident),
                    synthetic: false,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.with_expr_lev(0, |p| p.parse_expr())?;
                self.consume(TokenKind::RParen)?;
                let span = self.finish(start);
                Ok(self.mk_expr(ExprKind::Paren(Box::new(inner)), span))
            }
            TokenKind::Func => {
                self.advance();
                let ty = self.parse_signature()?;
                if self.at(TokenKind::LBrace) {
                    let body = self.with_expr_lev(0, |p| p.parse_block())?;
                    let span = self.finish(start);
                    Ok(self.mk_expr(ExprKind::FuncLit { ty, body }, span))
                } else {
                    let span = self.finish(start);
                    let ty = TypeExpr {
                        kind: TypeExprKind::Func(ty),
                        span,
                        id: self.next_id(),
                    };
                    Ok(self.mk_expr(ExprKind::Type(ty), span))
                }
            }
            TokenKind::LBracket
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Struct
            | TokenKind::Interface
            | TokenKind::Arrow => {
                let ty = self.parse_type()?;
                let span = ty.span;
                Ok(self.mk_expr(ExprKind::Type(ty), span))
            }
            found => Err(SyntaxError::unexpected(
                "expression",
                found,
                self.current().span,
            )),
        }
    }

    /// After `[`: `a[i]`, `a[lo:hi]` or `a[lo:hi:max]`
    fn parse_index_or_slice(&mut self, operand: Expr, start: usize) -> Result<Expr, SyntaxError> {
        let low = if self.at(TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        if !self.eat(TokenKind::Colon) {
            self.consume(TokenKind::RBracket)?;
            let span = self.finish(start);
            return match low {
                Some(index) => Ok(self.mk_expr(
                    ExprKind::Index {
                        operand: Box::new(operand),
                        index,
                    },
                    span,
                )),
                None => Err(SyntaxError::ExpectedExpression { span }),
            };
        }
        let high = if self.at_any(&[TokenKind::Colon, TokenKind::RBracket]) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let max = if self.eat(TokenKind::Colon) {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.consume(TokenKind::RBracket)?;
        let span = self.finish(start);
        Ok(self.mk_expr(
            ExprKind::Slice {
                operand: Box::new(operand),
                low,
                high,
                max,
            },
            span,
        ))
    }

    /// After `(`: arguments up to and including `)`
    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, bool), SyntaxError> {
        let mut args = Vec::new();
        let mut ellipsis = false;
        while !self.at_any(&[TokenKind::RParen, TokenKind::Eof]) {
            args.push(self.parse_expr()?);
            if self.eat(TokenKind::Ellipsis) {
                ellipsis = true;
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok((args, ellipsis))
    }

    /// `{` may open a composite literal after this expression
    fn is_literal_type(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Ident(_) => self.expr_lev >= 0,
            ExprKind::Selector { operand, .. } => {
                self.expr_lev >= 0 && matches!(operand.kind, ExprKind::Ident(_))
            }
            ExprKind::Type(ty) => matches!(
                ty.kind,
                TypeExprKind::Array { .. }
                    | TypeExprKind::Slice(_)
                    | TypeExprKind::Map { .. }
                    | TypeExprKind::Struct(_)
            ),
            _ => false,
        }
    }

    fn parse_composite_lit(
        &mut self,
        ty: Option<TypeExpr>,
        start: usize,
    ) -> Result<Expr, SyntaxError> {
        let elements = self.with_expr_lev(0, |p| p.parse_elements())?;
        let span = self.finish(start);
        Ok(self.mk_expr(ExprKind::CompositeLit { ty, elements }, span))
    }

    fn parse_elements(&mut self) -> Result<Vec<Element>, SyntaxError> {
        self.consume(TokenKind::LBrace)?;
        let mut elements = Vec::new();
        while !self.at_any(&[TokenKind::RBrace, TokenKind::Eof]) {
            let start = self.start();
            let first = self.parse_element_value()?;
            let (key, value) = if self.eat(TokenKind::Colon) {
                (Some(first), self.parse_element_value()?)
            } else {
                (None, first)
            };
            elements.push(Element {
                key,
                value,
                span: self.finish(start),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RBrace)?;
        Ok(elements)
    }

    fn parse_element_value(&mut self) -> Result<Expr, SyntaxError> {
        if self.at(TokenKind::LBrace) {
            let start = self.start();
            self.parse_composite_lit(None, start)
        } else {
            self.parse_expr()
        }
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::OrOr => BinaryOp::LogOr,
        TokenKind::AndAnd => BinaryOp::LogAnd,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::Ne => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Pipe => BinaryOp::Or,
        TokenKind::Caret => BinaryOp::Xor,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::Shl => BinaryOp::Shl,
        TokenKind::Shr => BinaryOp::Shr,
        TokenKind::Amp => BinaryOp::And,
        TokenKind::AmpCaret => BinaryOp::AndNot,
        _ => return None,
    };
    Some(op)
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Div,
        TokenKind::PercentEq => AssignOp::Rem,
        TokenKind::AmpEq => AssignOp::And,
        TokenKind::PipeEq => AssignOp::Or,
        TokenKind::CaretEq => AssignOp::Xor,
        TokenKind::ShlEq => AssignOp::Shl,
        TokenKind::ShrEq => AssignOp::Shr,
        TokenKind::AmpCaretEq => AssignOp::AndNot,
        _ => return None,
    };
    Some(op)
}

/// A range clause; the body is filled in by the enclosing `for`
fn range_kind(key: Option<Expr>, value: Option<Expr>, define: bool, subject: Expr) -> StmtKind {
    StmtKind::Range {
        key,
        value,
        define,
        subject,
        body: Block {
            stmts: Vec::new(),
            span: Span::dummy(),
        },
    }
}

fn single(mut exprs: Vec<Expr>, op: &'static str) -> Result<Expr, SyntaxError> {
    if exprs.len() == 1 {
        if let Some(expr) = exprs.pop() {
            return Ok(expr);
        }
    }
    let span = match (exprs.first(), exprs.last()) {
        (Some(first), Some(last)) => first.span.merge(last.span),
        _ => Span::dummy(),
    };
    Err(SyntaxError::InvalidLhs {
        expected: "single expression",
        op,
        span,
    })
}

/// `x.(type)` or `v := x.(type)`
fn is_type_guard(stmt: &Stmt) -> bool {
    let expr = match &stmt.kind {
        StmtKind::Expr(expr) => expr,
        StmtKind::Define { names, values } if names.len() == 1 && values.len() == 1 => &values[0],
        _ => return false,
    };
    matches!(expr.kind, ExprKind::TypeAssert { ty: None, .. })
}

fn split_type_guard(stmt: Stmt) -> Result<(Option<Ident>, Expr), SyntaxError> {
    let (binding, guard) = match stmt.kind {
        StmtKind::Define { names, values } => (names.into_iter().next(), values.into_iter().next()),
        StmtKind::Expr(expr) => (None, Some(expr)),
        _ => (None, None),
    };
    match guard.map(|e| e.kind) {
        Some(ExprKind::TypeAssert { operand, .. }) => Ok((binding, *operand)),
        _ => Err(SyntaxError::ExpectedExpression { span: stmt.span }),
    }
}

/// Reinterpret an expression parsed before `{` as a literal type
fn expr_to_type(expr: Expr) -> Result<TypeExpr, SyntaxError> {
    let span = expr.span;
    let id = expr.id;
    let kind = match expr.kind {
        ExprKind::Ident(ident) => TypeExprKind::Name(ident),
        ExprKind::Selector { operand, member } => match operand.kind {
            ExprKind::Ident(package) => TypeExprKind::Qualified {
                package,
                name: member,
            },
            _ => return Err(SyntaxError::ExpectedType { span }),
        },
        ExprKind::Type(ty) => return Ok(ty),
        ExprKind::Paren(inner) => TypeExprKind::Paren(Box::new(expr_to_type(*inner)?)),
        _ => return Err(SyntaxError::ExpectedType { span }),
    };
    Ok(TypeExpr { kind, span, id })
}
