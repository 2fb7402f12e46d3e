//! Token-range parser producing a [`PackageUnit`].
//!
//! Statements are located by scanning for their terminating token while
//! skipping nested brackets, then expressions are parsed over the bounded
//! range by precedence climbing. Definition names and struct type references
//! are package qualified here, so the merged unit only has to validate.

use colored::Colorize;
use std::{error::Error, fmt::Display};

use crate::ast::{
    BlockStmt, CaptureIdItem, CaptureMode, Expression, Statement, VariableDefineStmt,
};
use crate::lexer::{PositionedToken, Token};
use crate::package_unit::{
    is_reserved_id, FunctionDef, MethodDef, OperatorDef, PackageUnit, Param, StructDef,
};
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: Option<(usize, usize)>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
            position: None,
        }
    }

    pub fn eof(item: &str) -> Self {
        ParseError {
            message: format!("hit EOF while parsing {item}"),
            position: None,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some((line, col)) => f.write_fmt(format_args!(
                "{} ({line}:{col})",
                self.message.red(),
            )),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse one source unit into a package unit.
pub fn parse(tokens: &[PositionedToken]) -> ParseResult<PackageUnit> {
    Parser::new(tokens).parse()
}

/// Binding powers; unary operators bind at [`UNARY_BP`], above every binary
/// operator but below member access and subscript.
fn binary_bp(token: &Token) -> Option<u8> {
    match token {
        Token::Assign
        | Token::Compare
        | Token::Gt
        | Token::Lt
        | Token::Gte
        | Token::Lte => Some(1),
        Token::Plus | Token::Minus => Some(2),
        Token::Multiply | Token::Divide => Some(3),
        Token::Or => Some(4),
        Token::And => Some(5),
        Token::MemberAccess | Token::LeftBracket | Token::As => Some(7),
        _ => None,
    }
}

const UNARY_BP: u8 = 6;

struct Parser<'a> {
    tokens: &'a [PositionedToken],
    pu: PackageUnit,
    imports: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [PositionedToken]) -> Self {
        Parser {
            tokens,
            pu: PackageUnit::new(),
            imports: vec![],
        }
    }

    fn parse(mut self) -> ParseResult<PackageUnit> {
        let mut i = 0usize;

        self.assert_token(&mut i, &Token::Package)?;
        let package_name = self.expect_id(&mut i)?;
        self.assert_token(&mut i, &Token::Semicolon)?;
        self.pu.set_name(&package_name);

        while self.token(i) == Token::Import {
            i += 1;
            let import = self.expect_id(&mut i)?;
            self.assert_token(&mut i, &Token::Semicolon)?;
            self.imports.push(import);
        }
        self.pu.set_import_packages(self.imports.clone());

        loop {
            match self.token(i) {
                Token::Eof => break,
                Token::Let => {
                    let vd = self.parse_variable_define(&mut i, true)?;
                    self.pu.add_var_def(vd);
                }
                Token::Func => {
                    let position = self.position(i);
                    let func = self.parse_function_def(&mut i)?;
                    self.add_func(func, position)?;
                }
                Token::Struct => {
                    let position = self.position(i);
                    let struct_def = self.parse_struct_def(&mut i)?;
                    self.pu
                        .add_struct_def(struct_def)
                        .map_err(|message| ParseError {
                            message,
                            position: Some(position),
                        })?;
                }
                Token::Method => {
                    self.parse_method_block(&mut i)?;
                }
                Token::Operator => {
                    let position = self.position(i);
                    let op = self.parse_operator_def(&mut i)?;
                    self.add_func(op.into_function(), position)?;
                }
                other => {
                    return Err(self.error_at(
                        i,
                        format!("unexpected token '{}' at package scope", other.token_str()),
                    ))
                }
            }
        }
        Ok(self.pu)
    }

    fn add_func(&mut self, func: FunctionDef, position: (usize, usize)) -> ParseResult<()> {
        self.pu.add_func_def(func).map_err(|message| ParseError {
            message,
            position: Some(position),
        })
    }

    // token access

    fn token(&self, i: usize) -> Token {
        match self.tokens.get(i) {
            Some(t) => t.token.clone(),
            None => Token::Eof,
        }
    }

    fn position(&self, i: usize) -> (usize, usize) {
        match self.tokens.get(i) {
            Some(t) => (t.line, t.col),
            None => (0, 0),
        }
    }

    fn error_at(&self, i: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: Some(self.position(i)),
        }
    }

    fn assert_token(&self, i: &mut usize, expected: &Token) -> ParseResult<()> {
        let current = self.token(*i);
        if current != *expected {
            return Err(self.error_at(
                *i,
                format!(
                    "expected '{}', found '{}'",
                    expected.token_str(),
                    current.token_str()
                ),
            ));
        }
        *i += 1;
        Ok(())
    }

    fn expect_id(&self, i: &mut usize) -> ParseResult<String> {
        match self.token(*i) {
            Token::Id(name) => {
                *i += 1;
                Ok(name)
            }
            other => Err(self.error_at(
                *i,
                format!("expected identifier, found '{}'", other.token_str()),
            )),
        }
    }

    /// An identifier introduced by a declaration; reserved spellings rejected.
    fn expect_declared_id(&self, i: &mut usize) -> ParseResult<String> {
        let position = *i;
        let name = self.expect_id(i)?;
        if is_reserved_id(&name) {
            return Err(self.error_at(
                position,
                format!("identifier '{name}' is reserved for the implementation"),
            ));
        }
        Ok(name)
    }

    fn qualify(&self, name: &str) -> String {
        format!("{}${}", self.pu.name(), name)
    }

    fn assert_in_import_list(&self, i: usize, package: &str) -> ParseResult<()> {
        if package == self.pu.name()
            || package == "wamon"
            || self.imports.iter().any(|each| each == package)
        {
            return Ok(());
        }
        Err(self.error_at(
            i,
            format!(
                "package {} not in package {}'s import list",
                package,
                self.pu.name()
            ),
        ))
    }

    /// `name` or `pkg::name`; qualified references are checked against the
    /// import list and mangled to `pkg$name`.
    fn parse_maybe_qualified_id(&self, i: &mut usize) -> ParseResult<String> {
        let position = *i;
        let name = self.expect_id(i)?;
        if self.token(*i) == Token::Scope {
            *i += 1;
            let member = self.expect_id(i)?;
            self.assert_in_import_list(position, &name)?;
            return Ok(format!("{name}${member}"));
        }
        Ok(name)
    }

    // token searching, skipping anything nested in brackets

    fn find_matched_token(&self, begin: usize, left: &Token, right: &Token) -> ParseResult<usize> {
        if self.token(begin) != *left {
            return Err(self.error_at(begin, format!("expected '{}'", left.token_str())));
        }
        let mut counter = 1usize;
        let mut index = begin + 1;
        while index < self.tokens.len() {
            let current = self.token(index);
            if current == *left {
                counter += 1;
            } else if current == *right {
                counter -= 1;
                if counter == 0 {
                    return Ok(index);
                }
            }
            index += 1;
        }
        Err(self.error_at(
            begin,
            format!(
                "find matched token : {} - {} error",
                left.token_str(),
                right.token_str()
            ),
        ))
    }

    /// First top-level `target` in `[begin, end)`, or `end` if there is none.
    fn find_next_token(&self, target: &Token, begin: usize, end: usize) -> usize {
        let mut parens = 0i64;
        let mut brackets = 0i64;
        let mut braces = 0i64;
        for index in begin..end {
            let current = self.token(index);
            if current == *target && parens == 0 && brackets == 0 && braces == 0 {
                return index;
            }
            match current {
                Token::LeftParen => parens += 1,
                Token::RightParen => parens -= 1,
                Token::LeftBracket => brackets += 1,
                Token::RightBracket => brackets -= 1,
                Token::LeftBrace => braces += 1,
                Token::RightBrace => braces -= 1,
                _ => {}
            }
        }
        end
    }

    // types

    fn parse_type(&self, i: &mut usize) -> ParseResult<Type> {
        match self.token(*i) {
            Token::Int => {
                *i += 1;
                Ok(Type::int())
            }
            Token::Double => {
                *i += 1;
                Ok(Type::double())
            }
            Token::Byte => {
                *i += 1;
                Ok(Type::byte())
            }
            Token::StringType => {
                *i += 1;
                Ok(Type::string())
            }
            Token::Bool => {
                *i += 1;
                Ok(Type::boolean())
            }
            Token::Void => {
                *i += 1;
                Ok(Type::void())
            }
            Token::Id(_) => {
                let position = *i;
                let name = self.parse_maybe_qualified_id(i)?;
                if name.contains('$') {
                    Ok(Type::basic(name))
                } else {
                    if is_reserved_id(&name) {
                        return Err(
                            self.error_at(position, format!("invalid type name '{name}'"))
                        );
                    }
                    Ok(Type::basic(self.qualify(&name)))
                }
            }
            Token::Ptr => {
                *i += 1;
                self.assert_token(i, &Token::LeftParen)?;
                let inner = self.parse_type(i)?;
                self.assert_token(i, &Token::RightParen)?;
                Ok(Type::pointer_to(inner))
            }
            Token::List => {
                *i += 1;
                self.assert_token(i, &Token::LeftParen)?;
                let element = self.parse_type(i)?;
                self.assert_token(i, &Token::RightParen)?;
                Ok(Type::list_of(element))
            }
            Token::F => {
                *i += 1;
                self.assert_token(i, &Token::LeftParen)?;
                self.assert_token(i, &Token::LeftParen)?;
                let mut params = vec![];
                if self.token(*i) != Token::RightParen {
                    loop {
                        params.push(self.parse_type(i)?);
                        if self.token(*i) == Token::Comma {
                            *i += 1;
                            continue;
                        }
                        break;
                    }
                }
                self.assert_token(i, &Token::RightParen)?;
                self.assert_token(i, &Token::Arrow)?;
                let ret = self.parse_type(i)?;
                self.assert_token(i, &Token::RightParen)?;
                Ok(Type::func(params, ret))
            }
            other => Err(self.error_at(
                *i,
                format!("expected a type, found '{}'", other.token_str()),
            )),
        }
    }

    // declarations

    fn parse_param_list(&self, begin: usize, end: usize) -> ParseResult<Vec<Param>> {
        let mut params = vec![];
        let mut cursor = begin;
        while cursor < end {
            let comma = self.find_next_token(&Token::Comma, cursor, end);
            let mut j = cursor;
            let ty = self.parse_type(&mut j)?;
            let is_ref = if self.token(j) == Token::Ref {
                j += 1;
                true
            } else {
                false
            };
            let name = self.expect_declared_id(&mut j)?;
            if j != comma {
                return Err(self.error_at(j, "unexpected token in parameter list"));
            }
            params.push(Param { ty, name, is_ref });
            cursor = comma + 1;
        }
        Ok(params)
    }

    fn parse_function_def(&mut self, i: &mut usize) -> ParseResult<FunctionDef> {
        self.assert_token(i, &Token::Func)?;
        let name = self.expect_declared_id(i)?;
        let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
        let params = self.parse_param_list(*i + 1, rparen)?;
        *i = rparen + 1;
        self.assert_token(i, &Token::Arrow)?;
        let return_type = self.parse_type(i)?;
        let block = self.parse_stmt_block(i)?;
        Ok(FunctionDef {
            name: self.qualify(&name),
            params,
            return_type,
            block,
            capture_ids: vec![],
        })
    }

    fn parse_struct_def(&mut self, i: &mut usize) -> ParseResult<StructDef> {
        self.assert_token(i, &Token::Struct)?;
        let is_trait = if self.token(*i) == Token::Trait {
            *i += 1;
            true
        } else {
            false
        };
        let name = self.expect_declared_id(i)?;
        let mut struct_def = StructDef::new(self.qualify(&name), is_trait);
        self.assert_token(i, &Token::LeftBrace)?;
        while self.token(*i) != Token::RightBrace {
            let ty = self.parse_type(i)?;
            let field_position = *i;
            let field = self.expect_declared_id(i)?;
            self.assert_token(i, &Token::Semicolon)?;
            struct_def
                .add_data_member(field, ty)
                .map_err(|message| ParseError {
                    message,
                    position: Some(self.position(field_position)),
                })?;
        }
        *i += 1;
        Ok(struct_def)
    }

    /// `method T { func ... , operator () ... }`; trait method declarations
    /// end in `;` instead of a body.
    fn parse_method_block(&mut self, i: &mut usize) -> ParseResult<()> {
        self.assert_token(i, &Token::Method)?;
        let type_position = *i;
        let ty = self.parse_type(i)?;
        if !ty.is_struct() {
            return Err(self.error_at(
                type_position,
                format!("methods can only be defined for struct types, got {ty}"),
            ));
        }
        let type_name = ty.type_info();
        self.assert_token(i, &Token::LeftBrace)?;
        while self.token(*i) != Token::RightBrace {
            let member_position = *i;
            let method = match self.token(*i) {
                Token::Func => self.parse_method_def(i)?,
                Token::Operator => {
                    *i += 1;
                    self.assert_token(i, &Token::LeftParen)?;
                    self.assert_token(i, &Token::RightParen)?;
                    let rparen =
                        self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
                    let params = self.parse_param_list(*i + 1, rparen)?;
                    *i = rparen + 1;
                    self.assert_token(i, &Token::Arrow)?;
                    let return_type = self.parse_type(i)?;
                    let block = self.parse_stmt_block(i)?;
                    OperatorDef {
                        op: Token::LeftParen,
                        params,
                        return_type,
                        block,
                    }
                    .into_method()
                }
                other => {
                    return Err(self.error_at(
                        *i,
                        format!(
                            "unexpected token '{}' in method block",
                            other.token_str()
                        ),
                    ))
                }
            };
            self.pu
                .add_method(&type_name, method)
                .map_err(|message| ParseError {
                    message,
                    position: Some(self.position(member_position)),
                })?;
        }
        *i += 1;
        Ok(())
    }

    fn parse_method_def(&mut self, i: &mut usize) -> ParseResult<MethodDef> {
        self.assert_token(i, &Token::Func)?;
        let name = self.expect_declared_id(i)?;
        let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
        let params = self.parse_param_list(*i + 1, rparen)?;
        *i = rparen + 1;
        self.assert_token(i, &Token::Arrow)?;
        let return_type = self.parse_type(i)?;
        let block = if self.token(*i) == Token::Semicolon {
            *i += 1;
            None
        } else {
            Some(self.parse_stmt_block(i)?)
        };
        Ok(MethodDef {
            method_name: name,
            params,
            return_type,
            block,
        })
    }

    fn parse_operator_def(&mut self, i: &mut usize) -> ParseResult<OperatorDef> {
        self.assert_token(i, &Token::Operator)?;
        let op = self.token(*i);
        if !OperatorDef::can_be_overridden(&op) || op == Token::LeftParen {
            return Err(self.error_at(
                *i,
                format!("operator '{}' can not be overridden here", op.token_str()),
            ));
        }
        *i += 1;
        let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
        let params = self.parse_param_list(*i + 1, rparen)?;
        if params.len() != 2 {
            return Err(self.error_at(
                *i,
                format!(
                    "operator '{}' override needs 2 parameters, got {}",
                    op.token_str(),
                    params.len()
                ),
            ));
        }
        *i = rparen + 1;
        self.assert_token(i, &Token::Arrow)?;
        let return_type = self.parse_type(i)?;
        let block = self.parse_stmt_block(i)?;
        Ok(OperatorDef {
            op,
            params,
            return_type,
            block,
        })
    }

    fn parse_variable_define(
        &mut self,
        i: &mut usize,
        package_scope: bool,
    ) -> ParseResult<VariableDefineStmt> {
        self.assert_token(i, &Token::Let)?;
        let name = self.expect_declared_id(i)?;
        self.assert_token(i, &Token::Colon)?;
        let ty = self.parse_type(i)?;
        self.assert_token(i, &Token::Assign)?;

        let semicolon = self.find_next_token(&Token::Semicolon, *i, self.tokens.len());
        if semicolon == self.tokens.len() {
            return Err(ParseError::eof("variable definition"));
        }

        let (constructors, is_ref) = if self.token(*i) == Token::Ref {
            let expr = self.parse_expression_range(*i + 1, semicolon)?;
            (vec![expr], true)
        } else if self.token(*i) == Token::LeftParen
            && self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)? + 1 == semicolon
        {
            (self.parse_expr_list(*i + 1, semicolon - 1)?, false)
        } else {
            let expr = self.parse_expression_range(*i, semicolon)?;
            (vec![expr], false)
        };
        *i = semicolon + 1;

        Ok(VariableDefineStmt {
            ty,
            var_name: if package_scope {
                self.qualify(&name)
            } else {
                name
            },
            constructors,
            is_ref,
        })
    }

    // statements

    fn parse_stmt_block(&mut self, i: &mut usize) -> ParseResult<BlockStmt> {
        self.assert_token(i, &Token::LeftBrace)?;
        let mut stmts = vec![];
        while self.token(*i) != Token::RightBrace {
            if self.token(*i) == Token::Eof {
                return Err(ParseError::eof("statement block"));
            }
            stmts.push(self.parse_statement(i)?);
        }
        *i += 1;
        Ok(BlockStmt { stmts })
    }

    fn parse_statement(&mut self, i: &mut usize) -> ParseResult<Statement> {
        match self.token(*i) {
            Token::LeftBrace => Ok(Statement::Block(self.parse_stmt_block(i)?)),
            Token::If => {
                *i += 1;
                let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
                let check = self.parse_expression_range(*i + 1, rparen)?;
                *i = rparen + 1;
                let if_block = self.parse_stmt_block(i)?;
                let else_block = if self.token(*i) == Token::Else {
                    *i += 1;
                    Some(self.parse_stmt_block(i)?)
                } else {
                    None
                };
                Ok(Statement::If {
                    check,
                    if_block,
                    else_block,
                })
            }
            Token::While => {
                *i += 1;
                let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
                let check = self.parse_expression_range(*i + 1, rparen)?;
                *i = rparen + 1;
                let block = self.parse_stmt_block(i)?;
                Ok(Statement::While { check, block })
            }
            Token::For => {
                *i += 1;
                let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
                let first = self.find_next_token(&Token::Semicolon, *i + 1, rparen);
                let second = self.find_next_token(&Token::Semicolon, first + 1, rparen);
                if first == rparen || second == rparen {
                    return Err(self.error_at(*i, "for_stmt needs 'init; check; update'"));
                }
                let init = self.parse_expression_range(*i + 1, first)?;
                let check = self.parse_expression_range(first + 1, second)?;
                let update = self.parse_expression_range(second + 1, rparen)?;
                *i = rparen + 1;
                let block = self.parse_stmt_block(i)?;
                Ok(Statement::For {
                    init,
                    check,
                    update,
                    block,
                })
            }
            Token::Break => {
                *i += 1;
                self.assert_token(i, &Token::Semicolon)?;
                Ok(Statement::Break)
            }
            Token::Continue => {
                *i += 1;
                self.assert_token(i, &Token::Semicolon)?;
                Ok(Statement::Continue)
            }
            Token::Return => {
                *i += 1;
                if self.token(*i) == Token::Semicolon {
                    *i += 1;
                    return Ok(Statement::Return(None));
                }
                let semicolon = self.find_next_token(&Token::Semicolon, *i, self.tokens.len());
                if semicolon == self.tokens.len() {
                    return Err(ParseError::eof("return statement"));
                }
                let expr = self.parse_expression_range(*i, semicolon)?;
                *i = semicolon + 1;
                Ok(Statement::Return(Some(expr)))
            }
            Token::Let => Ok(Statement::VariableDefine(
                self.parse_variable_define(i, false)?,
            )),
            _ => {
                let semicolon = self.find_next_token(&Token::Semicolon, *i, self.tokens.len());
                if semicolon == self.tokens.len() {
                    return Err(self.error_at(*i, "expected ';' after expression statement"));
                }
                let expr = self.parse_expression_range(*i, semicolon)?;
                *i = semicolon + 1;
                Ok(Statement::Expression(expr))
            }
        }
    }

    // expressions

    fn parse_expr_list(&mut self, begin: usize, end: usize) -> ParseResult<Vec<Expression>> {
        let mut exprs = vec![];
        let mut cursor = begin;
        while cursor < end {
            let comma = self.find_next_token(&Token::Comma, cursor, end);
            exprs.push(self.parse_expression_range(cursor, comma)?);
            cursor = comma + 1;
        }
        Ok(exprs)
    }

    fn parse_expression_range(&mut self, begin: usize, end: usize) -> ParseResult<Expression> {
        if begin >= end {
            return Err(self.error_at(begin, "expected an expression"));
        }
        let mut cursor = begin;
        let expr = self.parse_expr_bp(&mut cursor, end, 0)?;
        if cursor != end {
            return Err(self.error_at(
                cursor,
                format!(
                    "unexpected token '{}' in expression",
                    self.token(cursor).token_str()
                ),
            ));
        }
        Ok(expr)
    }

    fn parse_expr_bp(&mut self, i: &mut usize, end: usize, min_bp: u8) -> ParseResult<Expression> {
        let mut lhs = self.parse_unary(i, end)?;
        while *i < end {
            let token = self.token(*i);
            let bp = match binary_bp(&token) {
                Some(bp) => bp,
                None => break,
            };
            if bp < min_bp {
                break;
            }
            match token {
                Token::LeftBracket => {
                    let rbracket =
                        self.find_matched_token(*i, &Token::LeftBracket, &Token::RightBracket)?;
                    let index = self.parse_expression_range(*i + 1, rbracket)?;
                    *i = rbracket + 1;
                    lhs = Expression::Binary {
                        op: Token::Subscript,
                        left: Box::new(lhs),
                        right: Box::new(index),
                    };
                }
                Token::MemberAccess => {
                    *i += 1;
                    let field = self.expect_id(i)?;
                    lhs = Expression::Binary {
                        op: Token::MemberAccess,
                        left: Box::new(lhs),
                        right: Box::new(Expression::Id(field)),
                    };
                }
                Token::As => {
                    *i += 1;
                    let ty = self.parse_type(i)?;
                    lhs = Expression::As {
                        operand: Box::new(lhs),
                        ty,
                    };
                }
                op => {
                    *i += 1;
                    let rhs = self.parse_expr_bp(i, end, bp + 1)?;
                    lhs = Expression::Binary {
                        op,
                        left: Box::new(lhs),
                        right: Box::new(rhs),
                    };
                }
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self, i: &mut usize, end: usize) -> ParseResult<Expression> {
        if *i >= end {
            return Err(ParseError::eof("expression"));
        }
        match self.token(*i) {
            Token::Minus | Token::Multiply | Token::Not | Token::AddressOf => {
                let op = self.token(*i);
                *i += 1;
                let operand = self.parse_expr_bp(i, end, UNARY_BP)?;
                Ok(Expression::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            Token::Move => {
                *i += 1;
                let id = self.expect_id(i)?;
                Ok(Expression::Move(id))
            }
            Token::Dealloc => {
                *i += 1;
                let operand = self.parse_expr_bp(i, end, UNARY_BP)?;
                Ok(Expression::Dealloc(Box::new(operand)))
            }
            Token::New | Token::Alloc => {
                let is_new = self.token(*i) == Token::New;
                *i += 1;
                let ty = self.parse_type(i)?;
                let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
                let args = self.parse_expr_list(*i + 1, rparen)?;
                *i = rparen + 1;
                if is_new {
                    Ok(Expression::New { ty, args })
                } else {
                    Ok(Expression::Alloc { ty, args })
                }
            }
            Token::Call => self.parse_call_expr(i),
            Token::Lambda => self.parse_lambda(i),
            Token::SelfId => {
                *i += 1;
                Ok(Expression::SelfObject)
            }
            Token::True => {
                *i += 1;
                Ok(Expression::BoolLiteral(true))
            }
            Token::False => {
                *i += 1;
                Ok(Expression::BoolLiteral(false))
            }
            Token::IntLiteral(value) => {
                *i += 1;
                Ok(Expression::IntLiteral(value))
            }
            Token::DoubleLiteral(value) => {
                *i += 1;
                Ok(Expression::DoubleLiteral(value))
            }
            Token::ByteLiteral(value) => {
                *i += 1;
                Ok(Expression::ByteLiteral(value))
            }
            Token::StringLiteral(value) => {
                *i += 1;
                Ok(Expression::StringLiteral(value))
            }
            Token::Id(_) => {
                let name = self.parse_maybe_qualified_id(i)?;
                Ok(Expression::Id(name))
            }
            Token::LeftParen => {
                let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
                let inner = self.parse_expression_range(*i + 1, rparen)?;
                *i = rparen + 1;
                Ok(inner)
            }
            other => Err(self.error_at(
                *i,
                format!("unexpected token '{}' in expression", other.token_str()),
            )),
        }
    }

    /// `call name:(args...)` or `call obj:method(args...)`.
    fn parse_call_expr(&mut self, i: &mut usize) -> ParseResult<Expression> {
        self.assert_token(i, &Token::Call)?;
        let name = self.parse_maybe_qualified_id(i)?;
        self.assert_token(i, &Token::Colon)?;
        if self.token(*i) == Token::LeftParen {
            let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
            let args = self.parse_expr_list(*i + 1, rparen)?;
            *i = rparen + 1;
            return Ok(Expression::FuncCall {
                func_name: name,
                args,
            });
        }
        let method_name = self.expect_id(i)?;
        let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
        let args = self.parse_expr_list(*i + 1, rparen)?;
        *i = rparen + 1;
        Ok(Expression::MethodCall {
            id_name: name,
            method_name,
            args,
        })
    }

    /// `lambda [captures] (params) -> type { body }`, lowered to a uniquely
    /// named function with the capture list attached.
    fn parse_lambda(&mut self, i: &mut usize) -> ParseResult<Expression> {
        let position = *i;
        self.assert_token(i, &Token::Lambda)?;
        let rbracket = self.find_matched_token(*i, &Token::LeftBracket, &Token::RightBracket)?;
        let mut captures = vec![];
        let mut cursor = *i + 1;
        while cursor < rbracket {
            let comma = self.find_next_token(&Token::Comma, cursor, rbracket);
            let mut j = cursor;
            let mode = match self.token(j) {
                Token::Move => {
                    j += 1;
                    CaptureMode::Move
                }
                Token::Ref => {
                    j += 1;
                    CaptureMode::Ref
                }
                _ => CaptureMode::Normal,
            };
            let id = self.expect_id(&mut j)?;
            if j != comma {
                return Err(self.error_at(j, "unexpected token in capture list"));
            }
            captures.push(CaptureIdItem { id, mode });
            cursor = comma + 1;
        }
        *i = rbracket + 1;

        let rparen = self.find_matched_token(*i, &Token::LeftParen, &Token::RightParen)?;
        let params = self.parse_param_list(*i + 1, rparen)?;
        *i = rparen + 1;
        self.assert_token(i, &Token::Arrow)?;
        let return_type = self.parse_type(i)?;
        let block = self.parse_stmt_block(i)?;

        let func_name = self.pu.next_lambda_name();
        let def = FunctionDef {
            name: func_name.clone(),
            params,
            return_type,
            block,
            capture_ids: captures.clone(),
        };
        self.add_func(def, self.position(position))?;
        Ok(Expression::Lambda {
            func_name,
            captures,
        })
    }
}
