use crate::{
    ast::{
        ast::{FnDecl, GlobalDecl, GlobalName, Identifier, Item, Param},
        expressions::{CallExpr, Expr},
        statements::{
            AssignStmt, Block, ForStmt, IfStmt, Initializer, LValue, LocalDecl, LocalName, ShiftDirection,
            ShiftStmt, Stmt, WhileStmt,
        },
        types::DataType,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
    Span,
};

use super::{
    expr::{parse_call_arguments, parse_index, parse_primary_expr},
    parser::Parser,
    types::parse_type,
};

fn expect_identifier(parser: &mut Parser) -> Result<Identifier, Error> {
    let error = parser.unexpected_detailed("expected identifier");
    let token = parser.expect_error(TokenKind::Identifier, Some(error))?;

    Ok(Identifier {
        name: token.value,
        span: token.span,
    })
}

fn skip_modifier(parser: &mut Parser, kind: TokenKind) -> bool {
    if parser.current_token_kind() == kind {
        parser.advance();
        true
    } else {
        false
    }
}

/// Parses one top-level item: a global declaration list or a function.
pub fn parse_item(parser: &mut Parser) -> Result<Item, Error> {
    let is_static = skip_modifier(parser, TokenKind::Static);
    let (data_type, type_span) = parse_type(parser)?;
    let identifier = expect_identifier(parser)?;

    if parser.current_token_kind() == TokenKind::OpenParen {
        parse_fn_decl(parser, is_static, data_type, type_span, identifier).map(Item::Function)
    } else {
        parse_global_decl(parser, is_static, data_type, type_span, identifier).map(Item::Global)
    }
}

fn parse_global_decl(
    parser: &mut Parser,
    is_static: bool,
    data_type: DataType,
    type_span: Span,
    first: Identifier,
) -> Result<GlobalDecl, Error> {
    let mut names = vec![];
    let mut identifier = first;
    let mut start = type_span.clone();

    loop {
        let mut span = Span::between(&start, &identifier.span);
        let mut length = None;

        if parser.current_token_kind() == TokenKind::OpenBracket {
            parser.advance();
            let token = parser.expect(TokenKind::Integer)?;
            let parsed = token
                .value
                .parse()
                .map_err(|_| Error::new(ErrorImpl::NumberParseError { token: token.value.clone() }, token.span.clone()))?;
            let close = parser.expect(TokenKind::CloseBracket)?;

            length = Some(parsed);
            span = Span::between(&start, &close.span);
        }

        names.push(GlobalName { identifier, length, span });

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();

        identifier = expect_identifier(parser)?;
        start = identifier.span.clone();
    }

    parser.expect(TokenKind::Semicolon)?;

    Ok(GlobalDecl {
        is_static,
        data_type,
        type_span,
        names,
    })
}

fn parse_fn_decl(
    parser: &mut Parser,
    is_static: bool,
    return_type: DataType,
    type_span: Span,
    identifier: Identifier,
) -> Result<FnDecl, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut params = vec![];
    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            let is_const = skip_modifier(parser, TokenKind::Const);
            let (data_type, type_span) = parse_type(parser)?;
            let identifier = expect_identifier(parser)?;
            params.push(Param {
                is_const,
                data_type,
                type_span,
                identifier,
            });

            if parser.current_token_kind() != TokenKind::Comma {
                break;
            }
            parser.advance();
        }
    }

    parser.expect(TokenKind::CloseParen)?;
    let body = parse_block(parser)?;

    Ok(FnDecl {
        is_static,
        return_type,
        type_span,
        identifier,
        params,
        body,
    })
}

/// `{ command; command; ... }`
pub fn parse_block(parser: &mut Parser) -> Result<Block, Error> {
    let open = parser.expect(TokenKind::OpenCurly)?;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        statements.push(parse_stmt(parser)?);
        parser.expect(TokenKind::Semicolon)?;
    }

    let close = parser.expect(TokenKind::CloseCurly)?;

    Ok(Block {
        statements,
        span: Span::between(&open.span, &close.span),
    })
}

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let handler = parser.get_stmt_lookup().get(&parser.current_token_kind()).copied();

    match handler {
        Some(handler) => handler(parser),
        None => Err(parser.unexpected()),
    }
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    parse_block(parser).map(Stmt::Block)
}

pub fn parse_local_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let is_static = skip_modifier(parser, TokenKind::Static);
    let is_const = skip_modifier(parser, TokenKind::Const);
    let (data_type, type_span) = parse_type(parser)?;

    let mut names = vec![];
    loop {
        let identifier = expect_identifier(parser)?;

        let initializer = if parser.current_token_kind() == TokenKind::LessEquals {
            let operator_span = parser.advance().span.clone();
            let value = parse_primary_expr(parser)?;
            Some(Initializer { operator_span, value })
        } else {
            None
        };

        names.push(LocalName { identifier, initializer });

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
    }

    Ok(Stmt::LocalDecl(LocalDecl {
        is_static,
        is_const,
        data_type,
        type_span,
        names,
    }))
}

fn parse_lvalue(parser: &mut Parser, identifier: Identifier) -> Result<LValue, Error> {
    if parser.current_token_kind() == TokenKind::OpenBracket {
        Ok(LValue::Indexed(parse_index(parser, identifier)?))
    } else {
        Ok(LValue::Variable(identifier))
    }
}

fn parse_assignment_rest(parser: &mut Parser, target: LValue) -> Result<AssignStmt, Error> {
    let operator_span = parser.expect(TokenKind::Assignment)?.span;
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(AssignStmt {
        target,
        operator_span,
        value,
    })
}

/// `name = expr` or `name[expr] = expr`
pub fn parse_assignment(parser: &mut Parser) -> Result<AssignStmt, Error> {
    let identifier = expect_identifier(parser)?;
    let target = parse_lvalue(parser, identifier)?;
    parse_assignment_rest(parser, target)
}

/// Commands starting with an identifier: calls, assignments and shifts.
pub fn parse_identifier_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let identifier = expect_identifier(parser)?;

    if parser.current_token_kind() == TokenKind::OpenParen {
        let arguments = parse_call_arguments(parser)?;
        let close = parser.expect(TokenKind::CloseParen)?;

        return Ok(Stmt::Call(CallExpr {
            span: Span::between(&identifier.span, &close.span),
            callee: identifier,
            arguments,
        }));
    }

    let target = parse_lvalue(parser, identifier)?;

    let direction = match parser.current_token_kind() {
        TokenKind::Assignment => return parse_assignment_rest(parser, target).map(Stmt::Assign),
        TokenKind::ShiftLeft => ShiftDirection::Left,
        TokenKind::ShiftRight => ShiftDirection::Right,
        _ => return Err(parser.unexpected()),
    };

    let operator_span = parser.advance().span.clone();
    let amount = parser.expect(TokenKind::Integer)?;
    let value = amount
        .value
        .parse()
        .map_err(|_| Error::new(ErrorImpl::NumberParseError { token: amount.value.clone() }, amount.span.clone()))?;

    Ok(Stmt::Shift(ShiftStmt {
        target,
        direction,
        operator_span,
        amount: value,
        amount_text: amount.value,
        amount_span: amount.span,
    }))
}

pub fn parse_input_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let span = parser.advance().span.clone();
    let target = expect_identifier(parser)?;

    Ok(Stmt::Input { target, span })
}

pub fn parse_output_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let span = parser.advance().span.clone();
    let value = parse_primary_expr(parser)?;

    Ok(Stmt::Output { value, span })
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let span = parser.advance().span.clone();
    let value = parse_expr(parser, BindingPower::Default)?;

    Ok(Stmt::Return { value, span })
}

pub fn parse_break_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Break(parser.advance().span.clone()))
}

pub fn parse_continue_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Continue(parser.advance().span.clone()))
}

fn parse_condition(parser: &mut Parser) -> Result<Expr, Error> {
    parser.expect(TokenKind::OpenParen)?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(condition)
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.clone();
    let condition = parse_condition(parser)?;
    let then_block = parse_block(parser)?;

    let else_block = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(parse_block(parser)?)
    } else {
        None
    };

    let end = else_block.as_ref().unwrap_or(&then_block).span.clone();

    Ok(Stmt::If(IfStmt {
        condition,
        then_block,
        else_block,
        span: Span::between(&start, &end),
    }))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.clone();
    let condition = parse_condition(parser)?;
    parser.expect(TokenKind::Do)?;
    let body = parse_block(parser)?;

    Ok(Stmt::While(WhileStmt {
        condition,
        span: Span::between(&start, &body.span),
        body,
    }))
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.clone();

    parser.expect(TokenKind::OpenParen)?;
    let init = parse_assignment(parser)?;
    parser.expect(TokenKind::Colon)?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Colon)?;
    let step = parse_assignment(parser)?;
    parser.expect(TokenKind::CloseParen)?;

    let body = parse_block(parser)?;

    Ok(Stmt::For(ForStmt {
        init,
        condition,
        step,
        span: Span::between(&start, &body.span),
        body,
    }))
}
