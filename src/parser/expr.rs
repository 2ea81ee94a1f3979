use crate::{
    ast::{
        ast::Identifier,
        expressions::{
            BinaryExpr, BinaryOperator, CallExpr, Expr, IndexExpr, Literal, LiteralValue, TernaryExpr,
            UnaryExpr, UnaryOperator,
        },
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind).copied() {
        Some(nud) => nud,
        None => return Err(parser.unexpected()),
    };

    let mut left = nud(parser)?;

    // While the current token binds tighter than the caller, keep extending lhs
    while parser.current_binding_power() > bp {
        let token_kind = parser.current_token_kind();
        let led = match parser.get_led_lookup().get(&token_kind).copied() {
            Some(led) => led,
            None => return Err(parser.unexpected()),
        };

        let operator_bp = parser.current_binding_power();
        left = led(parser, left, operator_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.current_token().clone();

    let value = match token.kind {
        TokenKind::Integer => LiteralValue::Int(token.value.parse().map_err(|_| {
            Error::new(ErrorImpl::NumberParseError { token: token.value.clone() }, token.span.clone())
        })?),
        TokenKind::FloatLiteral => LiteralValue::Float(token.value.parse().map_err(|_| {
            Error::new(ErrorImpl::NumberParseError { token: token.value.clone() }, token.span.clone())
        })?),
        TokenKind::CharLiteral => LiteralValue::Char(token.value.chars().next().unwrap_or('\0')),
        TokenKind::String => LiteralValue::String(token.value.clone()),
        TokenKind::True => LiteralValue::Bool(true),
        TokenKind::False => LiteralValue::Bool(false),
        TokenKind::Identifier => {
            parser.advance();
            return Ok(Expr::Identifier(Identifier {
                name: token.value,
                span: token.span,
            }));
        }
        _ => return Err(parser.unexpected()),
    };

    parser.advance();
    Ok(Expr::Literal(Literal {
        value,
        text: token.value,
        span: token.span,
    }))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();

    let operator = match operator_token.kind {
        TokenKind::Or => BinaryOperator::Or,
        TokenKind::And => BinaryOperator::And,
        TokenKind::Pipe => BinaryOperator::BitOr,
        TokenKind::Caret => BinaryOperator::BitXor,
        TokenKind::Ampersand => BinaryOperator::BitAnd,
        TokenKind::Equals => BinaryOperator::Equals,
        TokenKind::NotEquals => BinaryOperator::NotEquals,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::LessEquals => BinaryOperator::LessEquals,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::GreaterEquals => BinaryOperator::GreaterEquals,
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Dash => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: operator_token.value },
                operator_token.span,
            ))
        }
    };

    let right = parse_expr(parser, bp)?;

    Ok(Expr::Binary(BinaryExpr {
        operator,
        operator_span: operator_token.span,
        left: Box::new(left),
        right: Box::new(right),
    }))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance().clone();

    let operator = match operator_token.kind {
        TokenKind::Dash => UnaryOperator::Minus,
        TokenKind::Plus => UnaryOperator::Plus,
        TokenKind::Not => UnaryOperator::Not,
        TokenKind::Question => UnaryOperator::Test,
        TokenKind::Hash => UnaryOperator::Hash,
        TokenKind::Ampersand => UnaryOperator::Address,
        TokenKind::Star => UnaryOperator::Dereference,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: operator_token.value },
                operator_token.span,
            ))
        }
    };

    let operand = parse_expr(parser, BindingPower::Unary)?;

    Ok(Expr::Unary(UnaryExpr {
        operator,
        operator_span: operator_token.span,
        operand: Box::new(operand),
    }))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

/// `cond ? a : b`, right associative.
pub fn parse_ternary_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let operator_span = parser.advance().span.clone();
    let then_value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Colon)?;
    let else_value = parse_expr(parser, BindingPower::Default)?;

    Ok(Expr::Ternary(TernaryExpr {
        condition: Box::new(left),
        then_value: Box::new(then_value),
        else_value: Box::new(else_value),
        operator_span,
    }))
}

fn expect_callee(parser: &Parser, left: Expr) -> Result<Identifier, Error> {
    match left {
        Expr::Identifier(identifier) => Ok(identifier),
        _ => Err(parser.unexpected_detailed("only identifiers can be called or indexed")),
    }
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let callee = expect_callee(parser, left)?;
    let arguments = parse_call_arguments(parser)?;
    let close = parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::Call(CallExpr {
        span: Span::between(&callee.span, &close.span),
        callee,
        arguments,
    }))
}

/// Consumes `(` and the comma separated arguments, leaving `)` in place.
pub fn parse_call_arguments(parser: &mut Parser) -> Result<Vec<Expr>, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut arguments = vec![];
    if parser.current_token_kind() == TokenKind::CloseParen {
        return Ok(arguments);
    }

    loop {
        arguments.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    Ok(arguments)
}

pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let base = expect_callee(parser, left)?;
    Ok(Expr::Index(parse_index(parser, base)?))
}

/// Parses `[index]` after an already consumed identifier.
pub fn parse_index(parser: &mut Parser, base: Identifier) -> Result<IndexExpr, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    let index = parse_expr(parser, BindingPower::Default)?;
    let close = parser.expect(TokenKind::CloseBracket)?;

    Ok(IndexExpr {
        span: Span::between(&base.span, &close.span),
        base,
        index: Box::new(index),
    })
}
