use crate::{
    ast::expressions::{BinaryOperator, Expr, ExprKind, UnaryOperator},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => return Err(parser.unexpected("expected an expression")),
    };

    let mut left = nud(parser)?;

    // While the next infix operator binds tighter than `bp`, keep extending lhs
    while parser.current_binding_power() > bp {
        let token_kind = parser.current_token_kind();
        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => return Err(parser.unexpected("expected an operator")),
        };

        left = led(parser, left, parser.current_binding_power())?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance();

    let kind = match token.kind {
        TokenKind::Integer => match token.value.parse::<i64>() {
            Ok(value) => ExprKind::Integer(value),
            Err(_) => {
                return Err(Error::spanned(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.span,
                ))
            }
        },
        TokenKind::Float => match token.value.parse::<f64>() {
            Ok(value) => ExprKind::Float(value),
            Err(_) => {
                return Err(Error::spanned(
                    ErrorImpl::NumberParseError { token: token.value },
                    token.span,
                ))
            }
        },
        TokenKind::String => ExprKind::String(token.value),
        TokenKind::True => ExprKind::Boolean(true),
        TokenKind::False => ExprKind::Boolean(false),
        TokenKind::None => ExprKind::None,
        TokenKind::Identifier => ExprKind::Symbol(token.value),
        _ => {
            return Err(Error::spanned(
                ErrorImpl::UnexpectedToken { token: token.value },
                token.span,
            ))
        }
    };

    Ok(Expr::new(kind, token.span))
}

fn binary_operator(kind: TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Plus => Some(BinaryOperator::Add),
        TokenKind::Dash => Some(BinaryOperator::Sub),
        TokenKind::Star => Some(BinaryOperator::Mul),
        TokenKind::Slash => Some(BinaryOperator::Div),
        TokenKind::SlashSlash => Some(BinaryOperator::FloorDiv),
        TokenKind::Percent => Some(BinaryOperator::Mod),
        TokenKind::Equals => Some(BinaryOperator::Eq),
        TokenKind::NotEquals => Some(BinaryOperator::NotEq),
        TokenKind::Less => Some(BinaryOperator::Less),
        TokenKind::LessEquals => Some(BinaryOperator::LessEq),
        TokenKind::Greater => Some(BinaryOperator::Greater),
        TokenKind::GreaterEquals => Some(BinaryOperator::GreaterEq),
        TokenKind::And => Some(BinaryOperator::And),
        TokenKind::Or => Some(BinaryOperator::Or),
        _ => None,
    }
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator = match binary_operator(parser.current_token_kind()) {
        Some(operator) => operator,
        None => return Err(parser.unexpected("expected a binary operator")),
    };
    parser.advance();

    let right = parse_expr(parser, bp)?;
    let span = left.span.to(&right.span);

    Ok(Expr::new(
        ExprKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let (operator, bp) = match operator_token.kind {
        TokenKind::Not => (UnaryOperator::Not, BindingPower::LogicalNot),
        _ => (UnaryOperator::Neg, BindingPower::Unary),
    };

    let operand = parse_expr(parser, bp)?;
    let span = operator_token.span.to(&operand.span);

    Ok(Expr::new(
        ExprKind::Unary {
            operator,
            operand: Box::new(operand),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let callee = match left.kind {
        ExprKind::Symbol(name) => name,
        _ => return Err(parser.unexpected("only named functions can be called")),
    };
    parser.advance();

    let mut arguments = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        arguments.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::new(
        ExprKind::Call {
            callee,
            callee_span: left.span.clone(),
            arguments,
        },
        parser.span_from(&left.span.start),
    ))
}
