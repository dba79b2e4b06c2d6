use crate::{
    ast::{
        expressions::{BinaryOperator, Expr, ExprKind},
        statements::{
            AssignStmt, FnDeclStmt, IfStmt, Parameter, ReturnStmt, Stmt, VarDeclStmt, WhileStmt,
        },
    },
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(handler) = parser.get_stmt_lookup().get(&parser.current_token_kind()).copied() {
        return handler(parser);
    }

    parse_simple_stmt(parser)
}

/// Expression statements, assignments and annotated declarations.
fn parse_simple_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let expr = parse_expr(parser, BindingPower::Default)?;

    let augmented = match parser.current_token_kind() {
        TokenKind::PlusEquals => Some(BinaryOperator::Add),
        TokenKind::MinusEquals => Some(BinaryOperator::Sub),
        TokenKind::StarEquals => Some(BinaryOperator::Mul),
        TokenKind::SlashEquals => Some(BinaryOperator::Div),
        _ => None,
    };

    let is_binding = augmented.is_some()
        || matches!(parser.current_token_kind(), TokenKind::Assignment | TokenKind::Colon);

    if !is_binding {
        expect_end_of_stmt(parser)?;
        return Ok(Stmt::Expression(expr));
    }

    let name = match &expr.kind {
        ExprKind::Symbol(name) => name.clone(),
        _ => return Err(parser.unexpected("can only assign to a name")),
    };

    let stmt = match parser.advance().kind {
        TokenKind::Colon => {
            let annotation = parse_type(parser)?;
            let error = parser.unexpected("expected `=` and a value after the annotation");
            parser.expect_error(TokenKind::Assignment, Some(error))?;
            let value = parse_expr(parser, BindingPower::Default)?;

            Stmt::VarDecl(VarDeclStmt {
                name,
                annotation,
                value,
                span: parser.span_from(&expr.span.start),
            })
        }
        _ => {
            let rhs = parse_expr(parser, BindingPower::Default)?;
            // `x += e` is `x = x + e`
            let value = match augmented {
                Some(operator) => {
                    let span = expr.span.to(&rhs.span);
                    Expr::new(
                        ExprKind::Binary {
                            operator,
                            left: Box::new(expr.clone()),
                            right: Box::new(rhs),
                        },
                        span,
                    )
                }
                None => rhs,
            };

            Stmt::Assign(AssignStmt {
                name,
                value,
                span: parser.span_from(&expr.span.start),
            })
        }
    };

    expect_end_of_stmt(parser)?;
    Ok(stmt)
}

fn expect_end_of_stmt(parser: &mut Parser) -> Result<(), Error> {
    let error = parser.unexpected("expected the end of the line");
    parser.expect_error(TokenKind::Newline, Some(error))?;
    Ok(())
}

/// Parses `: NEWLINE INDENT stmt+ DEDENT`, or a single statement on the
/// same line as the colon.
pub fn parse_block(parser: &mut Parser) -> Result<Vec<Stmt>, Error> {
    let error = parser.unexpected("expected `:`");
    parser.expect_error(TokenKind::Colon, Some(error))?;

    if parser.current_token_kind() != TokenKind::Newline {
        return Ok(vec![parse_stmt(parser)?]);
    }

    parser.advance();
    let error = parser.unexpected("expected an indented block");
    parser.expect_error(TokenKind::Indent, Some(error))?;

    let mut body = vec![];
    while !matches!(parser.current_token_kind(), TokenKind::Dedent | TokenKind::EOF) {
        body.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::Dedent)?;
    Ok(body)
}

pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let error = parser.unexpected("expected a function name");
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;

    parser.expect(TokenKind::OpenParen)?;

    let mut parameters = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        let error = parser.unexpected("expected a parameter name");
        let token = parser.expect_error(TokenKind::Identifier, Some(error))?;

        let annotation = if parser.current_token_kind() == TokenKind::Colon {
            parser.advance();
            Some(parse_type(parser)?)
        } else {
            None
        };

        parameters.push(Parameter {
            name: token.value,
            annotation,
            span: parser.span_from(&token.span.start),
        });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    let return_type = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        Some(parse_type(parser)?)
    } else {
        None
    };

    let body = parse_block(parser)?;

    Ok(Stmt::FnDecl(FnDeclStmt {
        name,
        parameters,
        return_type,
        body,
        span: parser.span_from(&start),
    }))
}

/// Handles both `if` and `elif`; an `elif` becomes a nested `IfStmt` in the
/// else branch.
pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;
    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_body = parse_block(parser)?;

    let else_body = match parser.current_token_kind() {
        TokenKind::Elif => Some(vec![parse_if_stmt(parser)?]),
        TokenKind::Else => {
            parser.advance();
            Some(parse_block(parser)?)
        }
        _ => None,
    };

    Ok(Stmt::If(IfStmt {
        condition,
        then_body,
        else_body,
        span: parser.span_from(&start),
    }))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;
    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block(parser)?;

    Ok(Stmt::While(WhileStmt {
        condition,
        body,
        span: parser.span_from(&start),
    }))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let value = if parser.current_token_kind() == TokenKind::Newline {
        None
    } else {
        Some(parse_expr(parser, BindingPower::Default)?)
    };

    let span = parser.span_from(&start);
    expect_end_of_stmt(parser)?;

    Ok(Stmt::Return(ReturnStmt { value, span }))
}

pub fn parse_pass_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let span = parser.advance().span;
    expect_end_of_stmt(parser)?;

    Ok(Stmt::Pass(span))
}
