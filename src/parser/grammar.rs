//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse template source into an AST
pub fn parse(input: &str) -> Result<Template, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = crate::parser::lexer::lex(input)
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Template, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => s,
    };

    let literal = select! {
        Token::Str(s) => Literal::Str(s),
        Token::Int(n) => Literal::Int(n),
    };

    // author.name
    let path = identifier
        .clone()
        .separated_by(just(Token::Dot))
        .at_least(1)
        .collect::<Vec<_>>();

    // Helper arguments are literals or paths; calls do not nest
    let argument = choice((literal.clone().map(Expr::Literal), path.clone().map(Expr::Path)));

    let call = identifier
        .clone()
        .then(
            argument
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        )
        .map(|(name, args)| Expr::Call { name, args });

    let expr = choice((call, literal.map(Expr::Literal), path.map(Expr::Path)))
        .map_with(|expr, e| Spanned::new(expr, span_range(&e.span())));

    let text = select! {
        Token::Text(s) => Node::Text(s),
    };

    let output = expr
        .clone()
        .delimited_by(just(Token::OutputOpen), just(Token::TagClose))
        .map(Node::Output);

    let raw = expr
        .clone()
        .delimited_by(just(Token::RawOpen), just(Token::TagClose))
        .map(Node::Raw);

    let else_tag = just(Token::BlockOpen)
        .then(just(Token::Else))
        .then(just(Token::TagClose));

    let end_tag = just(Token::BlockOpen)
        .then(just(Token::End))
        .then(just(Token::TagClose));

    let node = recursive(|node| {
        let body = node.repeated().collect::<Vec<_>>();

        let conditional = just(Token::BlockOpen)
            .ignore_then(choice((
                just(Token::If).to(false),
                just(Token::Unless).to(true),
            )))
            .then(expr.clone())
            .then_ignore(just(Token::TagClose))
            .then(body.clone())
            .then(else_tag.ignore_then(body).or_not())
            .then_ignore(end_tag)
            .map(
                |(((negated, condition), then_branch), else_branch)| Node::Conditional {
                    negated,
                    condition,
                    then_branch,
                    else_branch: else_branch.unwrap_or_default(),
                },
            );

        choice((text, output, raw, conditional))
            .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
            .boxed()
    });

    node.repeated()
        .collect()
        .then_ignore(end())
        .map(|nodes| Template { nodes })
}
