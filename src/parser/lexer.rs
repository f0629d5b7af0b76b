//! Lexer for the component template language using logos
//!
//! Lexing happens in two passes. The outer pass splits the template into
//! literal text and tags (`{{ }}`, `{{{ }}}`, `{% %}`, `{# #}`); the inner pass
//! tokenizes the expression inside each tag. Both passes feed a single flat
//! token stream to the parser.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Outer segments: literal text and whole tags
///
/// Tag bodies may contain closing braces inside quoted strings. A comment
/// ends at the first `#}`.
#[derive(Logos, Debug, Clone, PartialEq)]
enum Segment {
    #[regex(r#"\{\{\{([^}"']|"([^"\\]|\\.)*"|'([^'\\]|\\.)*')*\}\}\}"#)]
    RawTag,

    #[regex(r#"\{\{([^}"']|"([^"\\]|\\.)*"|'([^'\\]|\\.)*')*\}\}"#)]
    OutputTag,

    #[regex(r#"\{%([^%"']|"([^"\\]|\\.)*"|'([^'\\]|\\.)*')*%\}"#)]
    BlockTag,

    #[regex(r"\{#[^#]*#+([^#}][^#]*#+)*\}")]
    CommentTag,

    #[regex(r"[^{]+")]
    Text,

    // A tag opener without a matching close
    #[token("{{")]
    #[token("{%")]
    #[token("{#")]
    Unclosed,

    // A lone brace that does not open a tag is plain text
    #[token("{")]
    Brace,
}

/// Tokens inside a tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
enum TagToken {
    #[token("if")]
    If,
    #[token("unless")]
    Unless,
    #[token("else")]
    Else,
    #[token("end")]
    End,

    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unquote(lex.slice()))]
    Str(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
}

/// Token stream consumed by the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal template text
    Text(String),
    /// `{{`
    OutputOpen,
    /// `{{{`
    RawOpen,
    /// `{%`
    BlockOpen,
    /// `}}`, `}}}` or `%}`
    TagClose,

    If,
    Unless,
    Else,
    End,

    Dot,
    Comma,
    ParenOpen,
    ParenClose,

    Ident(String),
    Str(String),
    Int(i64),

    /// Input the tag lexer could not recognize
    Unknown(String),
    /// A tag that is opened but never closed
    Unclosed(String),
}

impl From<TagToken> for Token {
    fn from(tok: TagToken) -> Self {
        match tok {
            TagToken::If => Token::If,
            TagToken::Unless => Token::Unless,
            TagToken::Else => Token::Else,
            TagToken::End => Token::End,
            TagToken::Dot => Token::Dot,
            TagToken::Comma => Token::Comma,
            TagToken::ParenOpen => Token::ParenOpen,
            TagToken::ParenClose => Token::ParenClose,
            TagToken::Ident(s) => Token::Ident(s),
            TagToken::Str(s) => Token::Str(s),
            TagToken::Int(n) => Token::Int(n),
        }
    }
}

fn unquote(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Tokenize template source into a flat token stream with byte spans
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    let mut tokens: Vec<(Token, Span)> = Vec::new();
    let mut outer = Segment::lexer(input);

    while let Some(segment) = outer.next() {
        let span = outer.span();
        let slice = outer.slice();
        match segment {
            Ok(Segment::Text) | Ok(Segment::Brace) => push_text(&mut tokens, slice, span),
            Ok(Segment::Unclosed) | Err(_) => {
                let opener = slice.get(..2).unwrap_or(slice);
                tokens.push((Token::Unclosed(opener.to_string()), span));
            }
            Ok(Segment::CommentTag) => {}
            Ok(Segment::OutputTag) => lex_tag(&mut tokens, Token::OutputOpen, slice, span, 2, 2),
            Ok(Segment::RawTag) => lex_tag(&mut tokens, Token::RawOpen, slice, span, 3, 3),
            Ok(Segment::BlockTag) => lex_tag(&mut tokens, Token::BlockOpen, slice, span, 2, 2),
        }
    }

    tokens
}

/// Append text, merging with a preceding text token
fn push_text(tokens: &mut Vec<(Token, Span)>, slice: &str, span: Span) {
    if let Some((Token::Text(prev), prev_span)) = tokens.last_mut() {
        if prev_span.end == span.start {
            prev.push_str(slice);
            prev_span.end = span.end;
            return;
        }
    }
    tokens.push((Token::Text(slice.to_string()), span));
}

fn lex_tag(
    tokens: &mut Vec<(Token, Span)>,
    open: Token,
    slice: &str,
    span: Span,
    open_len: usize,
    close_len: usize,
) {
    let inner_start = span.start + open_len;
    let inner_end = span.end - close_len;
    tokens.push((open, span.start..inner_start));

    let inner = &slice[open_len..slice.len() - close_len];
    let mut lexer = TagToken::lexer(inner);
    while let Some(tok) = lexer.next() {
        let local = lexer.span();
        let span = inner_start + local.start..inner_start + local.end;
        match tok {
            Ok(tok) => tokens.push((tok.into(), span)),
            Err(_) => tokens.push((Token::Unknown(lexer.slice().to_string()), span)),
        }
    }

    tokens.push((Token::TagClose, inner_end..span.end));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(kinds("Hello, world!"), vec![Token::Text("Hello, world!".into())]);
    }

    #[test]
    fn test_output_tag() {
        assert_eq!(
            kinds("Hi {{ name }}!"),
            vec![
                Token::Text("Hi ".into()),
                Token::OutputOpen,
                Token::Ident("name".into()),
                Token::TagClose,
                Token::Text("!".into()),
            ]
        );
    }

    #[test]
    fn test_raw_tag_beats_output_tag() {
        assert_eq!(
            kinds("{{{ body }}}"),
            vec![Token::RawOpen, Token::Ident("body".into()), Token::TagClose]
        );
    }

    #[test]
    fn test_block_keywords() {
        assert_eq!(
            kinds("{% if open %}{% else %}{% end %}"),
            vec![
                Token::BlockOpen,
                Token::If,
                Token::Ident("open".into()),
                Token::TagClose,
                Token::BlockOpen,
                Token::Else,
                Token::TagClose,
                Token::BlockOpen,
                Token::End,
                Token::TagClose,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(kinds("a{# note #}b"), vec![Token::Text("a".into()), Token::Text("b".into())]);
    }

    #[test]
    fn test_lone_brace_is_text() {
        assert_eq!(kinds("a { b"), vec![Token::Text("a { b".into())]);
    }

    #[test]
    fn test_call_with_string_arguments() {
        assert_eq!(
            kinds(r#"{{ url("issue", id) }}"#),
            vec![
                Token::OutputOpen,
                Token::Ident("url".into()),
                Token::ParenOpen,
                Token::Str("issue".into()),
                Token::Comma,
                Token::Ident("id".into()),
                Token::ParenClose,
                Token::TagClose,
            ]
        );
    }

    #[test]
    fn test_tag_spans_point_into_source() {
        let source = "ab{{ x }}";
        let tokens = lex(source);
        let (_, span) = &tokens[2];
        assert_eq!(&source[span.clone()], "x");
    }

    #[test]
    fn test_comment_may_contain_hash() {
        assert_eq!(
            kinds("a{# see #12 #}b"),
            vec![Token::Text("a".into()), Token::Text("b".into())]
        );
        assert!(kinds("{# ## #}").is_empty());
    }

    #[test]
    fn test_closing_brace_inside_string() {
        assert_eq!(
            kinds(r#"{{ default(x, "}") }}"#),
            vec![
                Token::OutputOpen,
                Token::Ident("default".into()),
                Token::ParenOpen,
                Token::Ident("x".into()),
                Token::Comma,
                Token::Str("}".into()),
                Token::ParenClose,
                Token::TagClose,
            ]
        );
        assert_eq!(
            kinds("{% if '%}' %}"),
            vec![Token::BlockOpen, Token::If, Token::Str("%}".into()), Token::TagClose]
        );
    }

    #[test]
    fn test_unterminated_tags() {
        assert!(kinds("<p>{{ name }</p>").contains(&Token::Unclosed("{{".into())));
        assert!(kinds("{% if a ").contains(&Token::Unclosed("{%".into())));
        assert!(kinds("a {# never closed").contains(&Token::Unclosed("{#".into())));
    }

    #[test]
    fn test_unknown_character_in_tag() {
        let tokens = kinds("{{ a + b }}");
        assert!(tokens.contains(&Token::Unknown("+".into())));
    }
}
