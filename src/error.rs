//! Error types for template parsing, compilation and rendering

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::handler::CallingConvention;
use crate::validation::ValidationErrors;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);

                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::parser::lexer::Token) -> String {
    use crate::parser::lexer::Token;
    match tok {
        Token::Text(_) => "template text".to_string(),
        Token::OutputOpen => "'{{'".to_string(),
        Token::RawOpen => "'{{{'".to_string(),
        Token::BlockOpen => "'{%'".to_string(),
        Token::TagClose => "end of tag".to_string(),
        Token::If => "keyword 'if'".to_string(),
        Token::Unless => "keyword 'unless'".to_string(),
        Token::Else => "keyword 'else'".to_string(),
        Token::End => "keyword 'end'".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Comma => "','".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::Int(n) => format!("number {}", n),
        Token::Unknown(s) => format!("'{}'", s),
        Token::Unclosed(s) => format!("unclosed tag '{}'", s),
    }
}

/// Errors surfaced by the component pipeline
///
/// Every variant is `Clone` so that a failed compilation can be cached and
/// replayed to every later render of the same component type.
#[derive(Debug, Clone, Error)]
pub enum ComponentError {
    /// No sidecar file next to the component and no inline template
    #[error("no template found for {component}: expected one file matching {pattern}")]
    MissingTemplate { component: String, pattern: PathBuf },

    /// More than one sidecar candidate
    #[error("ambiguous template for {component}: found {}", format_paths(.candidates))]
    AmbiguousTemplate {
        component: String,
        candidates: Vec<PathBuf>,
    },

    /// The component declares neither a defining source file nor an inline template
    #[error("{component} does not declare its source file, so its template cannot be located")]
    UnanchoredComponent { component: String },

    /// Error reading a template or listing its directory
    #[error("error reading template {path}: {message}")]
    TemplateRead { path: PathBuf, message: String },

    /// No handler registered for a template kind
    #[error("no template handler registered for kind '{kind}'")]
    UnknownHandler { kind: String },

    /// A handler was registered twice for the same kind
    #[error("a template handler is already registered for kind '{kind}'")]
    DuplicateHandler { kind: String },

    /// A handler declared a calling convention it does not implement
    #[error("template handler for '{kind}' cannot be called with the {convention} convention")]
    HandlerInvocationMismatch {
        kind: String,
        convention: CallingConvention,
    },

    /// Template source failed to parse
    #[error("syntax errors in template {origin}: {}", format_parse_errors(.errors))]
    TemplateSyntax {
        origin: String,
        source_text: String,
        errors: Vec<ParseError>,
    },

    /// A template calls a helper that does not exist
    #[error("unknown helper '{name}' in template {origin}")]
    UnknownHelper { origin: String, name: String },

    /// A template refers to an attribute the component does not have
    #[error("undefined attribute '{name}' for {component}")]
    UndefinedAttribute { component: String, name: String },

    /// `url(...)` named a route the helpers do not know
    #[error("no route named '{name}'")]
    UnknownRoute { name: String },

    /// Component attributes could not be turned into a key/value map
    #[error("invalid attributes for {component}: {message}")]
    InvalidAttributes { component: String, message: String },

    /// One or more validation rules failed
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
}

impl ComponentError {
    /// Render the error for display, with source context for syntax errors
    pub fn report(&self) -> String {
        match self {
            ComponentError::TemplateSyntax {
                origin,
                source_text,
                errors,
            } => errors
                .iter()
                .map(|e| e.format(source_text, origin))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }

    /// Fill in the template origin for errors raised before it was known
    ///
    /// Handlers only see the template text, so they leave `origin` empty.
    pub fn with_origin(self, origin: &str) -> Self {
        match self {
            ComponentError::TemplateSyntax {
                origin: o,
                source_text,
                errors,
            } if o.is_empty() => ComponentError::TemplateSyntax {
                origin: origin.to_string(),
                source_text,
                errors,
            },
            ComponentError::UnknownHelper { origin: o, name } if o.is_empty() => {
                ComponentError::UnknownHelper {
                    origin: origin.to_string(),
                    name,
                }
            }
            other => other,
        }
    }

    /// Whether the error comes from caller data rather than a code defect
    pub fn is_validation(&self) -> bool {
        matches!(self, ComponentError::Validation(_))
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_template_lists_candidates() {
        let err = ComponentError::AmbiguousTemplate {
            component: "Badge".into(),
            candidates: vec![PathBuf::from("badge.html"), PathBuf::from("badge.raw")],
        };
        let msg = err.to_string();
        assert!(msg.contains("badge.html"));
        assert!(msg.contains("badge.raw"));
    }

    #[test]
    fn test_syntax_report_mentions_origin() {
        let errors = crate::parser::parse("{% if x %}").unwrap_err();
        let err = ComponentError::TemplateSyntax {
            origin: "badge.html".into(),
            source_text: "{% if x %}".into(),
            errors,
        };
        assert!(err.report().contains("badge.html"));
    }

    #[test]
    fn test_only_validation_is_caller_error() {
        assert!(ComponentError::Validation(ValidationErrors::default()).is_validation());
        assert!(!ComponentError::UnknownRoute { name: "x".into() }.is_validation());
    }
}
