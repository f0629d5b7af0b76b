//! The `html` handler: escaped interpolation, conditionals and helpers

use std::sync::Arc;

use serde_json::Value;

use crate::compiler::Routine;
use crate::error::ComponentError;
use crate::parser::{parse, Expr, Literal, Node, Spanned, Template};
use crate::renderer::{OutputBuffer, RenderScope, SafeHtml};
use crate::template::SourceAdapter;
use crate::validation::{is_blank, CONTENT};

use super::{CallingConvention, TemplateHandler};

/// Helpers a markup template may call
pub const HELPERS: &[&str] = &["url", "upcase", "downcase", "default"];

/// Compiles the markup template language
///
/// The template is parsed and its helper calls checked once, at compile
/// time; the returned routine only walks the tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupHandler;

impl TemplateHandler for MarkupHandler {
    fn convention(&self) -> CallingConvention {
        CallingConvention::Unary
    }

    fn call(&self, template: &SourceAdapter<'_>) -> Result<Routine, ComponentError> {
        let source = template.source();
        let parsed = parse(source).map_err(|errors| ComponentError::TemplateSyntax {
            origin: String::new(),
            source_text: source.to_string(),
            errors,
        })?;
        check_helpers(&parsed)?;

        let parsed = Arc::new(parsed);
        Ok(Routine::new(move |scope, out| render_nodes(&parsed.nodes, scope, out)))
    }
}

fn check_helpers(template: &Template) -> Result<(), ComponentError> {
    let mut names = Vec::new();
    for expr in template.expressions() {
        expr.node.helper_names(&mut names);
    }
    match names.into_iter().find(|name| !HELPERS.contains(name)) {
        Some(name) => Err(ComponentError::UnknownHelper {
            origin: String::new(),
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
enum Evaluated {
    /// Already-safe markup, such as captured content
    Html(SafeHtml),
    Value(Value),
}

impl Evaluated {
    fn is_truthy(&self) -> bool {
        match self {
            Evaluated::Html(html) => !html.is_blank(),
            Evaluated::Value(value) => !is_blank(value),
        }
    }

    fn to_text(&self) -> String {
        match self {
            Evaluated::Html(html) => html.as_str().to_string(),
            Evaluated::Value(value) => stringify(value),
        }
    }
}

fn render_nodes(
    nodes: &[Spanned<Node>],
    scope: &RenderScope<'_>,
    out: &mut OutputBuffer,
) -> Result<(), ComponentError> {
    for node in nodes {
        match &node.node {
            Node::Text(text) => out.push_raw(text),
            Node::Output(expr) => match eval(&expr.node, scope)? {
                Evaluated::Html(html) => out.push_safe(&html),
                Evaluated::Value(value) => out.push_text(&stringify(&value)),
            },
            Node::Raw(expr) => out.push_raw(&eval(&expr.node, scope)?.to_text()),
            Node::Conditional {
                negated,
                condition,
                then_branch,
                else_branch,
            } => {
                let truthy = eval(&condition.node, scope)?.is_truthy();
                if truthy != *negated {
                    render_nodes(then_branch, scope, out)?;
                } else {
                    render_nodes(else_branch, scope, out)?;
                }
            }
        }
    }
    Ok(())
}

fn eval(expr: &Expr, scope: &RenderScope<'_>) -> Result<Evaluated, ComponentError> {
    match expr {
        Expr::Path(path) if path.len() == 1 && path[0] == CONTENT => Ok(Evaluated::Html(
            scope.content().cloned().unwrap_or_default(),
        )),
        Expr::Path(path) => scope.lookup(path).map(|v| Evaluated::Value(v.clone())),
        Expr::Literal(Literal::Str(s)) => Ok(Evaluated::Value(Value::String(s.clone()))),
        Expr::Literal(Literal::Int(n)) => Ok(Evaluated::Value(Value::from(*n))),
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call_helper(name, args, scope)
        }
    }
}

fn call_helper(
    name: &str,
    mut args: Vec<Evaluated>,
    scope: &RenderScope<'_>,
) -> Result<Evaluated, ComponentError> {
    let first = if args.is_empty() {
        Evaluated::Value(Value::Null)
    } else {
        args.remove(0)
    };

    match name {
        "url" => {
            let route = first.to_text();
            let params: Vec<Value> = args
                .into_iter()
                .map(|arg| match arg {
                    Evaluated::Html(html) => Value::String(html.into_string()),
                    Evaluated::Value(value) => value,
                })
                .collect();
            scope
                .helpers()
                .url_for(&route, &params)
                .map(|url| Evaluated::Value(Value::String(url)))
                .ok_or(ComponentError::UnknownRoute { name: route })
        }
        // Case changes would corrupt entities, so markup passes through
        "upcase" | "downcase" => match first {
            Evaluated::Html(html) => Ok(Evaluated::Html(html)),
            Evaluated::Value(value) => {
                let text = stringify(&value);
                let changed = if name == "upcase" {
                    text.to_uppercase()
                } else {
                    text.to_lowercase()
                };
                Ok(Evaluated::Value(Value::String(changed)))
            }
        },
        "default" => {
            if first.is_truthy() {
                Ok(first)
            } else {
                Ok(args
                    .into_iter()
                    .next()
                    .unwrap_or(Evaluated::Value(Value::Null)))
            }
        }
        other => Err(ComponentError::UnknownHelper {
            origin: String::new(),
            name: other.to_string(),
        }),
    }
}

/// Text form of an attribute value
///
/// Null renders as nothing and arrays as space-separated items.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{NoRoutes, Routes};
    use crate::validation::Attributes;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compile(source: &str) -> Result<Routine, ComponentError> {
        MarkupHandler.call(&SourceAdapter::new(source, "html"))
    }

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn render(source: &str, attributes: Value) -> Result<String, ComponentError> {
        let attributes = attrs(attributes);
        let scope = RenderScope::new("Test", &attributes, &NoRoutes);
        compile(source)?.invoke(&scope).map(SafeHtml::into_string)
    }

    #[test]
    fn test_interpolation_is_escaped() {
        let html = render("<p>{{ body }}</p>", json!({ "body": "<script>" })).unwrap();
        assert_eq!(html, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn test_raw_output_is_not_escaped() {
        let html = render("{{{ body }}}", json!({ "body": "<em>x</em>" })).unwrap();
        assert_eq!(html, "<em>x</em>");
    }

    #[test]
    fn test_nested_path_and_numbers() {
        let html = render(
            "{{ author.name }} ({{ count }})",
            json!({ "author": { "name": "Ada" }, "count": 3 }),
        )
        .unwrap();
        assert_eq!(html, "Ada (3)");
    }

    #[test]
    fn test_conditionals() {
        let source = "{% if open %}Open{% else %}Closed{% end %}|{% unless tags %}none{% end %}";
        assert_eq!(render(source, json!({ "open": true, "tags": [] })).unwrap(), "Open|none");
        assert_eq!(render(source, json!({ "open": false, "tags": ["a"] })).unwrap(), "Closed|");
    }

    #[test]
    fn test_comment_is_dropped() {
        assert_eq!(render("a{# note #}b", json!({})).unwrap(), "ab");
    }

    #[test]
    fn test_null_and_arrays() {
        let html = render(
            "[{{ missing }}] {{ classes }}",
            json!({ "missing": null, "classes": ["a", "b"] }),
        )
        .unwrap();
        assert_eq!(html, "[] a b");
    }

    #[test]
    fn test_undefined_attribute() {
        let err = render("{{ nope }}", json!({})).unwrap_err();
        assert!(matches!(err, ComponentError::UndefinedAttribute { name, .. } if name == "nope"));
    }

    #[test]
    fn test_content_without_block_is_empty() {
        assert_eq!(render("[{{ content }}]", json!({})).unwrap(), "[]");
    }

    #[test]
    fn test_content_is_not_escaped_again() {
        let attributes = Attributes::new();
        let content = SafeHtml::escape("a & b");
        let scope = RenderScope::new("Test", &attributes, &NoRoutes).with_content(&content);
        let html = compile("<i>{{ content }}</i>").unwrap().invoke(&scope).unwrap();
        assert_eq!(html.as_str(), "<i>a &amp; b</i>");
    }

    #[test]
    fn test_helpers() {
        let html = render(
            r#"{{ upcase(state) }} {{ downcase("OK") }} {{ default(label, "none") }}"#,
            json!({ "state": "open", "label": "" }),
        )
        .unwrap();
        assert_eq!(html, "OPEN ok none");
    }

    #[test]
    fn test_url_helper_uses_scope_routes() {
        let attributes = attrs(json!({ "id": 12 }));
        let routes = Routes::new().route("issue", "/issues/:id");
        let scope = RenderScope::new("Test", &attributes, &routes);
        let html = compile(r#"<a href="{{ url("issue", id) }}">#{{ id }}</a>"#)
            .unwrap()
            .invoke(&scope)
            .unwrap();
        assert_eq!(html.as_str(), r#"<a href="/issues/12">#12</a>"#);
    }

    #[test]
    fn test_unknown_route() {
        let err = render(r#"{{ url("nowhere") }}"#, json!({})).unwrap_err();
        assert!(matches!(err, ComponentError::UnknownRoute { name } if name == "nowhere"));
    }

    #[test]
    fn test_unknown_helper_fails_compilation() {
        let err = compile("{{ shout(title) }}").unwrap_err();
        assert!(matches!(err, ComponentError::UnknownHelper { name, .. } if name == "shout"));
    }

    #[test]
    fn test_syntax_error_fails_compilation() {
        let err = compile("{% if open %}never closed").unwrap_err();
        match err {
            ComponentError::TemplateSyntax { source_text, errors, .. } => {
                assert_eq!(source_text, "{% if open %}never closed");
                assert!(!errors.is_empty());
            }
            other => panic!("Expected TemplateSyntax, got {:?}", other),
        }
    }

    #[test]
    fn test_comment_containing_hash_is_dropped() {
        assert_eq!(render("<p>a{# see issue #12 #}b</p>", json!({})).unwrap(), "<p>ab</p>");
    }

    #[test]
    fn test_closing_brace_in_string_argument() {
        assert_eq!(render(r#"{{ default(x, "}") }}"#, json!({ "x": null })).unwrap(), "}");
    }

    #[test]
    fn test_unterminated_tag_fails_compilation() {
        for source in ["<p>{{ name }</p>", "<p>{% if name </p>", "a{# never closed"] {
            let err = compile(source).unwrap_err();
            assert!(
                matches!(err, ComponentError::TemplateSyntax { .. }),
                "{source}: {err:?}"
            );
        }
    }

    #[test]
    fn test_binary_call_is_mismatch() {
        let err = MarkupHandler
            .call_with_source(&SourceAdapter::new("x", "html"), "x")
            .unwrap_err();
        assert!(matches!(err, ComponentError::HandlerInvocationMismatch { .. }));
    }
}
