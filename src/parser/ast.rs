//! Abstract Syntax Tree types for the component template language

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A node with source location information
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pub nodes: Vec<Spanned<Node>>,
}

/// Template body element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal markup, emitted verbatim
    Text(String),
    /// `{{ expr }}`: escaped output
    Output(Spanned<Expr>),
    /// `{{{ expr }}}`: unescaped output
    Raw(Spanned<Expr>),
    /// `{% if expr %} ... {% else %} ... {% end %}`, or `unless` when negated
    Conditional {
        negated: bool,
        condition: Spanned<Expr>,
        then_branch: Vec<Spanned<Node>>,
        else_branch: Vec<Spanned<Node>>,
    },
}

/// Expression inside a tag
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `title`, `author.name`
    Path(Vec<String>),
    Literal(Literal),
    /// `url("issue", id)`
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    /// Collect the names of all helpers this expression calls
    pub fn helper_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Expr::Call { name, args } = self {
            out.push(name);
            for arg in args {
                arg.helper_names(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
}

impl Template {
    /// Walk every expression in the template, depth first
    pub fn expressions(&self) -> Vec<&Spanned<Expr>> {
        fn walk<'a>(nodes: &'a [Spanned<Node>], out: &mut Vec<&'a Spanned<Expr>>) {
            for node in nodes {
                match &node.node {
                    Node::Text(_) => {}
                    Node::Output(expr) | Node::Raw(expr) => out.push(expr),
                    Node::Conditional {
                        condition,
                        then_branch,
                        else_branch,
                        ..
                    } => {
                        out.push(condition);
                        walk(then_branch, out);
                        walk(else_branch, out);
                    }
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }
}
