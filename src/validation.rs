//! Declarative attribute validation run before every render
//!
//! Components declare their rules through [`Component::rules`](crate::Component::rules).
//! The attribute name `content` refers to the content captured from the
//! caller's block rather than to a field of the component.

use std::fmt;

use serde_json::Value;

use crate::error::ComponentError;
use crate::renderer::SafeHtml;

/// Serialized component attributes
pub type Attributes = serde_json::Map<String, Value>;

/// Name under which captured block content is validated and rendered
pub const CONTENT: &str = "content";

/// A single declarative validation rule
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Attribute must not be blank
    Presence { attribute: String },
    /// Attribute must be blank
    Absence { attribute: String },
    /// Attribute must be one of the allowed values
    Inclusion {
        attribute: String,
        allowed: Vec<Value>,
    },
    /// Character (or element) count bounds
    Length {
        attribute: String,
        min: Option<usize>,
        max: Option<usize>,
    },
}

impl Rule {
    pub fn presence(attribute: impl Into<String>) -> Self {
        Self::Presence {
            attribute: attribute.into(),
        }
    }

    pub fn absence(attribute: impl Into<String>) -> Self {
        Self::Absence {
            attribute: attribute.into(),
        }
    }

    pub fn inclusion<V: Into<Value>>(
        attribute: impl Into<String>,
        allowed: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::Inclusion {
            attribute: attribute.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn length(attribute: impl Into<String>, min: Option<usize>, max: Option<usize>) -> Self {
        Self::Length {
            attribute: attribute.into(),
            min,
            max,
        }
    }

    pub fn attribute(&self) -> &str {
        match self {
            Rule::Presence { attribute }
            | Rule::Absence { attribute }
            | Rule::Inclusion { attribute, .. }
            | Rule::Length { attribute, .. } => attribute,
        }
    }

    fn check(&self, subject: &Subject<'_>) -> Option<FailureKind> {
        match self {
            Rule::Presence { .. } => subject.is_blank().then_some(FailureKind::Blank),
            Rule::Absence { .. } => (!subject.is_blank()).then_some(FailureKind::Present),
            Rule::Inclusion { allowed, .. } => {
                let included = match subject {
                    Subject::Value(Some(value)) => allowed.contains(value),
                    Subject::Content(Some(html)) => {
                        let text = html.to_text();
                        allowed.iter().any(|v| v.as_str() == Some(text.as_str()))
                    }
                    _ => false,
                };
                (!included).then_some(FailureKind::Inclusion)
            }
            Rule::Length { min, max, .. } => {
                let len = subject.length();
                if let Some(min) = *min {
                    if len < min {
                        return Some(FailureKind::TooShort { min });
                    }
                }
                if let Some(max) = *max {
                    if len > max {
                        return Some(FailureKind::TooLong { max });
                    }
                }
                None
            }
        }
    }
}

/// What a rule is checked against
enum Subject<'v> {
    Content(Option<&'v SafeHtml>),
    Value(Option<&'v Value>),
}

impl Subject<'_> {
    fn is_blank(&self) -> bool {
        match self {
            Subject::Content(content) => content.map_or(true, |c| c.is_blank()),
            Subject::Value(value) => value.map_or(true, is_blank),
        }
    }

    fn length(&self) -> usize {
        match self {
            Subject::Content(content) => content.map_or(0, |c| c.to_text().chars().count()),
            Subject::Value(Some(Value::String(s))) => s.chars().count(),
            Subject::Value(Some(Value::Array(items))) => items.len(),
            Subject::Value(Some(Value::Object(map))) => map.len(),
            Subject::Value(Some(Value::Null)) | Subject::Value(None) => 0,
            Subject::Value(Some(other)) => other.to_string().chars().count(),
        }
    }
}

/// Blank means missing, null, false, whitespace-only, or an empty collection
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// Why a rule failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Blank,
    Present,
    Inclusion,
    TooShort { min: usize },
    TooLong { max: usize },
}

impl FailureKind {
    pub fn message(&self) -> String {
        match self {
            FailureKind::Blank => "can't be blank".to_string(),
            FailureKind::Present => "must be blank".to_string(),
            FailureKind::Inclusion => "is not included in the list".to_string(),
            FailureKind::TooShort { min } => {
                format!("is too short (minimum is {} characters)", min)
            }
            FailureKind::TooLong { max } => {
                format!("is too long (maximum is {} characters)", max)
            }
        }
    }
}

/// A failed rule for one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub attribute: String,
    pub kind: FailureKind,
}

impl ValidationFailure {
    /// "Color is not included in the list"
    pub fn full_message(&self) -> String {
        format!("{} {}", humanize(&self.attribute), self.kind.message())
    }
}

/// All failures from one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    failures: Vec<ValidationFailure>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed: {}", self.full_messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.failures.iter()
    }

    /// Failures recorded for one attribute
    pub fn on(&self, attribute: &str) -> Vec<&FailureKind> {
        self.failures
            .iter()
            .filter(|f| f.attribute == attribute)
            .map(|f| &f.kind)
            .collect()
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.full_message()).collect()
    }
}

fn humanize(attribute: &str) -> String {
    let spaced = attribute.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Run every rule and fail with all collected failures
pub fn validate(
    component: &str,
    rules: &[Rule],
    attributes: &Attributes,
    content: Option<&SafeHtml>,
) -> Result<(), ComponentError> {
    let failures: Vec<ValidationFailure> = rules
        .iter()
        .filter_map(|rule| {
            let subject = if rule.attribute() == CONTENT {
                Subject::Content(content)
            } else {
                Subject::Value(attributes.get(rule.attribute()))
            };
            rule.check(&subject).map(|kind| ValidationFailure {
                attribute: rule.attribute().to_string(),
                kind,
            })
        })
        .collect();

    if failures.is_empty() {
        return Ok(());
    }

    let errors = ValidationErrors { failures };
    tracing::debug!(component, errors = %errors, "component failed validation");
    Err(ComponentError::Validation(errors))
}
