//! State-reference templates
//!
//! Text inside a step may embed `##STATE:<Key>:##` tokens. Templates are
//! parsed once into literal and state-reference segments and evaluated
//! against the [`StateStore`] right before the step runs.

use super::state::{StateStore, value_text};
use serde_json::{Map, Value};

/// Opening marker of a state reference
pub const TOKEN_OPEN: &str = "##STATE:";
/// Closing marker of a state reference
pub const TOKEN_CLOSE: &str = ":##";

/// Key that was referenced but not present in the state store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey(pub String);

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    StateRef(String),
}

/// Parsed text with embedded state references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Opaque text; token-shaped content is kept verbatim
    pub fn literal(text: impl Into<String>) -> Self {
        let mut template = Self::default();
        template.push_literal(&text.into());
        template
    }

    /// Parse `text`, turning every well-formed token into a state reference
    ///
    /// An unterminated opener or an empty key is left as literal text.
    pub fn parse(text: &str) -> Self {
        let mut template = Self::default();
        let mut rest = text;

        while let Some(start) = rest.find(TOKEN_OPEN) {
            let after_open = &rest[start + TOKEN_OPEN.len()..];
            let Some(end) = after_open.find(TOKEN_CLOSE) else {
                break;
            };
            let key = &after_open[..end];
            if key.is_empty() {
                template.push_literal(&rest[..start + TOKEN_OPEN.len()]);
                rest = after_open;
                continue;
            }
            template.push_literal(&rest[..start]);
            template.segments.push(Segment::StateRef(key.to_string()));
            rest = &after_open[end + TOKEN_CLOSE.len()..];
        }
        template.push_literal(rest);
        template
    }

    fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Literal(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Literal(text.to_string()));
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Keys referenced by this template, in order of appearance
    pub fn state_refs(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::StateRef(key) => Some(key.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn is_literal(&self) -> bool {
        self.state_refs().next().is_none()
    }

    /// The key if the whole template is exactly one state reference
    pub fn as_single_ref(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [Segment::StateRef(key)] => Some(key),
            _ => None,
        }
    }

    /// Evaluate to text, using the string form of every referenced value
    pub fn render(&self, state: &StateStore) -> Result<String, MissingKey> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::StateRef(key) => {
                    let value = state.get(key).ok_or_else(|| MissingKey(key.clone()))?;
                    out.push_str(&value_text(value));
                }
            }
        }
        Ok(out)
    }

    /// Evaluate as a whole leaf value
    ///
    /// A template that is a single reference yields the stored value with its
    /// native type; anything else yields a string.
    pub fn resolve_value(&self, state: &StateStore) -> Result<Value, MissingKey> {
        if let Some(key) = self.as_single_ref() {
            return state.get(key).cloned().ok_or_else(|| MissingKey(key.to_string()));
        }
        self.render(state).map(Value::String)
    }

    /// Text this template was parsed from
    pub fn source(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.clone(),
                Segment::StateRef(key) => format!("{TOKEN_OPEN}{key}{TOKEN_CLOSE}"),
            })
            .collect()
    }
}

/// A payload value whose strings and map keys may hold templates
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Text(Template),
    /// Number, bool or null; never substituted
    Native(Value),
    List(Vec<TemplateValue>),
    Map(Vec<(Template, TemplateValue)>),
}

impl TemplateValue {
    /// Compile a JSON value; with `substitute` off all text stays opaque
    pub fn compile(value: &Value, substitute: bool) -> Self {
        match value {
            Value::String(s) => Self::Text(compile_text(s, substitute)),
            Value::Array(items) => {
                Self::List(items.iter().map(|v| Self::compile(v, substitute)).collect())
            }
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (compile_text(k, substitute), Self::compile(v, substitute)))
                    .collect(),
            ),
            other => Self::Native(other.clone()),
        }
    }

    pub fn resolve(&self, state: &StateStore) -> Result<Value, MissingKey> {
        Ok(match self {
            Self::Text(template) => template.resolve_value(state)?,
            Self::Native(value) => value.clone(),
            Self::List(items) => Value::Array(
                items.iter().map(|v| v.resolve(state)).collect::<Result<_, _>>()?,
            ),
            Self::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.render(state)?, value.resolve(state)?);
                }
                Value::Object(map)
            }
        })
    }
}

/// Parse `text` when substitution is enabled, otherwise keep it opaque
pub fn compile_text(text: &str, substitute: bool) -> Template {
    if substitute {
        Template::parse(text)
    } else {
        Template::literal(text)
    }
}
