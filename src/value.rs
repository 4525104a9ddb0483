use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// The right-hand side of an assignment, possibly nested.
///
/// `Simple` text is opaque: a literal, an identifier or any expression the
/// target language accepts. The other variants are structure the editor
/// builds up piece by piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Value {
    Simple {
        value: String,
    },
    Array {
        items: Vec<Value>,
    },
    /// Ordered pairs. Duplicate keys are allowed here and reported by
    /// [`Value::duplicate_keys`].
    Object {
        properties: Vec<ObjectProperty>,
    },
    FunctionCall {
        #[serde(rename = "functionName")]
        function_name: String,
        arguments: Vec<FunctionArgument>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub key: String,
    pub value: Value,
}

/// A call argument: positional when `name` is `None`, keyword otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionArgument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Value,
}

impl Value {
    pub fn simple(text: impl Into<String>) -> Self {
        Value::Simple { value: text.into() }
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array { items }
    }

    pub fn object(properties: Vec<ObjectProperty>) -> Self {
        Value::Object { properties }
    }

    pub fn function_call(name: impl Into<String>, arguments: Vec<FunctionArgument>) -> Self {
        Value::FunctionCall {
            function_name: name.into(),
            arguments,
        }
    }

    /// Lift a legacy scalar-only value (plain expression text) into the tree form.
    pub fn migrate(legacy: &str) -> Self {
        Value::simple(legacy)
    }

    /// Render as target-language expression text.
    pub fn to_source(&self) -> String {
        let mut buf = String::new();
        write_value(&mut buf, self);
        buf
    }

    /// Keys that occur more than once in an object value, each reported once,
    /// in the order their repeats appear. Always empty for other variants.
    pub fn duplicate_keys(&self) -> Vec<String> {
        let Value::Object { properties } = self else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut duplicates: Vec<String> = Vec::new();
        for prop in properties {
            if !seen.insert(prop.key.as_str()) && !duplicates.contains(&prop.key) {
                duplicates.push(prop.key.clone());
            }
        }
        duplicates
    }

    /// Compiled text cut down to at most `max_len` characters, ending in `...`
    /// when truncated.
    pub fn display_string(&self, max_len: usize) -> String {
        let compiled = self.to_source();
        if compiled.chars().count() <= max_len {
            return compiled;
        }
        let mut short: String = compiled.chars().take(max_len.saturating_sub(3)).collect();
        short.push_str("...");
        short
    }

    /// Number of simple leaves in the value.
    pub fn count_items(&self) -> usize {
        match self {
            Value::Simple { .. } => 1,
            Value::Array { items } => items.iter().map(Value::count_items).sum(),
            Value::Object { properties } => properties.iter().map(|p| p.value.count_items()).sum(),
            Value::FunctionCall { arguments, .. } => {
                arguments.iter().map(|a| a.value.count_items()).sum()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Simple { value } => value.trim().is_empty(),
            Value::Array { items } => items.is_empty(),
            Value::Object { properties } => properties.is_empty(),
            Value::FunctionCall { function_name, .. } => function_name.trim().is_empty(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::simple("")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

impl ObjectProperty {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        ObjectProperty {
            key: key.into(),
            value,
        }
    }
}

impl FunctionArgument {
    pub fn positional(value: Value) -> Self {
        FunctionArgument { name: None, value }
    }

    pub fn keyword(name: impl Into<String>, value: Value) -> Self {
        FunctionArgument {
            name: Some(name.into()),
            value,
        }
    }
}

fn write_value(buf: &mut String, value: &Value) {
    match value {
        Value::Simple { value } if value.is_empty() => buf.push_str("\"\""),
        Value::Simple { value } => buf.push_str(value),
        Value::Array { items } => {
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                write_value(buf, item);
            }
            buf.push(']');
        }
        Value::Object { properties } => {
            buf.push('{');
            for (i, prop) in properties.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                write_key(buf, &prop.key);
                buf.push_str(": ");
                write_value(buf, &prop.value);
            }
            buf.push('}');
        }
        Value::FunctionCall {
            function_name,
            arguments,
        } => {
            buf.push_str(function_name);
            buf.push('(');
            for (i, arg) in arguments.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                if let Some(name) = &arg.name {
                    buf.push_str(name);
                    buf.push('=');
                }
                write_value(buf, &arg.value);
            }
            buf.push(')');
        }
    }
}

/// Keys are always quoted; a key containing `"` falls back to single quotes.
fn write_key(buf: &mut String, key: &str) {
    let quote = if key.contains('"') { '\'' } else { '"' };
    buf.push(quote);
    buf.push_str(key);
    buf.push(quote);
}

/// Either a current tagged value or a bare legacy string.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Legacy(String),
    Current(Value),
}

/// Deserialize a value field, migrating legacy scalar strings on the way in.
pub(crate) fn deserialize_migrating<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StoredValue::deserialize(deserializer)? {
        StoredValue::Legacy(text) => Value::migrate(&text),
        StoredValue::Current(value) => value,
    })
}
