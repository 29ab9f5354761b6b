//! Indexed datasets that filter trees are evaluated against

use serde_json::Value;

/// The value(s) found at a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    Single(String),
    /// Multi-valued field, e.g. all comment authors of a host
    Many(Vec<String>),
}

impl FieldValue {
    pub fn into_values(self) -> Vec<String> {
        match self {
            FieldValue::Absent => Vec::new(),
            FieldValue::Single(value) => vec![value],
            FieldValue::Many(values) => values,
        }
    }
}

/// A collection of records addressed by index, with dotted-path field lookup
pub trait Dataset {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve `path` on the record at `index`
    fn field_value(&self, index: usize, path: &[&str]) -> FieldValue;
}

impl Dataset for [Value] {
    fn len(&self) -> usize {
        <[Value]>::len(self)
    }

    fn field_value(&self, index: usize, path: &[&str]) -> FieldValue {
        match self.get(index) {
            Some(record) => resolve_path(record, path),
            None => FieldValue::Absent,
        }
    }
}

impl Dataset for Vec<Value> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn field_value(&self, index: usize, path: &[&str]) -> FieldValue {
        self.as_slice().field_value(index, path)
    }
}

/// Follow a dotted path through objects; arrays on the way fan out so that
/// every element contributes its value
fn resolve_path(record: &Value, path: &[&str]) -> FieldValue {
    let mut current: Vec<&Value> = vec![record];
    let mut fanned_out = false;

    for segment in path {
        let mut next = Vec::with_capacity(current.len());
        for value in current {
            match value {
                Value::Array(items) => {
                    fanned_out = true;
                    next.extend(items.iter().filter_map(|item| item.get(*segment)));
                }
                other => next.extend(other.get(*segment)),
            }
        }
        current = next;
    }

    let mut values = Vec::with_capacity(current.len());
    for value in current {
        match value {
            Value::Array(items) => {
                fanned_out = true;
                values.extend(items.iter().filter_map(leaf_to_string));
            }
            other => values.extend(leaf_to_string(other)),
        }
    }

    match values.len() {
        0 => FieldValue::Absent,
        1 if !fanned_out => FieldValue::Single(values.remove(0)),
        _ => FieldValue::Many(values),
    }
}

/// Objects are kept as JSON text so that aggregates still count them
fn leaf_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(_) => Some(value.to_string()),
        Value::Null | Value::Array(_) => None,
    }
}
