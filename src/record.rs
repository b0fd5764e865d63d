// The inspection record: one immutable bag of form fields plus named photos.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::Value;

use crate::error::ReportError;
use crate::schema::{self, FieldKind, ValueSource, REGISTRATION_NUMBER};

/// Drawn wherever a declared field has no value.
pub const PLACEHOLDER: &str = "N/A";

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Display form, or `None` when the value is empty.
    pub fn display(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
            FieldValue::List(items) => {
                let items: Vec<&str> = items
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                (!items.is_empty()).then(|| items.join(", "))
            }
            FieldValue::Map(_) => None,
        }
    }

    /// Finite numeric value; `nan` and `inf` count as absent.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        n.filter(|n| n.is_finite())
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Array(items) => Some(FieldValue::List(
                items.iter().filter_map(scalar_string).collect(),
            )),
            Value::Object(map) => Some(FieldValue::Map(
                map.iter()
                    .filter_map(|(k, v)| FieldValue::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_number),
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        _ => None,
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::List(value.into_iter().map(str::to_string).collect())
    }
}

/// Apply the declared shape of `name` to a raw value.
fn coerce(name: &str, value: FieldValue) -> Result<FieldValue, ReportError> {
    match (schema::field_kind(name), value) {
        (FieldKind::List, FieldValue::List(items)) => Ok(FieldValue::List(items)),
        (FieldKind::List, FieldValue::Map(_)) => Err(ReportError::InvalidRecord(format!(
            "field '{}' must be a list",
            name
        ))),
        (FieldKind::List, scalar) => {
            debug!("coercing scalar '{}' to a one-element list", name);
            Ok(FieldValue::List(scalar.display().into_iter().collect()))
        }
        (FieldKind::Map, FieldValue::Map(map)) => Ok(FieldValue::Map(map)),
        (FieldKind::Map, _) => Err(ReportError::InvalidRecord(format!(
            "field '{}' must be an object",
            name
        ))),
        (FieldKind::Scalar, FieldValue::Map(_)) => Err(ReportError::InvalidRecord(format!(
            "field '{}' must not be an object",
            name
        ))),
        (FieldKind::Scalar, value) => Ok(value),
    }
}

// ============================================================================
// Inspection record
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InspectionRecord {
    fields: BTreeMap<String, FieldValue>,
    /// Slot name to bytes. `None` means the slot was named but nothing usable arrived.
    photos: BTreeMap<String, Option<Vec<u8>>>,
}

impl InspectionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Values are coerced to the field's declared kind;
    /// a value of the wrong shape (a map for a list field) is dropped with a warning.
    /// Use [`from_json`](Self::from_json) to reject such input instead.
    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        match coerce(name, value.into()) {
            Ok(v) => {
                self.fields.insert(name.to_string(), v);
            }
            Err(e) => warn!("dropping field '{}': {}", name, e),
        }
        self
    }

    pub fn with_photo(mut self, slot: &str, bytes: Option<Vec<u8>>) -> Self {
        self.photos.insert(slot.to_string(), bytes);
        self
    }

    /// Build from a JSON object. A `photos` key is ignored here; photo references are
    /// resolved separately and attached with [`with_photo`](Self::with_photo).
    pub fn from_json(value: &Value) -> Result<Self, ReportError> {
        let object = value.as_object().ok_or_else(|| {
            ReportError::InvalidRecord("inspection data must be a JSON object".to_string())
        })?;

        let mut fields = BTreeMap::new();
        for (name, raw) in object {
            if name == "photos" {
                continue;
            }
            if let Some(v) = FieldValue::from_json(raw) {
                fields.insert(name.clone(), coerce(name, v)?);
            }
        }
        Ok(Self {
            fields,
            photos: BTreeMap::new(),
        })
    }

    /// Build from flat form fields. `name[i]` keys fold into an ordered list,
    /// `name.key` keys fold into a nested map; repeated plain keys keep the last value.
    pub fn from_form_fields<I, K, V>(pairs: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut scalars: BTreeMap<String, String> = BTreeMap::new();
        let mut lists: BTreeMap<String, BTreeMap<usize, String>> = BTreeMap::new();
        let mut maps: BTreeMap<String, BTreeMap<String, FieldValue>> = BTreeMap::new();

        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value: String = value.into();
            if let Some((name, index)) = parse_indexed(key) {
                lists.entry(name.to_string()).or_default().insert(index, value);
            } else if let Some((name, sub)) = key.split_once('.') {
                maps.entry(name.to_string())
                    .or_default()
                    .insert(sub.to_string(), FieldValue::Text(value));
            } else {
                scalars.insert(key.to_string(), value);
            }
        }

        let mut fields = BTreeMap::new();
        for (name, value) in scalars {
            fields.insert(name.clone(), coerce(&name, FieldValue::Text(value))?);
        }
        for (name, indexed) in lists {
            let items: Vec<String> = indexed.into_values().collect();
            fields.insert(name.clone(), coerce(&name, FieldValue::List(items))?);
        }
        for (name, map) in maps {
            fields.insert(name.clone(), coerce(&name, FieldValue::Map(map))?);
        }
        Ok(Self {
            fields,
            photos: BTreeMap::new(),
        })
    }

    /// Reject records that cannot produce a report.
    pub fn validate(&self) -> Result<(), ReportError> {
        self.registration_number().map(|_| ())
    }

    pub fn registration_number(&self) -> Result<String, ReportError> {
        self.text(REGISTRATION_NUMBER)
            .ok_or_else(|| ReportError::MissingField(REGISTRATION_NUMBER.to_string()))
    }

    /// Non-empty display text of a field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).and_then(FieldValue::display)
    }

    /// Non-empty items of a list field.
    pub fn list(&self, name: &str) -> Vec<String> {
        match self.fields.get(name) {
            Some(FieldValue::List(items)) => items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Numeric entry of a nested map, e.g. `ratings.engine`.
    pub fn number_in(&self, map: &str, key: &str) -> Option<f64> {
        match self.fields.get(map) {
            Some(FieldValue::Map(entries)) => entries.get(key).and_then(FieldValue::as_number),
            _ => None,
        }
    }

    /// Resolve a declared row value.
    pub fn resolve(&self, source: &ValueSource) -> Option<String> {
        match source {
            ValueSource::Key(key) => self.text(key),
            ValueSource::FirstOf(keys) => keys.iter().find_map(|k| self.text(k)),
            ValueSource::Joined(keys) => {
                let parts: Vec<String> = keys.iter().filter_map(|k| self.text(k)).collect();
                (!parts.is_empty()).then(|| parts.join(" "))
            }
            ValueSource::WithUnit(key, unit) => self.text(key).map(|v| format!("{} {}", v, unit)),
        }
    }

    pub fn photos(&self) -> &BTreeMap<String, Option<Vec<u8>>> {
        &self.photos
    }

    /// `Some(..)` when the slot was named in the input, with the bytes if any arrived.
    pub fn photo(&self, slot: &str) -> Option<Option<&[u8]>> {
        self.photos.get(slot).map(|bytes| bytes.as_deref())
    }

    pub fn has_photo_slot(&self, slot: &str) -> bool {
        self.photos.contains_key(slot)
    }

    /// Photos that actually carry bytes.
    pub fn photo_count(&self) -> usize {
        self.photos.values().filter(|b| b.is_some()).count()
    }
}

/// `exteriorChecks[3]` -> (`exteriorChecks`, 3)
fn parse_indexed(key: &str) -> Option<(&str, usize)> {
    let open = key.find('[')?;
    let rest = key[open + 1..].strip_suffix(']')?;
    let index = rest.parse().ok()?;
    Some((&key[..open], index))
}
