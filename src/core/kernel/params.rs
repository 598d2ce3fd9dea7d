use crate::core::errors::ExchangeError;
use rust_decimal::Decimal;
use std::collections::btree_map::{self, BTreeMap};
use url::form_urlencoded;

/// Wire name that excludes a field from the encoded output
pub const SKIP: &str = "-";

/// Query parameters of a single request, keyed by wire name.
///
/// Keys are kept sorted so the encoded string is identical for identical
/// contents, which the signature depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    values: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.values.iter()
    }

    /// URL-encode the set as `k1=v1&k2=v2`, sorted by key
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.values.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// A field value as seen by the encoder
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Absent,
    Text(String),
    Int(i64),
    UInt(u64),
    Decimal(Decimal),
    Bool(bool),
}

impl ParamValue {
    /// Whether the value is the zero value of its type
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(s) => s.is_empty(),
            Self::Int(v) => *v == 0,
            Self::UInt(v) => *v == 0,
            Self::Decimal(v) => v.is_zero(),
            Self::Bool(v) => !v,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Absent => String::new(),
            Self::Text(s) => s.clone(),
            Self::Int(v) => v.to_string(),
            Self::UInt(v) => v.to_string(),
            Self::Decimal(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<Decimal> for ParamValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Static description of one encodable field of `T`
pub struct ParamField<T> {
    name: &'static str,
    omit_empty: bool,
    empty_value: Option<&'static str>,
    value: fn(&T) -> ParamValue,
}

impl<T> ParamField<T> {
    /// Field that is always emitted, zero values included
    pub const fn new(name: &'static str, value: fn(&T) -> ParamValue) -> Self {
        Self {
            name,
            omit_empty: false,
            empty_value: None,
            value,
        }
    }

    /// Field that is left out while it holds its zero value
    pub const fn omit_empty(name: &'static str, value: fn(&T) -> ParamValue) -> Self {
        Self {
            name,
            omit_empty: true,
            empty_value: None,
            value,
        }
    }

    /// Field that emits `empty_value` in place of its zero value
    pub const fn with_empty_value(
        name: &'static str,
        empty_value: &'static str,
        value: fn(&T) -> ParamValue,
    ) -> Self {
        Self {
            name,
            omit_empty: false,
            empty_value: Some(empty_value),
            value,
        }
    }

    /// Field that is never emitted
    pub const fn skip(value: fn(&T) -> ParamValue) -> Self {
        Self::new(SKIP, value)
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn encode(&self, record: &T) -> Option<String> {
        let value = (self.value)(record);
        if value.is_zero() {
            if let Some(empty) = self.empty_value {
                return Some(empty.to_string());
            }
            if self.omit_empty {
                return None;
            }
        }
        Some(value.render())
    }
}

/// A flat record that can be encoded into query parameters
pub trait ParamRecord: Sized + 'static {
    const FIELDS: &'static [ParamField<Self>];

    fn to_params(&self) -> Result<ParameterSet, ExchangeError> {
        encode(self)
    }
}

/// Encode `record` into a [`ParameterSet`] following its field table.
///
/// Fails with `InvalidParameters` when the table itself is malformed: an
/// empty wire name, or two fields sharing one wire name.
pub fn encode<T: ParamRecord>(record: &T) -> Result<ParameterSet, ExchangeError> {
    let mut out = ParameterSet::new();
    let mut seen: Vec<&'static str> = Vec::with_capacity(T::FIELDS.len());

    for field in T::FIELDS {
        if field.name == SKIP {
            continue;
        }
        if field.name.is_empty() {
            return Err(ExchangeError::InvalidParameters(format!(
                "{} declares a field without a name",
                std::any::type_name::<T>()
            )));
        }
        if seen.contains(&field.name) {
            return Err(ExchangeError::InvalidParameters(format!(
                "{} maps more than one field to '{}'",
                std::any::type_name::<T>(),
                field.name
            )));
        }
        seen.push(field.name);

        if let Some(value) = field.encode(record) {
            out.set(field.name, value);
        }
    }

    Ok(out)
}
