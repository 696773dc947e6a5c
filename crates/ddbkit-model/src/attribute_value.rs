//! Attribute values.
//!
//! On the wire a value is an object with exactly one type tag, e.g.
//! `{"S": "hello"}` or `{"L": [{"N": "1"}]}`.
//!
//! Builders accept anything convertible into an `AttributeValue`, so the
//! common Rust scalars, lists and maps have `From` conversions here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A typed attribute value.
///
/// Numbers stay as text so no precision is lost in transit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// `S`.
    S(String),
    /// `N`: decimal text.
    N(String),
    /// `B`: binary, base64 on the wire.
    #[serde(with = "base64_bytes")]
    B(bytes::Bytes),
    /// `SS`: set of strings.
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    /// `NS`: set of numbers.
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    /// `BS`: set of binaries.
    #[serde(rename = "BS", with = "base64_bytes_set")]
    Bs(Vec<bytes::Bytes>),
    /// `BOOL`.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// `NULL`, always `true` on the wire.
    #[serde(rename = "NULL")]
    Null(bool),
    /// `L`: ordered, heterogeneous list.
    L(Vec<AttributeValue>),
    /// `M`: nested document.
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Whether this is an `L`.
    #[must_use]
    pub fn is_l(&self) -> bool {
        matches!(self, Self::L(_))
    }

    /// `S` payload.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// `N` payload as text.
    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    /// `M` payload.
    #[must_use]
    pub fn as_m(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            Self::M(m) => Some(m),
            _ => None,
        }
    }

    /// `L` payload.
    #[must_use]
    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::L(l) => Some(l),
            _ => None,
        }
    }

    /// `BOOL` payload.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Wrap the value into a one-element list unless it already is a list.
    #[must_use]
    pub fn into_list(self) -> Self {
        if self.is_l() {
            self
        } else {
            Self::L(vec![self])
        }
    }

    /// `N` value for a finite float, `None` for `NaN` and the infinities.
    #[must_use]
    pub fn finite_number(n: f64) -> Option<Self> {
        n.is_finite().then(|| Self::N(n.to_string()))
    }

    /// Wire tag of the variant.
    #[must_use]
    pub fn type_descriptor(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(n: $ty) -> Self {
                    Self::N(n.to_string())
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize);

/// Renders with `f64`'s `Display`. `NaN` and the infinities become `NaN`,
/// `inf` and `-inf`, which the store rejects as numbers; use
/// [`AttributeValue::finite_number`] for untrusted floats.
impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        Self::N(n.to_string())
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(list: Vec<AttributeValue>) -> Self {
        Self::L(list)
    }
}

impl From<HashMap<String, AttributeValue>> for AttributeValue {
    fn from(map: HashMap<String, AttributeValue>) -> Self {
        Self::M(map)
    }
}

impl From<bytes::Bytes> for AttributeValue {
    fn from(b: bytes::Bytes) -> Self {
        Self::B(b)
    }
}

/// A scalar attribute value: string, number or boolean.
///
/// Key conditions only compare scalars, so the query builder takes this
/// instead of a full [`AttributeValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarValue {
    /// `S`.
    S(String),
    /// Number value (string-encoded).
    N(String),
    /// Boolean value.
    Bool(bool),
}

impl From<ScalarValue> for AttributeValue {
    fn from(v: ScalarValue) -> Self {
        match v {
            ScalarValue::S(s) => Self::S(s),
            ScalarValue::N(n) => Self::N(n),
            ScalarValue::Bool(b) => Self::Bool(b),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! scalar_number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(n: $ty) -> Self {
                    Self::N(n.to_string())
                }
            }
        )*
    };
}

scalar_number_from!(i32, i64, u32, u64, usize);

/// Same rendering caveat as `From<f64> for AttributeValue`.
impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        Self::N(n.to_string())
    }
}

impl ScalarValue {
    /// Number operand for a finite float, `None` for `NaN` and the infinities.
    #[must_use]
    pub fn finite_number(n: f64) -> Option<Self> {
        n.is_finite().then(|| Self::N(n.to_string()))
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(de::Error::custom)
    }
}

mod base64_bytes_set {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S: Serializer>(set: &[Bytes], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(set.len()))?;
        for bytes in set {
            seq.serialize_element(&STANDARD.encode(bytes))?;
        }
        seq.end()
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Bytes>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|encoded| STANDARD.decode(encoded).map(Bytes::from))
            .collect::<Result<_, _>>()
            .map_err(de::Error::custom)
    }
}
