//! Lenient deserializers for model-produced fields.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Integer(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Flag(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Option<Scalar>>),
    One(Scalar),
}

/// Accepts a string, a number, a list of either, or null, and yields
/// the non-empty entries as strings.
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<OneOrMany>::deserialize(deserializer)?;
    let items = match value {
        None => Vec::new(),
        Some(OneOrMany::One(item)) => vec![item.into_text()],
        Some(OneOrMany::Many(items)) => items
            .into_iter()
            .flatten()
            .map(Scalar::into_text)
            .collect(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Accepts a string, a number or null, and yields a trimmed non-empty string.
pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value
        .map(Scalar::into_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Accepts a string, a number or null, and yields a string (empty for null).
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// Accepts a number, a numeric string or null.
pub(crate) fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match value {
        Some(Scalar::Float(n)) => Some(n),
        #[allow(clippy::cast_precision_loss)]
        Some(Scalar::Integer(n)) => Some(n as f64),
        Some(Scalar::Text(s)) => s.trim().parse().ok(),
        Some(Scalar::Flag(_)) | None => None,
    })
}

/// Accepts a non-negative integer, an integer string or null.
pub(crate) fn opt_usize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match value {
        Some(Scalar::Integer(n)) => usize::try_from(n).ok(),
        Some(Scalar::Text(s)) => s.trim().parse().ok(),
        Some(Scalar::Float(_) | Scalar::Flag(_)) | None => None,
    })
}
