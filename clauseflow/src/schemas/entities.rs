//! Named entity records.

use super::de;
use serde::{Deserialize, Deserializer, Serialize};

/// Canonical form of an entity type label: upper case, words joined by `_`.
#[must_use]
pub fn normalize_entity_type(label: &str) -> String {
    label
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn entity_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(normalize_entity_type(&de::text(deserializer)?))
}

/// Character range of an entity inside its clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Start offset.
    pub start: usize,
    /// End offset, exclusive.
    pub end: usize,
}

/// An entity found in the extracted clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type such as `DATE`, `DURATION`, `MONEY` or `PARTY`.
    #[serde(alias = "type", alias = "label", deserialize_with = "entity_type")]
    pub entity_type: String,
    /// The entity text.
    #[serde(alias = "text", deserialize_with = "de::text")]
    pub value: String,
    /// Location inside the clause, if the model gave one.
    #[serde(default)]
    pub span: Option<TextSpan>,
    /// Index of the clause the entity came from.
    #[serde(default, deserialize_with = "de::opt_usize")]
    pub clause_index: Option<usize>,
    /// Role of the entity, mostly for parties.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub role: Option<String>,
}

impl Entity {
    /// Creates an entity with type and value set.
    #[must_use]
    pub fn new(entity_type: &str, value: impl Into<String>) -> Self {
        Self {
            entity_type: normalize_entity_type(entity_type),
            value: value.into(),
            span: None,
            clause_index: None,
            role: None,
        }
    }

    /// Sets the source clause index.
    #[must_use]
    pub fn with_clause_index(mut self, index: usize) -> Self {
        self.clause_index = Some(index);
        self
    }

    /// Returns true if the entity has the given type, compared in canonical form.
    #[must_use]
    pub fn is_type(&self, entity_type: &str) -> bool {
        self.entity_type == normalize_entity_type(entity_type)
    }
}

/// Entities produced by the NER stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    /// Entities in the order the model listed them.
    pub entities: Vec<Entity>,
}

impl EntitySet {
    /// Entities of one type.
    pub fn of_type(&self, entity_type: &str) -> impl Iterator<Item = &Entity> + '_ {
        let wanted = normalize_entity_type(entity_type);
        self.entities.iter().filter(move |e| e.entity_type == wanted)
    }

    /// Looks up an entity by type and exact value.
    #[must_use]
    pub fn find(&self, entity_type: &str, value: &str) -> Option<&Entity> {
        self.of_type(entity_type).find(|e| e.value == value)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
