//! Campaign entity vocabulary shared across bounded contexts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The closed set of campaign entity kinds.
///
/// Every kind maps to exactly one backing repository in
/// [`crate::repository::EntityRepositorySet`]; adding a variant here without
/// extending the dispatch table is a compile error by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A game world.
    World,
    /// A campaign within a world.
    Campaign,
    /// A play session within a campaign.
    Session,
    /// A player or non-player character.
    Character,
    /// A place in the world.
    Location,
    /// An item or piece of equipment.
    Item,
    /// A world or campaign event.
    Event,
    /// A power, spell, or ability.
    Power,
    /// A typed edge between two entities.
    Relationship,
}

impl EntityKind {
    /// Lowercase wire name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::World => "world",
            Self::Campaign => "campaign",
            Self::Session => "session",
            Self::Character => "character",
            Self::Location => "location",
            Self::Item => "item",
            Self::Event => "event",
            Self::Power => "power",
            Self::Relationship => "relationship",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored campaign entity, attribute-mapped.
///
/// The graph store is opaque to the domain; entities cross the repository
/// boundary as flat attribute documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Store-assigned identifier.
    pub id: String,
    /// The entity's kind.
    pub kind: EntityKind,
    /// Flat attribute document.
    pub attributes: Map<String, Value>,
}

/// A directed, typed edge between two entities, with free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipChange {
    /// Identifier of the edge's source entity.
    #[serde(alias = "sourceId")]
    pub source_id: String,
    /// Kind of the source entity.
    #[serde(alias = "sourceType", alias = "source_type")]
    pub source_kind: EntityKind,
    /// Identifier of the edge's target entity.
    #[serde(alias = "targetId")]
    pub target_id: String,
    /// Kind of the target entity.
    #[serde(alias = "targetType", alias = "target_type")]
    pub target_kind: EntityKind,
    /// Edge type, e.g. "ALLIED_WITH" or "LOCATED_IN".
    #[serde(alias = "relationshipType")]
    pub relationship_type: String,
    /// Free-form edge properties.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_round_trips_through_lowercase_wire_name() {
        let json = serde_json::to_string(&EntityKind::Character).unwrap();
        assert_eq!(json, "\"character\"");

        let kind: EntityKind = serde_json::from_str("\"location\"").unwrap();
        assert_eq!(kind, EntityKind::Location);
    }

    #[test]
    fn test_entity_kind_display_matches_as_str() {
        assert_eq!(EntityKind::Power.to_string(), "power");
        assert_eq!(EntityKind::World.as_str(), "world");
    }

    #[test]
    fn test_relationship_change_defaults_properties_when_absent() {
        let json = r#"{
            "source_id": "a",
            "source_kind": "character",
            "target_id": "b",
            "target_kind": "location",
            "relationship_type": "LOCATED_IN"
        }"#;
        let change: RelationshipChange = serde_json::from_str(json).unwrap();
        assert!(change.properties.is_empty());
    }
}
