use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::input::ResponseKey;

/// Spatial relation of the probed block with respect to the reference block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    Above,
    Below,
    Left,
    Right,
    NotConnected,
}

impl Relation {
    pub const ALL: [Relation; 5] = [
        Relation::Above,
        Relation::Below,
        Relation::Left,
        Relation::Right,
        Relation::NotConnected,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Relation::Above => "above",
            Relation::Below => "below",
            Relation::Left => "left",
            Relation::Right => "right",
            Relation::NotConnected => "notConnected",
        }
    }

    /// The key that answers with this relation.
    pub fn response_key(&self) -> ResponseKey {
        match self {
            Relation::Above => ResponseKey::ArrowUp,
            Relation::Left => ResponseKey::ArrowLeft,
            Relation::Right => ResponseKey::ArrowRight,
            Relation::Below => ResponseKey::ArrowDown,
            Relation::NotConnected => ResponseKey::Space,
        }
    }

    /// Translates the integer coding used by older stimulus tables.
    pub fn from_legacy_code(code: i64) -> Result<Self, ConfigError> {
        match code {
            1 => Ok(Relation::Left),
            2 => Ok(Relation::Above),
            3 => Ok(Relation::Right),
            4 => Ok(Relation::Below),
            5 => Ok(Relation::NotConnected),
            other => Err(ConfigError::UnknownLegacyCode(other)),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Relation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | ' ' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "above" => Ok(Relation::Above),
            "below" => Ok(Relation::Below),
            "left" => Ok(Relation::Left),
            "right" => Ok(Relation::Right),
            "notconnected" => Ok(Relation::NotConnected),
            _ => Err(ConfigError::UnknownRelation(s.to_string())),
        }
    }
}

/// Ground truth as it appears in authored trial lists: either the string
/// label or the legacy integer code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationRepr {
    Code(i64),
    Label(String),
}

impl TryFrom<RelationRepr> for Relation {
    type Error = ConfigError;

    fn try_from(repr: RelationRepr) -> Result<Self, Self::Error> {
        match repr {
            RelationRepr::Code(code) => Relation::from_legacy_code(code),
            RelationRepr::Label(label) => label.parse(),
        }
    }
}

impl From<Relation> for RelationRepr {
    fn from(relation: Relation) -> Self {
        RelationRepr::Label(relation.label().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_leniently() {
        assert_eq!("above".parse::<Relation>(), Ok(Relation::Above));
        assert_eq!("Below".parse::<Relation>(), Ok(Relation::Below));
        assert_eq!("notConnected".parse::<Relation>(), Ok(Relation::NotConnected));
        assert_eq!("not_connected".parse::<Relation>(), Ok(Relation::NotConnected));
        assert_eq!("not connected".parse::<Relation>(), Ok(Relation::NotConnected));
        assert_eq!(
            "stable".parse::<Relation>(),
            Err(ConfigError::UnknownRelation("stable".into()))
        );
    }

    #[test]
    fn legacy_codes_follow_button_order() {
        assert_eq!(Relation::from_legacy_code(1), Ok(Relation::Left));
        assert_eq!(Relation::from_legacy_code(2), Ok(Relation::Above));
        assert_eq!(Relation::from_legacy_code(3), Ok(Relation::Right));
        assert_eq!(Relation::from_legacy_code(4), Ok(Relation::Below));
        assert_eq!(Relation::from_legacy_code(5), Ok(Relation::NotConnected));
        assert_eq!(
            Relation::from_legacy_code(0),
            Err(ConfigError::UnknownLegacyCode(0))
        );
    }

    #[test]
    fn mapping_to_keys_is_a_bijection() {
        for relation in Relation::ALL {
            assert_eq!(relation.response_key().relation(), relation);
        }
    }

    #[test]
    fn repr_accepts_label_or_code() {
        let label: RelationRepr = serde_json::from_str("\"left\"").unwrap();
        let code: RelationRepr = serde_json::from_str("2").unwrap();
        assert_eq!(Relation::try_from(label), Ok(Relation::Left));
        assert_eq!(Relation::try_from(code), Ok(Relation::Above));
    }

    #[test]
    fn serializes_canonical_labels() {
        let json = serde_json::to_string(&Relation::NotConnected).unwrap();
        assert_eq!(json, "\"notConnected\"");
    }
}
