//! Operational detail stored alongside each work-order record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::lenient;

/// Error returned when a classification string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} value: '{value}'")]
pub struct UnknownClassification {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a string-backed classification enum.
///
/// Parsing is case-insensitive and ignores surrounding whitespace; values
/// serialize in lowercase.
macro_rules! classification {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownClassification;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let folded = s.trim().to_ascii_lowercase();
                $(
                    if folded == $text {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownClassification {
                    kind: stringify!($name),
                    value: s.to_string(),
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

classification! {
    /// What part of the installation the work order covered.
    Scope {
        Board => "board",
        Circuit => "circuit",
        Luminaire => "luminaire",
        Other => "other",
    }
}

classification! {
    /// Whether the requested work was finished.
    Outcome {
        Complete => "complete",
        Partial => "partial",
    }
}

classification! {
    /// Board condition after the visit. Meaningful for board and circuit scope.
    BoardHealth {
        Critical => "critical",
        Partial => "partial",
        Ok => "ok",
        Unspecified => "",
    }
}

classification! {
    /// Luminaire condition after the visit. Meaningful for luminaire scope.
    LuminaireHealth {
        Repaired => "repaired",
        Off => "off",
        Pending => "pending",
        Unspecified => "",
    }
}

impl Scope {
    pub fn allows_board_health(&self) -> bool {
        matches!(self, Scope::Board | Scope::Circuit)
    }

    pub fn allows_luminaire_health(&self) -> bool {
        matches!(self, Scope::Luminaire)
    }
}

/// A technician who took part in the work order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    #[serde(default, deserialize_with = "lenient::text")]
    pub badge: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
}

/// A material line consumed during the work order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit: String,
}

/// Full operational record of a work order.
///
/// Classification fields are `None` when the record predates them; the
/// schema migrator fills those gaps. Evidence is summarized as flags, never
/// embedded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderDetail {
    #[serde(
        default,
        deserialize_with = "lenient::parsed",
        skip_serializing_if = "Option::is_none"
    )]
    pub scope: Option<Scope>,
    #[serde(
        default,
        deserialize_with = "lenient::parsed",
        skip_serializing_if = "Option::is_none"
    )]
    pub outcome: Option<Outcome>,
    #[serde(
        default,
        deserialize_with = "lenient::parsed",
        skip_serializing_if = "Option::is_none"
    )]
    pub board_health: Option<BoardHealth>,
    #[serde(
        default,
        deserialize_with = "lenient::parsed",
        skip_serializing_if = "Option::is_none"
    )]
    pub luminaire_health: Option<LuminaireHealth>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub circuit: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub luminaire_equipment: String,

    #[serde(default, deserialize_with = "lenient::number")]
    pub km_start: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub km_end: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub km_total: Option<f64>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub technicians: Vec<Technician>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub materials: Vec<Material>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub task_requested: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub task_performed: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub task_pending: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub observations: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub technician_signatory: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub supervisor_signatory: String,

    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_signature: bool,
    #[serde(default, deserialize_with = "lenient::count")]
    pub photo_count: u32,
}

impl WorkOrderDetail {
    /// True when any classification introduced after the first release is absent.
    pub fn missing_classification(&self) -> bool {
        self.scope.is_none()
            || self.outcome.is_none()
            || self.board_health.is_none()
            || self.luminaire_health.is_none()
    }

    /// Whether the record mentions luminaire equipment at all.
    pub fn mentions_luminaires(&self) -> bool {
        !self.luminaire_equipment.trim().is_empty()
    }

    /// Every free-text value of the detail, space separated, for substring search.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            self.circuit.as_str(),
            self.luminaire_equipment.as_str(),
            self.task_requested.as_str(),
            self.task_performed.as_str(),
            self.task_pending.as_str(),
            self.observations.as_str(),
            self.technician_signatory.as_str(),
            self.supervisor_signatory.as_str(),
        ];
        for classification in [
            self.scope.map(|s| s.as_str()),
            self.outcome.map(|o| o.as_str()),
            self.board_health.map(|h| h.as_str()),
            self.luminaire_health.map(|h| h.as_str()),
        ]
        .into_iter()
        .flatten()
        {
            parts.push(classification);
        }
        for tech in &self.technicians {
            parts.push(&tech.badge);
            parts.push(&tech.name);
        }
        for material in &self.materials {
            parts.push(&material.name);
            parts.push(&material.unit);
        }
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_parse_is_case_insensitive() {
        assert_eq!("LUMINAIRE".parse::<Scope>().unwrap(), Scope::Luminaire);
        assert_eq!(" Partial ".parse::<Outcome>().unwrap(), Outcome::Partial);
        assert_eq!("".parse::<BoardHealth>().unwrap(), BoardHealth::Unspecified);
        assert!("".parse::<Scope>().is_err());
        assert!("cabinet".parse::<Scope>().is_err());
    }

    #[test]
    fn test_absent_and_blank_classifications() {
        let detail: WorkOrderDetail =
            serde_json::from_str(r#"{"scope": "", "board_health": "", "outcome": "bogus"}"#)
                .unwrap();
        assert_eq!(detail.scope, None);
        assert_eq!(detail.outcome, None);
        assert_eq!(detail.board_health, Some(BoardHealth::Unspecified));
        assert_eq!(detail.luminaire_health, None);
        assert!(detail.missing_classification());
    }

    #[test]
    fn test_unspecified_health_round_trips_as_present() {
        let detail = WorkOrderDetail {
            scope: Some(Scope::Board),
            outcome: Some(Outcome::Complete),
            board_health: Some(BoardHealth::Unspecified),
            luminaire_health: Some(LuminaireHealth::Unspecified),
            ..Default::default()
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["board_health"], "");

        let back: WorkOrderDetail = serde_json::from_value(json).unwrap();
        assert!(!back.missing_classification());
    }

    #[test]
    fn test_search_text_includes_nested_fields() {
        let detail = WorkOrderDetail {
            circuit: "C-12".into(),
            technicians: vec![Technician {
                badge: "4471".into(),
                name: "Rocio".into(),
            }],
            materials: vec![Material {
                name: "Contactor".into(),
                quantity: Some(2.0),
                unit: "u".into(),
            }],
            observations: "gabinete oxidado".into(),
            ..Default::default()
        };
        let text = detail.search_text();
        assert!(text.contains("C-12"));
        assert!(text.contains("4471"));
        assert!(text.contains("Contactor"));
        assert!(text.contains("oxidado"));
    }

    #[test]
    fn test_scope_health_applicability() {
        assert!(Scope::Circuit.allows_board_health());
        assert!(!Scope::Luminaire.allows_board_health());
        assert!(Scope::Luminaire.allows_luminaire_health());
        assert!(!Scope::Other.allows_luminaire_health());
    }
}
