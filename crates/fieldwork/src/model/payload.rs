//! The work-order submission payload and its boundary normalization.
//!
//! Older app versions wrote the board as a `boards` list (first element
//! authoritative) and circuits as a `circuits` list or string. [`normalize`]
//! folds every historical shape into the single canonical scalar fields, so
//! nothing downstream branches on shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::detail::{BoardHealth, LuminaireHealth, Material, Outcome, Scope, Technician};
use super::lenient::{self, scalar_text};

/// Separator used when a legacy circuit list is collapsed into one string.
pub const CIRCUIT_SEPARATOR: &str = ", ";

/// Errors raised while normalizing a raw payload.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Payload does not match the work-order shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Canonical work-order payload, as sent to the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub board: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub zone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub circuit: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub vehicle: String,

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
    pub luminaire_equipment: String,

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
    pub observations: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub technician_signatory: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub supervisor_signatory: String,

    /// Signature image as a data URL. Heavy evidence.
    #[serde(default, deserialize_with = "lenient::text")]
    pub signature_image: String,
    /// Photos as base64 data URLs. Heavy evidence.
    #[serde(default, deserialize_with = "lenient::text_list")]
    pub photos: Vec<String>,

    #[serde(default, deserialize_with = "lenient::text_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub print_mode: bool,
    /// Set when evidence was stripped before queueing.
    #[serde(default, deserialize_with = "lenient::flag")]
    pub evidence_pending: bool,
}

impl WorkOrderPayload {
    /// The grouping key that identifies the site. Empty means unroutable.
    pub fn grouping_key(&self) -> &str {
        self.board.trim()
    }

    /// Whether any heavy evidence is still attached.
    pub fn has_evidence(&self) -> bool {
        !self.signature_image.is_empty() || !self.photos.is_empty()
    }

    /// Name of the first listed technician, the record's primary technician.
    pub fn primary_technician(&self) -> &str {
        self.technicians
            .first()
            .map(|t| t.name.as_str())
            .unwrap_or("")
    }
}

/// Resolves every historical payload shape into the canonical payload.
///
/// - `board` wins when it is a non-empty scalar, else the first element of
///   `boards`, else empty.
/// - `circuit` wins when it is a non-empty scalar, else `circuits` joined
///   with [`CIRCUIT_SEPARATOR`] (or taken as-is when it is a string).
/// - `km_total` is derived from start and end when absent.
pub fn normalize(raw: Value) -> Result<WorkOrderPayload, PayloadError> {
    let mut fields = match raw {
        Value::Object(map) => map,
        other => return Err(PayloadError::NotAnObject(json_kind(&other))),
    };

    let board = take_board(&mut fields);
    let circuit = take_circuit(&mut fields);
    fields.insert("board".to_string(), Value::String(board));
    fields.insert("circuit".to_string(), Value::String(circuit));

    let mut payload: WorkOrderPayload = serde_json::from_value(Value::Object(fields))?;

    if payload.km_total.is_none() {
        if let (Some(start), Some(end)) = (payload.km_start, payload.km_end) {
            payload.km_total = Some(end - start);
        }
    }

    Ok(payload)
}

fn take_board(fields: &mut Map<String, Value>) -> String {
    let scalar = fields
        .remove("board")
        .as_ref()
        .and_then(scalar_text)
        .filter(|b| !b.is_empty());
    let listed = fields.remove("boards");

    scalar
        .or_else(|| match listed {
            Some(Value::Array(items)) => items.first().and_then(scalar_text),
            Some(other) => scalar_text(&other),
            None => None,
        })
        .unwrap_or_default()
}

fn take_circuit(fields: &mut Map<String, Value>) -> String {
    let scalar = fields
        .remove("circuit")
        .as_ref()
        .and_then(scalar_text)
        .filter(|c| !c.is_empty());
    let listed = fields.remove("circuits");

    scalar
        .or_else(|| match listed {
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(scalar_text)
                    .collect::<Vec<_>>()
                    .join(CIRCUIT_SEPARATOR),
            ),
            Some(other) => scalar_text(&other),
            None => None,
        })
        .unwrap_or_default()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
