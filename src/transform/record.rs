//! Record types flowing through the pipeline.

use serde::{Deserialize, Serialize};

/// One row as returned by the source API. No shape is guaranteed.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Source field names, in document order.
pub mod fields {
    pub const STARFIRE_INCIDENT_ID: &str = "starfire_incident_id";
    pub const INCIDENT_DATETIME: &str = "incident_datetime";
    pub const INCIDENT_BOROUGH: &str = "incident_borough";
    pub const HIGHEST_ALARM_LEVEL: &str = "highest_alarm_level";
    pub const INCIDENT_CLASSIFICATION: &str = "incident_classification";
    pub const INCIDENT_CLASSIFICATION_GROUP: &str = "incident_classification_group";
    pub const DISPATCH_RESPONSE_SECONDS_QY: &str = "dispatch_response_seconds_qy";
    pub const INCIDENT_TRAVEL_TM_SECONDS_QY: &str = "incident_travel_tm_seconds_qy";
    pub const ENGINES_ASSIGNED_QUANTITY: &str = "engines_assigned_quantity";

    /// All fields a canonical record requires.
    pub const REQUIRED: [&str; 9] = [
        STARFIRE_INCIDENT_ID,
        INCIDENT_DATETIME,
        INCIDENT_BOROUGH,
        HIGHEST_ALARM_LEVEL,
        INCIDENT_CLASSIFICATION,
        INCIDENT_CLASSIFICATION_GROUP,
        DISPATCH_RESPONSE_SECONDS_QY,
        INCIDENT_TRAVEL_TM_SECONDS_QY,
        ENGINES_ASSIGNED_QUANTITY,
    ];
}

/// A validated fire incident dispatch event, ready for indexing.
///
/// Serialized field names match the source dataset, so the document shape in
/// the index mirrors the upstream columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Unique identifier, used as the document id.
    pub starfire_incident_id: String,
    /// Kept verbatim from the source once validated as a timestamp.
    pub incident_datetime: String,
    pub incident_borough: String,
    pub highest_alarm_level: String,
    pub incident_classification: String,
    pub incident_classification_group: String,
    pub dispatch_response_seconds_qy: f64,
    pub incident_travel_tm_seconds_qy: f64,
    pub engines_assigned_quantity: f64,
}

impl CanonicalRecord {
    /// The id the document is addressed by in the index.
    pub fn document_id(&self) -> &str {
        &self.starfire_incident_id
    }
}
