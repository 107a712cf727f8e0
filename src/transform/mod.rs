//! Raw record to canonical record mapping.
//!
//! Extracts the six identifier/category fields as text, coerces the three
//! numeric fields to `f64`, and checks that `incident_datetime` is a
//! timestamp. Any failure rejects the whole record; partial records are
//! never produced.

mod record;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use snafu::prelude::*;

use crate::error::{
    FieldError, InvalidTimestampSnafu, MissingFieldSnafu, NonFiniteSnafu, NotNumericSnafu,
    TransformError, UnsupportedValueSnafu,
};

pub use record::{CanonicalRecord, RawRecord, fields};

/// Socrata floating timestamp layouts (no offset).
const FLOATING_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Map one raw record into the canonical schema.
///
/// The raw record is moved into the error on failure so the caller can log
/// the exact payload that was dropped.
pub fn transform(raw: RawRecord) -> Result<CanonicalRecord, TransformError> {
    match extract(&raw) {
        Ok(record) => Ok(record),
        Err(source) => Err(TransformError {
            source,
            record: raw,
        }),
    }
}

fn extract(raw: &RawRecord) -> Result<CanonicalRecord, FieldError> {
    let incident_datetime = text(raw, fields::INCIDENT_DATETIME)?;
    ensure_timestamp(fields::INCIDENT_DATETIME, &incident_datetime)?;

    Ok(CanonicalRecord {
        starfire_incident_id: text(raw, fields::STARFIRE_INCIDENT_ID)?,
        incident_datetime,
        incident_borough: text(raw, fields::INCIDENT_BOROUGH)?,
        highest_alarm_level: text(raw, fields::HIGHEST_ALARM_LEVEL)?,
        incident_classification: text(raw, fields::INCIDENT_CLASSIFICATION)?,
        incident_classification_group: text(raw, fields::INCIDENT_CLASSIFICATION_GROUP)?,
        dispatch_response_seconds_qy: number(raw, fields::DISPATCH_RESPONSE_SECONDS_QY)?,
        incident_travel_tm_seconds_qy: number(raw, fields::INCIDENT_TRAVEL_TM_SECONDS_QY)?,
        engines_assigned_quantity: number(raw, fields::ENGINES_ASSIGNED_QUANTITY)?,
    })
}

fn lookup<'a>(raw: &'a RawRecord, field: &'static str) -> Result<&'a Value, FieldError> {
    raw.get(field).context(MissingFieldSnafu { field })
}

/// Strings pass through; scalar numbers and booleans keep their JSON text.
fn text(raw: &RawRecord, field: &'static str) -> Result<String, FieldError> {
    match lookup(raw, field)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => UnsupportedValueSnafu {
            field,
            value: other.clone(),
        }
        .fail(),
    }
}

fn number(raw: &RawRecord, field: &'static str) -> Result<f64, FieldError> {
    let value = match lookup(raw, field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(
            s.trim()
                .parse::<f64>()
                .context(NotNumericSnafu { field, value: s })?,
        ),
        _ => None,
    };

    let Some(value) = value else {
        let other = raw.get(field).cloned().unwrap_or(Value::Null);
        return UnsupportedValueSnafu {
            field,
            value: other,
        }
        .fail();
    };

    ensure!(value.is_finite(), NonFiniteSnafu { field, value });
    Ok(value)
}

fn ensure_timestamp(field: &'static str, value: &str) -> Result<(), FieldError> {
    let parses = DateTime::parse_from_rfc3339(value).is_ok()
        || FLOATING_TIMESTAMP_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();

    ensure!(parses, InvalidTimestampSnafu { field, value });
    Ok(())
}
