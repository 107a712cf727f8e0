//! Benchmark utilities for generating source rows.

use serde_json::{Value, json};

use ember::transform::RawRecord;

const BOROUGHS: [&str; 5] = ["MANHATTAN", "BROOKLYN", "QUEENS", "BRONX", "RICHMOND / STATEN ISLAND"];

/// Generate `count` raw rows shaped like the dispatch dataset.
///
/// Every tenth row has a non-numeric response time so the drop path is
/// exercised too.
pub fn generate_rows(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|i| {
            let dispatch = if i % 10 == 9 {
                json!("n/a")
            } else {
                json!((i % 120).to_string())
            };
            let value = json!({
                "starfire_incident_id": format!("24{:07}", i),
                "incident_datetime": format!("2024-03-{:02}T{:02}:15:00.000", i % 28 + 1, i % 24),
                "incident_borough": BOROUGHS[i % BOROUGHS.len()],
                "highest_alarm_level": "First Alarm",
                "incident_classification": "Medical Emergency",
                "incident_classification_group": "Medical Emergencies",
                "dispatch_response_seconds_qy": dispatch,
                "incident_travel_tm_seconds_qy": (i % 600) as u64,
                "engines_assigned_quantity": "1"
            });
            match value {
                Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
        .collect()
}
