//! CSV rendering of the reading history.

use anyhow::{Context, Result};

use crate::models::Reading;

pub const CSV_HEADER: [&str; 5] = [
    "Timestamp",
    "Temperature (°C)",
    "Humidity (%)",
    "Egg Turning Event",
    "Motor Status",
];

/// Render `readings` as CSV, one row per reading in the order given.
pub fn readings_to_csv<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for r in readings {
        writer
            .write_record([
                r.timestamp.to_rfc3339(),
                format!("{:.1}", r.temperature),
                format!("{:.1}", r.humidity),
                if r.egg_turning { "Yes" } else { "No" }.to_owned(),
                r.motor_status.to_string(),
            ])
            .with_context(|| format!("failed to write reading {}", r.id))?;
    }

    let bytes = writer.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::MotorStatus;

    fn reading(temperature: f64, egg_turning: bool) -> Reading {
        Reading {
            id: "r1".to_owned(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 8, 15, 0).unwrap(),
            temperature,
            humidity: 60.04,
            egg_turning,
            motor_status: if egg_turning {
                MotorStatus::Running
            } else {
                MotorStatus::Idle
            },
        }
    }

    #[test]
    fn empty_history_is_header_only() {
        let csv = readings_to_csv([]).unwrap();
        assert_eq!(
            csv,
            "Timestamp,Temperature (°C),Humidity (%),Egg Turning Event,Motor Status\n"
        );
    }

    #[test]
    fn rows_use_one_decimal_and_yes_no() {
        let rows = [reading(37.76, true), reading(38.0, false)];
        let csv = readings_to_csv(&rows).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "2025-03-01T08:15:00+00:00,37.8,60.0,Yes,running");
        assert_eq!(lines[2], "2025-03-01T08:15:00+00:00,38.0,60.0,No,idle");
    }
}
