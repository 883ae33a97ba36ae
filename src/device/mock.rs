//! Synthetic incubator data for running without a device.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::{
    models::{Alert, AlertCategory, MotorStatus, Reading, Severity, Status},
    status::round_tenth,
};

/// Spacing between synthesized history entries, matching the log tick.
const HISTORY_SPACING_MINUTES: i64 = 15;

/// Every 32nd history entry (roughly every 8 hours) is a turning event.
const TURNING_EVERY: usize = 32;

/// A plausible starting status: comfortably inside the default thresholds,
/// next turn one to two hours away.
pub fn initial_status(rng: &mut impl Rng, now: DateTime<Utc>) -> Status {
    Status {
        temperature: round_tenth(rng.gen_range(37.2..=38.3)),
        humidity: round_tenth(rng.gen_range(57.0..=63.0)),
        motor_status: MotorStatus::Idle,
        turns_today: 2,
        next_turn_in: 3600 + rng.gen_range(0..3600),
        last_updated: now,
        connected: true,
    }
}

/// `count` readings ending at `now`, most recent first.
pub fn history(rng: &mut impl Rng, count: usize, now: DateTime<Utc>) -> Vec<Reading> {
    (0..count)
        .map(|i| {
            let turning = i % TURNING_EVERY == 0;
            Reading {
                id: Uuid::new_v4().to_string(),
                timestamp: now - Duration::minutes(HISTORY_SPACING_MINUTES * i as i64),
                temperature: round_tenth(rng.gen_range(37.0..=38.5)),
                humidity: round_tenth(rng.gen_range(55.0..=65.0)),
                egg_turning: turning,
                motor_status: if turning {
                    MotorStatus::Running
                } else {
                    MotorStatus::Idle
                },
            }
        })
        .collect()
}

/// Snapshot the current status into a log reading.
pub fn reading_from_status(status: &Status, now: DateTime<Utc>) -> Reading {
    Reading {
        id: Uuid::new_v4().to_string(),
        timestamp: now,
        temperature: status.temperature,
        humidity: status.humidity,
        egg_turning: false,
        motor_status: status.motor_status,
    }
}

/// The two alerts a simulated monitor starts with: an open temperature
/// warning from 30 minutes ago and an acknowledged humidity warning from two
/// hours ago. Most recent first.
pub fn demo_alerts(now: DateTime<Utc>) -> Vec<Alert> {
    vec![
        Alert {
            id: Uuid::new_v4(),
            category: AlertCategory::Temperature,
            severity: Severity::Warning,
            message: "Temperature slightly above normal range (38.6°C)".to_owned(),
            timestamp: now - Duration::minutes(30),
            acknowledged: false,
        },
        Alert {
            id: Uuid::new_v4(),
            category: AlertCategory::Humidity,
            severity: Severity::Warning,
            message: "Humidity dropped below minimum threshold (54%)".to_owned(),
            timestamp: now - Duration::hours(2),
            acknowledged: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn initial_status_is_within_defaults() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let s = initial_status(&mut rng, Utc::now());
            assert!((37.2..=38.3).contains(&s.temperature));
            assert!((57.0..=63.0).contains(&s.humidity));
            assert!((3600..7200).contains(&s.next_turn_in));
            assert!(s.connected);
        }
    }

    #[test]
    fn history_is_spaced_and_newest_first() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();
        let readings = history(&mut rng, 100, now);

        assert_eq!(readings.len(), 100);
        assert_eq!(readings[0].timestamp, now);
        assert_eq!(readings[1].timestamp, now - Duration::minutes(15));
        assert!(readings.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[test]
    fn history_marks_turning_events() {
        let mut rng = StdRng::seed_from_u64(2);
        let readings = history(&mut rng, 100, Utc::now());
        let turning: Vec<_> = readings
            .iter()
            .enumerate()
            .filter(|(_, r)| r.egg_turning)
            .map(|(i, r)| {
                assert_eq!(r.motor_status, MotorStatus::Running);
                i
            })
            .collect();
        assert_eq!(turning, [0, 32, 64, 96]);
    }

    #[test]
    fn reading_from_status_copies_measurements() {
        let mut rng = StdRng::seed_from_u64(3);
        let now = Utc::now();
        let status = initial_status(&mut rng, now);
        let r = reading_from_status(&status, now);
        assert_eq!(r.temperature, status.temperature);
        assert_eq!(r.humidity, status.humidity);
        assert!(!r.egg_turning);
        assert_eq!(r.timestamp, now);
    }

    #[test]
    fn demo_alerts_are_newest_first_and_outside_window() {
        let now = Utc::now();
        let alerts = demo_alerts(now);
        assert_eq!(alerts.len(), 2);
        assert!(alerts[0].timestamp > alerts[1].timestamp);
        assert!(!alerts[0].acknowledged);
        assert!(alerts[1].acknowledged);
        // Old enough that neither suppresses a fresh breach.
        assert!(alerts.iter().all(|a| now - a.timestamp >= Duration::minutes(5)));
    }
}
