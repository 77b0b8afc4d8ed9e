//! Read-only summaries over the record stores.
//!
//! Every report is recomputed from the current records on each call.

use crate::models::{day_stamp, minute_stamp, BodyRecord, BodyStatus};
use crate::morgue::Morgue;
use crate::store::StorageBackend;
use serde::Serialize;
use std::fmt;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

const RULE: &str = "==================================================";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: BodyStatus,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodiesReport {
    pub generated_at: String,
    pub total: usize,
    pub by_status: Vec<StatusCount>,
    pub recent: Vec<BodyRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub id: u32,
    pub date: String,
    pub check_type: String,
    pub temperature: f64,
    pub cleanliness_score: u8,
    pub inspector: String,
    pub violation_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitaryReport {
    pub generated_at: String,
    pub total_checks: usize,
    pub recent: Vec<CheckSummary>,
    pub total_violations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub bodies: usize,
    pub checks: usize,
    pub staff: usize,
    pub coordinations: usize,
    pub by_status: Vec<StatusCount>,
    pub active_since: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBody {
    pub id: u32,
    pub full_name: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCheck {
    pub id: u32,
    pub time: String,
    pub check_type: String,
    pub violation_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub day: String,
    pub bodies: Vec<DailyBody>,
    pub checks: Vec<DailyCheck>,
}

pub fn bodies_report<B: StorageBackend>(morgue: &Morgue<B>, limit: usize) -> BodiesReport {
    let bodies = morgue.list_bodies(None);
    let mut recent: Vec<BodyRecord> = bodies.iter().map(|body| (*body).clone()).collect();
    recent.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));
    recent.truncate(limit);

    BodiesReport {
        generated_at: minute_stamp(morgue.now()),
        total: bodies.len(),
        by_status: status_breakdown(&bodies),
        recent,
    }
}

pub fn sanitary_report<B: StorageBackend>(morgue: &Morgue<B>, limit: usize) -> SanitaryReport {
    let checks = morgue.list_checks();
    let mut recent: Vec<CheckSummary> = checks
        .iter()
        .map(|check| CheckSummary {
            id: check.id,
            date: check.date.clone(),
            check_type: check.check_type.clone(),
            temperature: check.temperature,
            cleanliness_score: check.cleanliness_score,
            inspector: check.inspector.clone(),
            violation_count: check.violations.len(),
        })
        .collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(limit);

    SanitaryReport {
        generated_at: minute_stamp(morgue.now()),
        total_checks: checks.len(),
        recent,
        total_violations: checks.iter().map(|check| check.violations.len()).sum(),
    }
}

pub fn statistics<B: StorageBackend>(morgue: &Morgue<B>) -> Statistics {
    let bodies = morgue.list_bodies(None);
    let earliest = bodies
        .iter()
        .map(|body| body.registration_date.as_str())
        .chain(morgue.list_checks().iter().map(|check| check.date.as_str()))
        .filter(|stamp| !stamp.is_empty())
        .min();
    let active_since: String = match earliest {
        Some(stamp) => stamp.chars().take(10).collect(),
        None => day_stamp(morgue.now()),
    };

    Statistics {
        bodies: bodies.len(),
        checks: morgue.list_checks().len(),
        staff: morgue.list_staff().len(),
        coordinations: morgue.list_coordinations().len(),
        by_status: status_breakdown(&bodies),
        active_since,
    }
}

/// Arrivals and inspections whose stamp starts with `day` (`YYYY-MM-DD`).
pub fn daily_report<B: StorageBackend>(morgue: &Morgue<B>, day: &str) -> DailyReport {
    let bodies = morgue
        .list_bodies(None)
        .into_iter()
        .filter(|body| body.arrival_date.starts_with(day))
        .map(|body| DailyBody {
            id: body.id,
            full_name: body.full_name.clone(),
            source: body.source.clone(),
        })
        .collect();
    let checks = morgue
        .list_checks()
        .iter()
        .filter(|check| check.date.starts_with(day))
        .map(|check| DailyCheck {
            id: check.id,
            time: check.date.get(11..).unwrap_or_default().to_string(),
            check_type: check.check_type.clone(),
            violation_count: check.violations.len(),
        })
        .collect();

    DailyReport {
        day: day.to_string(),
        bodies,
        checks,
    }
}

fn status_breakdown(bodies: &[&BodyRecord]) -> Vec<StatusCount> {
    let total = bodies.len();
    BodyStatus::ALL
        .into_iter()
        .map(|status| {
            let count = bodies.iter().filter(|body| body.status == status).count();
            let percentage = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            StatusCount {
                status,
                count,
                percentage,
            }
        })
        .collect()
}

impl fmt::Display for BodiesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BODIES REPORT")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f)?;
        writeln!(f, "Bodies on record: {}", self.total)?;
        writeln!(f, "Generated: {}", self.generated_at)?;
        writeln!(f)?;
        writeln!(f, "BY STATUS:")?;
        for entry in &self.by_status {
            writeln!(f, "  - {}: {}", entry.status, entry.count)?;
        }
        writeln!(f)?;
        writeln!(f, "LATEST {} INTAKES:", self.recent.len())?;
        for body in &self.recent {
            writeln!(f)?;
            writeln!(f, "ID: {}", body.id)?;
            writeln!(f, "  Name: {}", body.full_name)?;
            writeln!(f, "  Arrived: {}", body.arrival_date)?;
            writeln!(f, "  Status: {}", body.status)?;
            writeln!(f, "  Storage: {}", body.storage_location)?;
        }
        Ok(())
    }
}

impl fmt::Display for SanitaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SANITARY INSPECTIONS REPORT")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f)?;
        writeln!(f, "Inspections on record: {}", self.total_checks)?;
        writeln!(f, "Generated: {}", self.generated_at)?;
        writeln!(f)?;
        writeln!(f, "LATEST {} INSPECTIONS:", self.recent.len())?;
        for check in &self.recent {
            writeln!(f)?;
            writeln!(f, "ID: {}", check.id)?;
            writeln!(f, "  Date: {}", check.date)?;
            writeln!(f, "  Type: {}", check.check_type)?;
            writeln!(f, "  Temperature: {}°C", check.temperature)?;
            writeln!(f, "  Cleanliness: {}/10", check.cleanliness_score)?;
            writeln!(f, "  Inspector: {}", check.inspector)?;
            writeln!(f, "  Violations: {}", check.violation_count)?;
        }
        writeln!(f)?;
        writeln!(f, "TOTAL VIOLATIONS: {}", self.total_violations)
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OVERALL STATISTICS")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f)?;
        writeln!(f, "  - Bodies registered: {}", self.bodies)?;
        writeln!(f, "  - Sanitary inspections: {}", self.checks)?;
        writeln!(f, "  - Staff members: {}", self.staff)?;
        writeln!(f, "  - Funeral-service coordinations: {}", self.coordinations)?;
        writeln!(f)?;
        writeln!(f, "BODY STATUSES:")?;
        for entry in &self.by_status {
            writeln!(f, "  - {}: {} ({:.1}%)", entry.status, entry.count, entry.percentage)?;
        }
        writeln!(f)?;
        writeln!(f, "ACTIVE SINCE: {}", self.active_since)
    }
}

impl fmt::Display for DailyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DAILY REPORT FOR {}", self.day)?;
        writeln!(f, "{}", RULE)?;
        writeln!(f)?;
        writeln!(f, "  - Bodies received: {}", self.bodies.len())?;
        writeln!(f, "  - Inspections held: {}", self.checks.len())?;
        writeln!(f)?;
        if self.bodies.is_empty() {
            writeln!(f, "BODIES RECEIVED: none")?;
        } else {
            writeln!(f, "BODIES RECEIVED:")?;
            for body in &self.bodies {
                writeln!(f, "  - ID: {}, Name: {}, Source: {}", body.id, body.full_name, body.source)?;
            }
        }
        if !self.checks.is_empty() {
            writeln!(f)?;
            writeln!(f, "INSPECTIONS:")?;
            for check in &self.checks {
                writeln!(
                    f,
                    "  - {}, Type: {}, Violations: {}",
                    check.time, check.check_type, check.violation_count
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyDraft, SanitaryCheckDraft};
    use crate::store::MemoryBackend;
    use chrono::{NaiveDate, NaiveDateTime};

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|day| day.and_hms_opt(16, 45, 0))
            .expect("valid timestamp")
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("valid timestamp")
    }

    fn jan_10_morning() -> NaiveDateTime {
        at(10, 7)
    }

    fn jan_12_morning() -> NaiveDateTime {
        at(12, 8)
    }

    fn jan_13_noon() -> NaiveDateTime {
        at(13, 12)
    }

    fn jan_14_evening() -> NaiveDateTime {
        at(14, 19)
    }

    fn check_by(morgue: &mut Morgue<MemoryBackend>, inspector: &str) -> u32 {
        morgue
            .record_check(SanitaryCheckDraft {
                check_type: "Daily".to_string(),
                temperature: 4.0,
                cleanliness_score: 8,
                inspector: inspector.to_string(),
                notes: String::new(),
            })
            .expect("record check")
            .id
    }

    fn morgue() -> Morgue<MemoryBackend> {
        Morgue::with_backends(
            MemoryBackend::new(),
            MemoryBackend::new(),
            MemoryBackend::new(),
            MemoryBackend::new(),
        )
        .expect("open morgue")
        .with_clock(fixed_now)
    }

    fn intake(morgue: &mut Morgue<MemoryBackend>, name: &str, arrival: &str, status: BodyStatus) {
        morgue
            .register_body(BodyDraft {
                full_name: name.to_string(),
                arrival_date: arrival.to_string(),
                source: "Hospital".to_string(),
                storage_location: "Freezer 1".to_string(),
                status,
                ..BodyDraft::default()
            })
            .expect("register body");
    }

    #[test]
    fn empty_stores_report_zero_percentages() {
        let morgue = morgue();
        let stats = statistics(&morgue);
        assert_eq!(stats.bodies, 0);
        assert!(stats.by_status.iter().all(|entry| entry.percentage == 0.0));
        assert_eq!(stats.active_since, "2024-01-15");
        assert!(stats.to_string().contains("received: 0 (0.0%)"));
    }

    #[test]
    fn status_breakdown_and_recent_limit() {
        let mut morgue = morgue();
        intake(&mut morgue, "A", "2024-01-15", BodyStatus::Received);
        intake(&mut morgue, "B", "2024-01-14", BodyStatus::Prepared);
        intake(&mut morgue, "C", "2024-01-15", BodyStatus::Received);

        let report = bodies_report(&morgue, 2);
        assert_eq!(report.total, 3);
        assert_eq!(report.by_status[0].count, 2);
        assert_eq!(report.by_status[1].count, 1);
        assert_eq!(report.recent.len(), 2);

        let stats = statistics(&morgue);
        assert!((stats.by_status[0].percentage - 66.666).abs() < 0.01);
        assert!(stats.to_string().contains("received: 2 (66.7%)"));
    }

    #[test]
    fn recent_bodies_are_newest_registrations_first() {
        let mut morgue = morgue().with_clock(jan_12_morning);
        intake(&mut morgue, "Oldest", "2024-01-12", BodyStatus::Received);
        morgue = morgue.with_clock(jan_14_evening);
        intake(&mut morgue, "Newest", "2024-01-10", BodyStatus::Received);
        morgue = morgue.with_clock(jan_13_noon);
        intake(&mut morgue, "Middle", "2024-01-13", BodyStatus::Prepared);

        let report = bodies_report(&morgue, 2);
        let names: Vec<&str> = report.recent.iter().map(|body| body.full_name.as_str()).collect();
        assert_eq!(names, vec!["Newest", "Middle"]);
        assert_eq!(report.total, 3);

        let everything = bodies_report(&morgue, 10);
        let ids: Vec<u32> = everything.recent.iter().map(|body| body.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn recent_checks_are_newest_first_and_cut_at_limit() {
        let mut morgue = morgue().with_clock(jan_13_noon);
        check_by(&mut morgue, "Second");
        morgue = morgue.with_clock(jan_12_morning);
        let first = check_by(&mut morgue, "First");
        morgue = morgue.with_clock(jan_14_evening);
        check_by(&mut morgue, "Third");
        morgue.add_violation(first, "Spill", "Cleaned").expect("violation");

        let report = sanitary_report(&morgue, 2);
        let inspectors: Vec<&str> = report.recent.iter().map(|check| check.inspector.as_str()).collect();
        assert_eq!(inspectors, vec!["Third", "Second"]);
        assert_eq!(report.total_checks, 3);
        assert_eq!(report.total_violations, 1);
    }

    #[test]
    fn active_since_is_the_earliest_record_date() {
        let mut morgue = morgue().with_clock(jan_13_noon);
        intake(&mut morgue, "A", "2024-01-13", BodyStatus::Received);
        morgue = morgue.with_clock(jan_12_morning);
        intake(&mut morgue, "B", "2024-01-12", BodyStatus::Received);
        assert_eq!(statistics(&morgue).active_since, "2024-01-12");

        morgue = morgue.with_clock(jan_10_morning);
        check_by(&mut morgue, "Ivy");
        let stats = statistics(&morgue);
        assert_eq!(stats.active_since, "2024-01-10");
        assert!(stats.to_string().contains("2024-01-10"));
    }

    #[test]
    fn daily_report_matches_day_prefix() {
        let mut morgue = morgue();
        intake(&mut morgue, "Today", "2024-01-15", BodyStatus::Received);
        intake(&mut morgue, "Yesterday", "2024-01-14", BodyStatus::Received);
        let check = morgue
            .record_check(SanitaryCheckDraft {
                check_type: "Daily".to_string(),
                temperature: 3.5,
                cleanliness_score: 9,
                inspector: "Ivy".to_string(),
                notes: String::new(),
            })
            .expect("record check");
        morgue.add_violation(check.id, "Spill", "Cleaned").expect("violation");

        let report = daily_report(&morgue, "2024-01-15");
        assert_eq!(report.bodies.len(), 1);
        assert_eq!(report.bodies[0].full_name, "Today");
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].time, "16:45");
        assert_eq!(report.checks[0].violation_count, 1);

        let sanitary = sanitary_report(&morgue, DEFAULT_RECENT_LIMIT);
        assert_eq!(sanitary.total_violations, 1);

        let quiet = daily_report(&morgue, "2023-12-31");
        assert!(quiet.to_string().contains("BODIES RECEIVED: none"));
    }
}
