use crate::errors::AppError;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minute-resolution stamp used for intake, inspection and status transitions.
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Day-resolution stamp used for hire and coordination dates.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn minute_stamp(now: NaiveDateTime) -> String {
    now.format(MINUTE_FORMAT).to_string()
}

pub fn day_stamp(now: NaiveDateTime) -> String {
    now.format(DAY_FORMAT).to_string()
}

/// A record kind held by a [`crate::store::RecordStore`].
///
/// Each kind owns a creation draft (the record without identifier and
/// creation stamps) and knows how to turn it into a full record.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned {
    type Draft;

    /// Short name used in logs and error messages.
    const KIND: &'static str;

    fn id(&self) -> u32;

    fn from_draft(id: u32, draft: Self::Draft, now: NaiveDateTime) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyStatus {
    #[default]
    Received,
    Prepared,
    Released,
}

impl BodyStatus {
    pub const ALL: [BodyStatus; 3] = [Self::Received, Self::Prepared, Self::Released];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Prepared => "prepared",
            Self::Released => "released",
        }
    }
}

impl fmt::Display for BodyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown body status '{}', expected one of received, prepared, released",
                    value
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    #[default]
    Active,
}

impl StaffStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
        }
    }
}

/// Coordination state as stored in the document. New coordinations start
/// `InProgress`; `Completed` and `Cancelled` are only read back from documents
/// edited by other tooling, no operation here assigns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinationStatus {
    #[default]
    InProgress,
    Completed,
    Cancelled,
}

impl CoordinationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyRecord {
    pub id: u32,
    pub full_name: String,
    pub arrival_date: String,
    pub source: String,
    pub storage_location: String,
    #[serde(default)]
    pub documents: Vec<String>,
    pub status: BodyStatus,
    #[serde(default)]
    pub preparation_date: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub funeral_service: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub registration_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDraft {
    pub full_name: String,
    pub arrival_date: String,
    pub source: String,
    pub storage_location: String,
    pub documents: Vec<String>,
    pub status: BodyStatus,
    pub notes: String,
}

impl Record for BodyRecord {
    type Draft = BodyDraft;

    const KIND: &'static str = "body";

    fn id(&self) -> u32 {
        self.id
    }

    fn from_draft(id: u32, draft: BodyDraft, now: NaiveDateTime) -> Self {
        Self {
            id,
            full_name: draft.full_name,
            arrival_date: draft.arrival_date,
            source: draft.source,
            storage_location: draft.storage_location,
            documents: draft.documents,
            status: draft.status,
            preparation_date: None,
            release_date: None,
            funeral_service: None,
            notes: draft.notes,
            registration_date: minute_stamp(now),
        }
    }
}

impl BodyRecord {
    /// Moves the body to `status`, stamping the preparation or release time
    /// the first time that status is reached. Later repeats keep the stamp.
    pub fn apply_status(&mut self, status: BodyStatus, now: NaiveDateTime) {
        self.status = status;
        match status {
            BodyStatus::Prepared if self.preparation_date.is_none() => {
                self.preparation_date = Some(minute_stamp(now));
            }
            BodyStatus::Released if self.release_date.is_none() => {
                self.release_date = Some(minute_stamp(now));
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub violation: String,
    pub corrective_action: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitaryCheckRecord {
    pub id: u32,
    pub date: String,
    pub check_type: String,
    pub temperature: f64,
    pub cleanliness_score: u8,
    pub inspector: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitaryCheckDraft {
    pub check_type: String,
    pub temperature: f64,
    pub cleanliness_score: u8,
    pub inspector: String,
    #[serde(default)]
    pub notes: String,
}

impl Record for SanitaryCheckRecord {
    type Draft = SanitaryCheckDraft;

    const KIND: &'static str = "sanitary_check";

    fn id(&self) -> u32 {
        self.id
    }

    fn from_draft(id: u32, draft: SanitaryCheckDraft, now: NaiveDateTime) -> Self {
        Self {
            id,
            date: minute_stamp(now),
            check_type: draft.check_type,
            temperature: draft.temperature,
            cleanliness_score: draft.cleanliness_score,
            inspector: draft.inspector,
            notes: draft.notes,
            violations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMemberRecord {
    pub id: u32,
    pub full_name: String,
    pub position: String,
    pub contact: String,
    #[serde(default)]
    pub qualifications: Vec<String>,
    pub hire_date: String,
    pub status: StaffStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffMemberDraft {
    pub full_name: String,
    pub position: String,
    pub contact: String,
    pub qualifications: Vec<String>,
}

impl Record for StaffMemberRecord {
    type Draft = StaffMemberDraft;

    const KIND: &'static str = "staff_member";

    fn id(&self) -> u32 {
        self.id
    }

    fn from_draft(id: u32, draft: StaffMemberDraft, now: NaiveDateTime) -> Self {
        Self {
            id,
            full_name: draft.full_name,
            position: draft.position,
            contact: draft.contact,
            qualifications: draft.qualifications,
            hire_date: day_stamp(now),
            status: StaffStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationRecord {
    pub id: u32,
    pub body_id: u32,
    pub service_name: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub planned_date: String,
    #[serde(default)]
    pub documents_needed: Vec<String>,
    #[serde(default)]
    pub documents_provided: Vec<String>,
    pub coordination_date: String,
    pub status: CoordinationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationDraft {
    pub body_id: u32,
    pub service_name: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub planned_date: String,
    pub documents_needed: Vec<String>,
}

impl Record for CoordinationRecord {
    type Draft = CoordinationDraft;

    const KIND: &'static str = "coordination";

    fn id(&self) -> u32 {
        self.id
    }

    fn from_draft(id: u32, draft: CoordinationDraft, now: NaiveDateTime) -> Self {
        Self {
            id,
            body_id: draft.body_id,
            service_name: draft.service_name,
            contact_person: draft.contact_person,
            contact_phone: draft.contact_phone,
            planned_date: draft.planned_date,
            documents_needed: draft.documents_needed,
            documents_provided: Vec::new(),
            coordination_date: day_stamp(now),
            status: CoordinationStatus::InProgress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|day| day.and_hms_opt(hour, minute, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn body_status_uses_fixed_vocabulary() {
        let encoded = serde_json::to_string(&BodyStatus::Prepared).expect("encode status");
        assert_eq!(encoded, "\"prepared\"");
        assert_eq!("released".parse::<BodyStatus>().expect("parse"), BodyStatus::Released);
        assert!("выдано".parse::<BodyStatus>().is_err());
    }

    #[test]
    fn preparation_stamp_is_set_once() {
        let mut body = BodyRecord::from_draft(1, BodyDraft::default(), at(9, 0));
        assert_eq!(body.registration_date, "2024-01-15 09:00");

        body.apply_status(BodyStatus::Prepared, at(10, 30));
        body.apply_status(BodyStatus::Prepared, at(11, 45));
        assert_eq!(body.preparation_date.as_deref(), Some("2024-01-15 10:30"));
        assert!(body.release_date.is_none());

        body.apply_status(BodyStatus::Released, at(12, 0));
        assert_eq!(body.release_date.as_deref(), Some("2024-01-15 12:00"));
    }

    #[test]
    fn coordination_starts_in_progress_with_nothing_provided() {
        let draft = CoordinationDraft {
            body_id: 3,
            service_name: "Svc".to_string(),
            ..CoordinationDraft::default()
        };
        let record = CoordinationRecord::from_draft(1, draft, at(8, 0));
        assert_eq!(record.status, CoordinationStatus::InProgress);
        assert_eq!(record.coordination_date, "2024-01-15");
        assert!(record.documents_provided.is_empty());
        let value = serde_json::to_value(&record).expect("encode");
        assert_eq!(value["status"], "in_progress");
    }

    #[test]
    fn closed_coordinations_from_other_tooling_load() {
        let record = CoordinationRecord::from_draft(1, CoordinationDraft::default(), at(8, 0));
        for (raw, status) in [
            ("completed", CoordinationStatus::Completed),
            ("cancelled", CoordinationStatus::Cancelled),
        ] {
            let mut value = serde_json::to_value(&record).expect("encode");
            value["status"] = serde_json::Value::from(raw);
            let loaded: CoordinationRecord = serde_json::from_value(value).expect("decode");
            assert_eq!(loaded.status, status);
            assert_eq!(loaded.status.as_str(), raw);
        }
        let mut value = serde_json::to_value(&record).expect("encode");
        value["status"] = serde_json::Value::from("archived");
        assert!(serde_json::from_value::<CoordinationRecord>(value).is_err());
    }
}
