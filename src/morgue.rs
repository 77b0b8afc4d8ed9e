use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{
    day_stamp, minute_stamp, BodyDraft, BodyRecord, BodyStatus, CoordinationDraft, CoordinationRecord,
    SanitaryCheckDraft, SanitaryCheckRecord, StaffMemberDraft, StaffMemberRecord, Violation,
};
use crate::store::{JsonFileBackend, RecordStore, StorageBackend};
use chrono::NaiveDateTime;

pub type Clock = fn() -> NaiveDateTime;

pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// The facility's four record stores plus the checks that guard them.
///
/// Field validation and the coordination-to-body lookup happen here, before
/// any store is touched, so a rejected request never reaches a document.
pub struct Morgue<B: StorageBackend = JsonFileBackend> {
    bodies: RecordStore<BodyRecord, B>,
    checks: RecordStore<SanitaryCheckRecord, B>,
    staff: RecordStore<StaffMemberRecord, B>,
    coordinations: RecordStore<CoordinationRecord, B>,
    clock: Clock,
}

impl Morgue<JsonFileBackend> {
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        let morgue = Self::with_backends(
            JsonFileBackend::new(config.bodies_path()),
            JsonFileBackend::new(config.sanitary_path()),
            JsonFileBackend::new(config.staff_path()),
            JsonFileBackend::new(config.coordinations_path()),
        )?;
        tracing::info!(
            data_dir = %config.data_dir.display(),
            bodies = morgue.bodies.len(),
            checks = morgue.checks.len(),
            staff = morgue.staff.len(),
            coordinations = morgue.coordinations.len(),
            "morgue records loaded"
        );
        Ok(morgue)
    }
}

impl<B: StorageBackend> Morgue<B> {
    pub fn with_backends(bodies: B, checks: B, staff: B, coordinations: B) -> AppResult<Self> {
        Ok(Self {
            bodies: RecordStore::open(bodies)?,
            checks: RecordStore::open(checks)?,
            staff: RecordStore::open(staff)?,
            coordinations: RecordStore::open(coordinations)?,
            clock: local_now,
        })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn register_body(&mut self, mut draft: BodyDraft) -> AppResult<BodyRecord> {
        let now = self.now();
        draft.full_name = required("full_name", &draft.full_name)?;
        draft.arrival_date = draft.arrival_date.trim().to_string();
        if draft.arrival_date.is_empty() {
            draft.arrival_date = day_stamp(now);
        }
        draft.documents = clean_list(draft.documents);
        draft.notes = draft.notes.trim().to_string();
        self.bodies.append(draft, now)
    }

    /// Sets the body's status. Notes are replaced only when `notes` is
    /// non-empty. Returns `false` when no such body exists.
    pub fn update_body_status(&mut self, body_id: u32, status: BodyStatus, notes: &str) -> AppResult<bool> {
        let now = self.now();
        let notes = notes.trim();
        self.bodies.update_by_id(body_id, |body| {
            body.apply_status(status, now);
            if !notes.is_empty() {
                body.notes = notes.to_string();
            }
        })
    }

    pub fn assign_funeral_service(&mut self, body_id: u32, service: &str) -> AppResult<bool> {
        let service = required("funeral_service", service)?;
        self.bodies
            .update_by_id(body_id, |body| body.funeral_service = Some(service))
    }

    pub fn get_body(&self, body_id: u32) -> Option<&BodyRecord> {
        self.bodies.find_by_id(body_id)
    }

    pub fn list_bodies(&self, status: Option<BodyStatus>) -> Vec<&BodyRecord> {
        match status {
            Some(status) => self.bodies.filter(|body| body.status == status),
            None => self.bodies.list_all().iter().collect(),
        }
    }

    pub fn record_check(&mut self, mut draft: SanitaryCheckDraft) -> AppResult<SanitaryCheckRecord> {
        draft.inspector = required("inspector", &draft.inspector)?;
        draft.check_type = draft.check_type.trim().to_string();
        draft.notes = draft.notes.trim().to_string();
        if !(1..=10).contains(&draft.cleanliness_score) {
            return Err(AppError::Validation(format!(
                "cleanliness_score must be between 1 and 10, got {}",
                draft.cleanliness_score
            )));
        }
        if !draft.temperature.is_finite() {
            return Err(AppError::Validation("temperature must be a finite number".to_string()));
        }
        let now = self.now();
        self.checks.append(draft, now)
    }

    /// Appends a violation to a check. Returns `false` when no such check exists.
    pub fn add_violation(&mut self, check_id: u32, violation: &str, corrective_action: &str) -> AppResult<bool> {
        let entry = Violation {
            violation: required("violation", violation)?,
            corrective_action: required("corrective_action", corrective_action)?,
            date: minute_stamp(self.now()),
        };
        self.checks
            .update_by_id(check_id, |check| check.violations.push(entry))
    }

    pub fn get_check(&self, check_id: u32) -> Option<&SanitaryCheckRecord> {
        self.checks.find_by_id(check_id)
    }

    pub fn list_checks(&self) -> &[SanitaryCheckRecord] {
        self.checks.list_all()
    }

    pub fn add_employee(&mut self, mut draft: StaffMemberDraft) -> AppResult<StaffMemberRecord> {
        draft.full_name = required("full_name", &draft.full_name)?;
        draft.contact = required("contact", &draft.contact)?;
        draft.position = draft.position.trim().to_string();
        draft.qualifications = clean_list(draft.qualifications);
        let now = self.now();
        self.staff.append(draft, now)
    }

    pub fn list_staff(&self) -> &[StaffMemberRecord] {
        self.staff.list_all()
    }

    /// Creates a coordination after confirming the referenced body exists.
    /// The reference is not re-checked afterwards.
    pub fn register_coordination(&mut self, mut draft: CoordinationDraft) -> AppResult<CoordinationRecord> {
        let now = self.now();
        draft.service_name = required("service_name", &draft.service_name)?;
        draft.contact_person = required("contact_person", &draft.contact_person)?;
        draft.contact_phone = required("contact_phone", &draft.contact_phone)?;
        draft.planned_date = draft.planned_date.trim().to_string();
        if draft.planned_date.is_empty() {
            draft.planned_date = day_stamp(now);
        }
        draft.documents_needed = clean_list(draft.documents_needed);

        if self.bodies.find_by_id(draft.body_id).is_none() {
            tracing::warn!(body_id = draft.body_id, "coordination rejected, unknown body");
            return Err(AppError::ReferenceNotFound {
                entity: "body",
                id: draft.body_id,
            });
        }
        self.coordinations.append(draft, now)
    }

    pub fn list_coordinations(&self) -> &[CoordinationRecord] {
        self.coordinations.list_all()
    }

    /// First-run demo records. Does nothing unless the body store is empty.
    pub fn seed_demo_data(&mut self) -> AppResult<bool> {
        if !self.bodies.is_empty() {
            return Ok(false);
        }
        let bodies = [
            BodyDraft {
                full_name: "Ivanov Ivan Ivanovich".to_string(),
                arrival_date: "2024-01-15".to_string(),
                source: "City Hospital No. 1".to_string(),
                storage_location: "Cold chamber 3".to_string(),
                documents: vec!["Hospital referral".to_string(), "Passport".to_string()],
                status: BodyStatus::Received,
                notes: String::new(),
            },
            BodyDraft {
                full_name: "Petrov Petr Petrovich".to_string(),
                arrival_date: "2024-01-14".to_string(),
                source: "Police".to_string(),
                storage_location: "Cold chamber 2".to_string(),
                documents: vec!["Examination report".to_string(), "Passport".to_string()],
                status: BodyStatus::Prepared,
                notes: String::new(),
            },
        ];
        for draft in bodies {
            self.register_body(draft)?;
        }
        self.record_check(SanitaryCheckDraft {
            check_type: "Daily".to_string(),
            temperature: 4.5,
            cleanliness_score: 8,
            inspector: "Sidorov A.I.".to_string(),
            notes: "All within norms".to_string(),
        })?;
        self.add_employee(StaffMemberDraft {
            full_name: "Smirnov Aleksei Vladimirovich".to_string(),
            position: "Pathologist".to_string(),
            contact: "+7-999-123-45-67".to_string(),
            qualifications: vec!["Highest category".to_string(), "15 years experience".to_string()],
        })?;
        tracing::info!("demo records seeded");
        Ok(true)
    }
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
