use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{
    BodyDraft, BodyRecord, BodyStatus, CoordinationDraft, CoordinationRecord, SanitaryCheckDraft,
    SanitaryCheckRecord, StaffMemberDraft, StaffMemberRecord,
};
use crate::morgue::Morgue;
use crate::reports;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Morgue record keeping: intake, sanitary control, staff and funeral services.
#[derive(Debug, Parser)]
#[command(name = "morgue-ledger", version, about = "Morgue record keeping")]
pub struct Cli {
    /// YAML configuration file (falls back to MORGUE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the record documents (overrides config and MORGUE_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Body intake and disposition
    Body {
        #[command(subcommand)]
        command: BodyCommand,
    },
    /// Sanitary inspections
    Check {
        #[command(subcommand)]
        command: CheckCommand,
    },
    /// Staff roster
    Staff {
        #[command(subcommand)]
        command: StaffCommand,
    },
    /// Coordination with funeral services
    Coordination {
        #[command(subcommand)]
        command: CoordinationCommand,
    },
    /// Summary reports
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Insert demo records when no bodies are on record
    Seed,
}

#[derive(Debug, Subcommand)]
pub enum BodyCommand {
    /// Register a newly arrived body
    Register {
        #[arg(long)]
        name: String,
        /// Arrival date, YYYY-MM-DD (defaults to today)
        #[arg(long, default_value = "")]
        arrival: String,
        #[arg(long, default_value = "")]
        source: String,
        #[arg(long, default_value = "")]
        storage: String,
        /// Accompanying document; repeat for several
        #[arg(long = "document")]
        documents: Vec<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Change a body's status (received, prepared, released)
    Status {
        id: u32,
        #[arg(value_parser = parse_body_status)]
        status: BodyStatus,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Record which funeral service takes the body
    AssignService { id: u32, service: String },
    /// Show one body
    Show { id: u32 },
    /// List bodies, optionally by status
    List {
        #[arg(long, value_parser = parse_body_status)]
        status: Option<BodyStatus>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CheckCommand {
    /// Record a sanitary inspection
    Record {
        #[arg(long)]
        inspector: String,
        #[arg(long = "type", default_value = "Daily")]
        check_type: String,
        #[arg(long, default_value_t = 4.0, allow_negative_numbers = true)]
        temperature: f64,
        #[arg(long, default_value_t = 10)]
        score: u8,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Attach a violation to an inspection
    Violation {
        check_id: u32,
        #[arg(long)]
        violation: String,
        #[arg(long)]
        action: String,
    },
    /// List inspections
    List,
}

#[derive(Debug, Subcommand)]
pub enum StaffCommand {
    /// Add a staff member
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: String,
        #[arg(long, default_value = "")]
        position: String,
        /// Qualification; repeat for several
        #[arg(long = "qualification")]
        qualifications: Vec<String>,
    },
    /// List staff
    List,
}

#[derive(Debug, Subcommand)]
pub enum CoordinationCommand {
    /// Register coordination with a funeral service for a body
    Register {
        #[arg(long)]
        body_id: u32,
        #[arg(long)]
        service: String,
        #[arg(long)]
        contact_person: String,
        #[arg(long)]
        phone: String,
        /// Planned date, YYYY-MM-DD (defaults to today)
        #[arg(long, default_value = "")]
        planned_date: String,
        /// Document the service must bring; repeat for several
        #[arg(long = "document")]
        documents: Vec<String>,
    },
    /// List coordinations
    List,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Bodies by status and latest intakes
    Bodies {
        #[arg(long, default_value_t = reports::DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Latest inspections and violation totals
    Sanitary {
        #[arg(long, default_value_t = reports::DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },
    /// Counts across all record kinds
    Stats,
    /// Arrivals and inspections for one day
    Daily {
        /// Day to report, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

fn parse_body_status(value: &str) -> Result<BodyStatus, String> {
    value.parse::<BodyStatus>().map_err(|error| error.to_string())
}

pub fn execute(cli: Cli) -> AppResult<ExitCode> {
    let config = AppConfig::resolve(cli.config.as_deref(), cli.data_dir.as_deref())?;
    crate::init_tracing(&config)?;
    let mut morgue = Morgue::open(&config)?;
    if config.seed_demo_data {
        morgue.seed_demo_data()?;
    }
    let mut out = Printer::new(cli.output, std::io::stdout().lock());

    match cli.command {
        Command::Body { command } => body(&mut morgue, &mut out, command),
        Command::Check { command } => check(&mut morgue, &mut out, command),
        Command::Staff { command } => staff(&mut morgue, &mut out, command),
        Command::Coordination { command } => coordination(&mut morgue, &mut out, command),
        Command::Report { command } => report(&morgue, &mut out, command),
        Command::Seed => {
            let seeded = morgue.seed_demo_data()?;
            out.seeded(seeded)
        }
    }
}

fn body<W: Write>(morgue: &mut Morgue, out: &mut Printer<W>, command: BodyCommand) -> AppResult<ExitCode> {
    match command {
        BodyCommand::Register {
            name,
            arrival,
            source,
            storage,
            documents,
            notes,
        } => {
            let body = morgue.register_body(BodyDraft {
                full_name: name,
                arrival_date: arrival,
                source,
                storage_location: storage,
                documents,
                status: BodyStatus::Received,
                notes,
            })?;
            out.created("Body registered", body.id, &body)
        }
        BodyCommand::Status { id, status, notes } => {
            let updated = morgue.update_body_status(id, status, &notes)?;
            out.updated(updated, &format!("Body {} is now {}", id, status), &format!("Body {} not found", id))
        }
        BodyCommand::AssignService { id, service } => {
            let updated = morgue.assign_funeral_service(id, &service)?;
            out.updated(updated, &format!("Body {} assigned to {}", id, service.trim()), &format!("Body {} not found", id))
        }
        BodyCommand::Show { id } => match morgue.get_body(id) {
            Some(body) => out.records(&[body], body_line),
            None => {
                eprintln!("Body {} not found", id);
                Ok(ExitCode::FAILURE)
            }
        },
        BodyCommand::List { status } => out.records(&morgue.list_bodies(status), body_line),
    }
}

fn check<W: Write>(morgue: &mut Morgue, out: &mut Printer<W>, command: CheckCommand) -> AppResult<ExitCode> {
    match command {
        CheckCommand::Record {
            inspector,
            check_type,
            temperature,
            score,
            notes,
        } => {
            let check = morgue.record_check(SanitaryCheckDraft {
                check_type,
                temperature,
                cleanliness_score: score,
                inspector,
                notes,
            })?;
            out.created("Inspection recorded", check.id, &check)
        }
        CheckCommand::Violation {
            check_id,
            violation,
            action,
        } => {
            let updated = morgue.add_violation(check_id, &violation, &action)?;
            out.updated(
                updated,
                &format!("Violation added to inspection {}", check_id),
                &format!("Inspection {} not found", check_id),
            )
        }
        CheckCommand::List => out.records(&morgue.list_checks().iter().collect::<Vec<_>>(), check_line),
    }
}

fn staff<W: Write>(morgue: &mut Morgue, out: &mut Printer<W>, command: StaffCommand) -> AppResult<ExitCode> {
    match command {
        StaffCommand::Add {
            name,
            contact,
            position,
            qualifications,
        } => {
            let member = morgue.add_employee(StaffMemberDraft {
                full_name: name,
                position,
                contact,
                qualifications,
            })?;
            out.created("Staff member added", member.id, &member)
        }
        StaffCommand::List => out.records(&morgue.list_staff().iter().collect::<Vec<_>>(), staff_line),
    }
}

fn coordination<W: Write>(morgue: &mut Morgue, out: &mut Printer<W>, command: CoordinationCommand) -> AppResult<ExitCode> {
    match command {
        CoordinationCommand::Register {
            body_id,
            service,
            contact_person,
            phone,
            planned_date,
            documents,
        } => {
            let record = morgue.register_coordination(CoordinationDraft {
                body_id,
                service_name: service,
                contact_person,
                contact_phone: phone,
                planned_date,
                documents_needed: documents,
            })?;
            out.created("Coordination registered", record.id, &record)
        }
        CoordinationCommand::List => out.records(
            &morgue.list_coordinations().iter().collect::<Vec<_>>(),
            coordination_line,
        ),
    }
}

fn report<W: Write>(morgue: &Morgue, out: &mut Printer<W>, command: ReportCommand) -> AppResult<ExitCode> {
    match command {
        ReportCommand::Bodies { limit } => out.report(&reports::bodies_report(morgue, limit)),
        ReportCommand::Sanitary { limit } => out.report(&reports::sanitary_report(morgue, limit)),
        ReportCommand::Stats => out.report(&reports::statistics(morgue)),
        ReportCommand::Daily { date } => {
            let day = date.unwrap_or_else(|| crate::models::day_stamp(morgue.now()));
            out.report(&reports::daily_report(morgue, &day))
        }
    }
}

struct Printer<W: Write> {
    format: OutputFormat,
    out: W,
}

impl<W: Write> Printer<W> {
    fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    fn line(&mut self, text: impl Display) -> AppResult<()> {
        writeln!(self.out, "{}", text).map_err(|error| AppError::Io(format!("failed to write output: {}", error)))
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> AppResult<()> {
        let rendered = serde_json::to_string_pretty(value)?;
        self.line(rendered)
    }

    fn created<T: Serialize>(&mut self, label: &str, id: u32, record: &T) -> AppResult<ExitCode> {
        match self.format {
            OutputFormat::Text => self.line(format_args!("{}, ID: {}", label, id))?,
            OutputFormat::Json => self.json(record)?,
        }
        Ok(ExitCode::SUCCESS)
    }

    fn updated(&mut self, updated: bool, done: &str, missing: &str) -> AppResult<ExitCode> {
        if !updated {
            eprintln!("{}", missing);
            return Ok(ExitCode::FAILURE);
        }
        match self.format {
            OutputFormat::Text => self.line(done)?,
            OutputFormat::Json => self.line(serde_json::json!({ "updated": true }))?,
        }
        Ok(ExitCode::SUCCESS)
    }

    fn seeded(&mut self, seeded: bool) -> AppResult<ExitCode> {
        match (self.format, seeded) {
            (OutputFormat::Text, true) => self.line("Demo records created")?,
            (OutputFormat::Text, false) => self.line("Records already present, nothing seeded")?,
            (OutputFormat::Json, _) => self.line(serde_json::json!({ "seeded": seeded }))?,
        }
        Ok(ExitCode::SUCCESS)
    }

    fn records<T: Serialize>(&mut self, records: &[&T], line: fn(&T) -> String) -> AppResult<ExitCode> {
        match self.format {
            OutputFormat::Text => {
                for record in records {
                    self.line(line(*record))?;
                }
                self.line(format_args!("Records: {}", records.len()))?;
            }
            OutputFormat::Json => self.json(records)?,
        }
        Ok(ExitCode::SUCCESS)
    }

    fn report<T: Serialize + Display>(&mut self, report: &T) -> AppResult<ExitCode> {
        match self.format {
            OutputFormat::Text => write!(self.out, "{}", report)
                .map_err(|error| AppError::Io(format!("failed to write output: {}", error)))?,
            OutputFormat::Json => self.json(report)?,
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn body_line(body: &BodyRecord) -> String {
    format!(
        "{} | {} | {} | {} | {} | {} | {} | {}",
        body.id,
        body.full_name,
        body.arrival_date,
        body.source,
        body.storage_location,
        body.status,
        body.documents.join(", "),
        body.notes
    )
}

fn check_line(check: &SanitaryCheckRecord) -> String {
    format!(
        "{} | {} | {} | {} | {}/10 | {} | violations: {}",
        check.id,
        check.date,
        check.check_type,
        check.temperature,
        check.cleanliness_score,
        check.inspector,
        check.violations.len()
    )
}

fn staff_line(member: &StaffMemberRecord) -> String {
    format!(
        "{} | {} | {} | {} | {} | {}",
        member.id,
        member.full_name,
        member.position,
        member.contact,
        member.hire_date,
        member.status.as_str()
    )
}

fn coordination_line(record: &CoordinationRecord) -> String {
    format!(
        "{} | body {} | {} | {} | {} | {} | {}",
        record.id,
        record.body_id,
        record.service_name,
        record.contact_person,
        record.planned_date,
        record.status.as_str(),
        record.documents_needed.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_subcommand() {
        let cli = Cli::try_parse_from([
            "morgue-ledger",
            "--data-dir",
            "/tmp/records",
            "body",
            "status",
            "3",
            "prepared",
            "--notes",
            "ready",
        ])
        .expect("parse");
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/records")));
        match cli.command {
            Command::Body {
                command: BodyCommand::Status { id, status, notes },
            } => {
                assert_eq!(id, 3);
                assert_eq!(status, BodyStatus::Prepared);
                assert_eq!(notes, "ready");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn closed_output_is_an_io_error() {
        let mut out = Printer::new(OutputFormat::Text, ClosedPipe);
        let error = out.seeded(true).expect_err("write must fail");
        assert!(matches!(error, AppError::Io(_)));

        let mut out = Printer::new(OutputFormat::Json, ClosedPipe);
        assert!(matches!(out.updated(true, "done", "missing"), Err(AppError::Io(_))));
    }

    #[test]
    fn seed_outcome_follows_output_format() {
        let mut out = Printer::new(OutputFormat::Json, Vec::new());
        out.seeded(false).expect("write");
        let value: serde_json::Value = serde_json::from_slice(&out.out).expect("json output");
        assert_eq!(value, serde_json::json!({ "seeded": false }));

        let mut out = Printer::new(OutputFormat::Text, Vec::new());
        out.seeded(true).expect("write");
        assert_eq!(String::from_utf8_lossy(&out.out), "Demo records created\n");
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(Cli::try_parse_from(["morgue-ledger", "body", "list", "--status", "buried"]).is_err());
    }
}
