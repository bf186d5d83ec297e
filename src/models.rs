use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{TrackerError, TrackerResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stores an enum as its lowercase text form and reads it back through `FromStr`.
macro_rules! text_column {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: TrackerError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Discovered,
    ReadyToApply,
    #[default]
    Applied,
    UnderReview,
    InterviewScheduled,
    Rejected,
    OfferReceived,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Discovered,
        ApplicationStatus::ReadyToApply,
        ApplicationStatus::Applied,
        ApplicationStatus::UnderReview,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Rejected,
        ApplicationStatus::OfferReceived,
    ];

    /// Statuses that count as an answer from the employer.
    pub const RESPONDED: [ApplicationStatus; 3] = [
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Rejected,
        ApplicationStatus::OfferReceived,
    ];

    /// Statuses still waiting on the employer, eligible for follow-up reminders.
    pub const AWAITING_REPLY: [ApplicationStatus; 2] =
        [ApplicationStatus::Applied, ApplicationStatus::UnderReview];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Discovered => "discovered",
            ApplicationStatus::ReadyToApply => "ready_to_apply",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::OfferReceived => "offer_received",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> TrackerResult<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                TrackerError::validation(format!(
                    "unknown status '{}' (expected one of: {})",
                    s,
                    ApplicationStatus::ALL.map(|st| st.as_str()).join(", ")
                ))
            })
    }
}

text_column!(ApplicationStatus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = TrackerError;

    fn from_str(s: &str) -> TrackerResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(TrackerError::validation(format!(
                "unknown priority '{}' (expected high, medium or low)",
                s
            ))),
        }
    }
}

text_column!(Priority);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Phone,
    Video,
    Onsite,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Phone => "phone",
            InterviewType::Video => "video",
            InterviewType::Onsite => "onsite",
        }
    }
}

impl FromStr for InterviewType {
    type Err = TrackerError;

    fn from_str(s: &str) -> TrackerResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "phone" => Ok(InterviewType::Phone),
            "video" => Ok(InterviewType::Video),
            "onsite" | "on-site" => Ok(InterviewType::Onsite),
            _ => Err(TrackerError::validation(format!(
                "unknown interview type '{}' (expected phone, video or onsite)",
                s
            ))),
        }
    }
}

text_column!(InterviewType);

pub fn parse_date(s: &str) -> TrackerResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| TrackerError::validation(format!("invalid date '{}' (expected YYYY-MM-DD)", s)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub job_description: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub salary_range: Option<String>,
    pub notes: Option<String>,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub interview_date: Option<NaiveDate>,
    pub interview_type: Option<InterviewType>,
    pub interview_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub offer_amount: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// An application that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub job_description: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub salary_range: Option<String>,
    pub notes: Option<String>,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub interview_date: Option<NaiveDate>,
    pub interview_type: Option<InterviewType>,
    pub interview_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub offer_amount: Option<String>,
}

impl NewApplication {
    pub fn new(company: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            position: position.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: i64,
    pub application_id: i64,
    pub interview_date: Option<NaiveDate>,
    pub interview_type: Option<InterviewType>,
    pub interviewer_name: Option<String>,
    pub interviewer_title: Option<String>,
    pub questions_asked: Option<String>,
    pub answers: Option<String>,
    pub feedback_received: Option<String>,
    pub next_steps: Option<String>,
    pub preparation_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewInterview {
    pub application_id: i64,
    pub interview_date: Option<NaiveDate>,
    pub interview_type: Option<InterviewType>,
    pub interviewer_name: Option<String>,
    pub interviewer_title: Option<String>,
    pub questions_asked: Option<String>,
    pub answers: Option<String>,
    pub feedback_received: Option<String>,
    pub next_steps: Option<String>,
    pub preparation_notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationField {
    Company,
    Position,
    Location,
    JobUrl,
    JobDescription,
    ApplicationDate,
    Status,
    Priority,
    SalaryRange,
    Notes,
    RecruiterName,
    RecruiterEmail,
    FollowUpDate,
    InterviewDate,
    InterviewType,
    InterviewNotes,
    RejectionReason,
    OfferAmount,
}

impl ApplicationField {
    pub const ALL: [ApplicationField; 18] = [
        ApplicationField::Company,
        ApplicationField::Position,
        ApplicationField::Location,
        ApplicationField::JobUrl,
        ApplicationField::JobDescription,
        ApplicationField::ApplicationDate,
        ApplicationField::Status,
        ApplicationField::Priority,
        ApplicationField::SalaryRange,
        ApplicationField::Notes,
        ApplicationField::RecruiterName,
        ApplicationField::RecruiterEmail,
        ApplicationField::FollowUpDate,
        ApplicationField::InterviewDate,
        ApplicationField::InterviewType,
        ApplicationField::InterviewNotes,
        ApplicationField::RejectionReason,
        ApplicationField::OfferAmount,
    ];

    /// Column name in `job_applications`.
    pub fn column(&self) -> &'static str {
        match self {
            ApplicationField::Company => "company",
            ApplicationField::Position => "position",
            ApplicationField::Location => "location",
            ApplicationField::JobUrl => "job_url",
            ApplicationField::JobDescription => "job_description",
            ApplicationField::ApplicationDate => "application_date",
            ApplicationField::Status => "status",
            ApplicationField::Priority => "priority",
            ApplicationField::SalaryRange => "salary_range",
            ApplicationField::Notes => "notes",
            ApplicationField::RecruiterName => "recruiter_name",
            ApplicationField::RecruiterEmail => "recruiter_email",
            ApplicationField::FollowUpDate => "follow_up_date",
            ApplicationField::InterviewDate => "interview_date",
            ApplicationField::InterviewType => "interview_type",
            ApplicationField::InterviewNotes => "interview_notes",
            ApplicationField::RejectionReason => "rejection_reason",
            ApplicationField::OfferAmount => "offer_amount",
        }
    }
}

impl FromStr for ApplicationField {
    type Err = TrackerError;

    fn from_str(s: &str) -> TrackerResult<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ApplicationField::ALL
            .into_iter()
            .find(|field| field.column() == normalized)
            .ok_or_else(|| TrackerError::validation(format!("unknown application field '{}'", s)))
    }
}

/// A set of field changes for one application. Setting the same field twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationUpdate {
    changes: Vec<(ApplicationField, Value)>,
}

impl ApplicationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> &[(ApplicationField, Value)] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    fn put(mut self, field: ApplicationField, value: Value) -> Self {
        self.changes.retain(|(f, _)| *f != field);
        self.changes.push((field, value));
        self
    }

    /// Sets a field from its column name and raw text, as typed on the command line.
    /// An empty value clears optional fields.
    pub fn set(self, name: &str, raw: &str) -> TrackerResult<Self> {
        let field: ApplicationField = name.parse()?;
        let raw = raw.trim();
        let value = match field {
            ApplicationField::Company | ApplicationField::Position => {
                if raw.is_empty() {
                    return Err(TrackerError::validation(format!(
                        "{} cannot be empty",
                        field.column()
                    )));
                }
                Value::Text(raw.to_string())
            }
            ApplicationField::Status => Value::Text(raw.parse::<ApplicationStatus>()?.as_str().to_string()),
            ApplicationField::Priority => Value::Text(raw.parse::<Priority>()?.as_str().to_string()),
            ApplicationField::InterviewType if raw.is_empty() => Value::Null,
            ApplicationField::InterviewType => {
                Value::Text(raw.parse::<InterviewType>()?.as_str().to_string())
            }
            ApplicationField::ApplicationDate
            | ApplicationField::FollowUpDate
            | ApplicationField::InterviewDate => {
                if raw.is_empty() {
                    Value::Null
                } else {
                    date_value(Some(parse_date(raw)?))
                }
            }
            _ => text_value(Some(raw.to_string()).filter(|s| !s.is_empty())),
        };
        Ok(self.put(field, value))
    }

    pub fn status(self, status: ApplicationStatus) -> Self {
        self.put(ApplicationField::Status, Value::Text(status.as_str().to_string()))
    }

    pub fn priority(self, priority: Priority) -> Self {
        self.put(ApplicationField::Priority, Value::Text(priority.as_str().to_string()))
    }

    pub fn follow_up_date(self, date: Option<NaiveDate>) -> Self {
        self.put(ApplicationField::FollowUpDate, date_value(date))
    }

    pub fn interview_date(self, date: Option<NaiveDate>) -> Self {
        self.put(ApplicationField::InterviewDate, date_value(date))
    }

    pub fn interview_type(self, kind: Option<InterviewType>) -> Self {
        let value = kind.map_or(Value::Null, |k| Value::Text(k.as_str().to_string()));
        self.put(ApplicationField::InterviewType, value)
    }

    pub fn notes(self, notes: impl Into<String>) -> Self {
        self.put(ApplicationField::Notes, Value::Text(notes.into()))
    }

    pub fn rejection_reason(self, reason: Option<String>) -> Self {
        self.put(ApplicationField::RejectionReason, text_value(reason))
    }

    pub fn offer_amount(self, amount: Option<String>) -> Self {
        self.put(ApplicationField::OfferAmount, text_value(amount))
    }
}

fn text_value(s: Option<String>) -> Value {
    s.map_or(Value::Null, Value::Text)
}

fn date_value(date: Option<NaiveDate>) -> Value {
    date.map_or(Value::Null, |d| Value::Text(d.format(DATE_FORMAT).to_string()))
}

pub const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    /// Case-insensitive substring of the company name.
    pub company: Option<String>,
    pub limit: Option<usize>,
}

impl ApplicationFilter {
    pub fn with_status(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_company(company: impl Into<String>) -> Self {
        Self {
            company: Some(company.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_applications: i64,
    pub status_counts: BTreeMap<String, i64>,
    /// Most-applied companies first.
    pub company_counts: Vec<GroupCount>,
    /// Most recent `YYYY-MM` first.
    pub monthly_counts: Vec<GroupCount>,
    pub total_interviews: i64,
    /// Percentage of applications that got a response, rounded to two decimals.
    pub response_rate: f64,
}
