use chrono::{Duration, Local, NaiveDate};
use tracing::{error, info, warn};

use crate::db::Database;
use crate::error::TrackerResult;
use crate::models::{
    Application, ApplicationFilter, ApplicationStatus, ApplicationUpdate, Interview, InterviewType,
    NewApplication, NewInterview, Priority, Statistics,
};

pub const DEFAULT_FOLLOW_UP_DAYS: i64 = 7;

const LATEST_STORED_DATE: NaiveDate = match NaiveDate::from_ymd_opt(9999, 12, 31) {
    Some(date) => date,
    None => NaiveDate::MAX,
};

/// Typed entry point for applications and interviews.
///
/// Inserts propagate storage errors since callers need the new id. Every other
/// operation logs failures and falls back to an empty result, `false`, or
/// zeroed statistics.
#[derive(Debug, Clone)]
pub struct JobTracker {
    db: Database,
}

impl JobTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the tracker database and creates its schema if needed.
    pub fn open(db: Database) -> TrackerResult<Self> {
        db.init()?;
        info!(path = %db.path().display(), "job tracker database ready");
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn add_application(&self, application: &NewApplication) -> TrackerResult<i64> {
        match self.db.add_application(application) {
            Ok(id) => {
                info!(
                    id,
                    company = %application.company,
                    position = %application.position,
                    "added application"
                );
                Ok(id)
            }
            Err(e) => {
                error!("Error adding application: {e}");
                Err(e)
            }
        }
    }

    pub fn get_application(&self, id: i64) -> Option<Application> {
        self.db.get_application(id).unwrap_or_else(|e| {
            error!("Error getting application {id}: {e}");
            None
        })
    }

    pub fn applications(&self, filter: &ApplicationFilter) -> Vec<Application> {
        self.db.list_applications(filter).unwrap_or_else(|e| {
            error!("Error listing applications: {e}");
            Vec::new()
        })
    }

    pub fn update_application(&self, id: i64, update: &ApplicationUpdate) -> bool {
        match self.db.update_application(id, update) {
            Ok(true) => {
                info!(id, fields = update.changes().len(), "updated application");
                true
            }
            Ok(false) => {
                warn!(id, "no application to update");
                false
            }
            Err(e) => {
                error!("Error updating application {id}: {e}");
                false
            }
        }
    }

    pub fn delete_application(&self, id: i64) -> bool {
        match self.db.delete_application(id) {
            Ok(true) => {
                info!(id, "deleted application and its interviews");
                true
            }
            Ok(false) => false,
            Err(e) => {
                error!("Error deleting application {id}: {e}");
                false
            }
        }
    }

    // --- Status helpers ---

    pub fn set_status(&self, id: i64, status: ApplicationStatus) -> bool {
        self.update_application(id, &ApplicationUpdate::new().status(status))
    }

    pub fn set_priority(&self, id: i64, priority: Priority) -> bool {
        self.update_application(id, &ApplicationUpdate::new().priority(priority))
    }

    pub fn schedule_follow_up(&self, id: i64, date: NaiveDate) -> bool {
        self.update_application(id, &ApplicationUpdate::new().follow_up_date(Some(date)))
    }

    pub fn schedule_interview(&self, id: i64, date: NaiveDate, kind: Option<InterviewType>) -> bool {
        let update = ApplicationUpdate::new()
            .status(ApplicationStatus::InterviewScheduled)
            .interview_date(Some(date))
            .interview_type(kind);
        self.update_application(id, &update)
    }

    pub fn mark_rejected(&self, id: i64, reason: Option<String>) -> bool {
        let update = ApplicationUpdate::new()
            .status(ApplicationStatus::Rejected)
            .rejection_reason(reason);
        self.update_application(id, &update)
    }

    pub fn record_offer(&self, id: i64, amount: Option<String>) -> bool {
        let update = ApplicationUpdate::new()
            .status(ApplicationStatus::OfferReceived)
            .offer_amount(amount);
        self.update_application(id, &update)
    }

    // --- Interviews ---

    pub fn add_interview(&self, interview: &NewInterview) -> TrackerResult<i64> {
        match self.db.add_interview(interview) {
            Ok(id) => {
                info!(id, application_id = interview.application_id, "added interview");
                Ok(id)
            }
            Err(e) => {
                error!("Error adding interview: {e}");
                Err(e)
            }
        }
    }

    pub fn get_interview(&self, id: i64) -> Option<Interview> {
        self.db.get_interview(id).unwrap_or_else(|e| {
            error!("Error getting interview {id}: {e}");
            None
        })
    }

    pub fn interviews(&self, application_id: Option<i64>) -> Vec<Interview> {
        self.db.list_interviews(application_id).unwrap_or_else(|e| {
            error!("Error getting interviews: {e}");
            Vec::new()
        })
    }

    // --- Reporting queries ---

    pub fn statistics(&self) -> Statistics {
        self.db.statistics().unwrap_or_else(|e| {
            error!("Error getting statistics: {e}");
            Statistics::default()
        })
    }

    /// Follow-ups due within `days_ahead` days of today.
    pub fn follow_up_reminders(&self, days_ahead: i64) -> Vec<Application> {
        self.follow_up_reminders_from(Local::now().date_naive(), days_ahead)
    }

    /// Windows reaching past year 9999 are clamped there; later dates do not
    /// compare correctly as stored `YYYY-MM-DD` text.
    pub fn follow_up_reminders_from(&self, today: NaiveDate, days_ahead: i64) -> Vec<Application> {
        let cutoff = Duration::try_days(days_ahead)
            .and_then(|window| today.checked_add_signed(window))
            .or_else(|| (days_ahead > 0).then_some(LATEST_STORED_DATE));
        let Some(cutoff) = cutoff else {
            warn!(days_ahead, "follow-up window out of range");
            return Vec::new();
        };
        let cutoff = cutoff.min(LATEST_STORED_DATE);
        self.db.follow_ups_due(cutoff).unwrap_or_else(|e| {
            error!("Error getting follow-up reminders: {e}");
            Vec::new()
        })
    }
}
