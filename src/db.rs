use chrono::{Local, NaiveDate};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{TrackerError, TrackerResult};
use crate::models::{
    Application, ApplicationFilter, ApplicationStatus, ApplicationUpdate, GroupCount, Interview,
    NewApplication, NewInterview, Statistics, DEFAULT_LIST_LIMIT,
};

const APPLICATION_COLUMNS: &str = "id, company, position, location, job_url, job_description,
    application_date, status, priority, salary_range, notes, recruiter_name, recruiter_email,
    follow_up_date, interview_date, interview_type, interview_notes, rejection_reason,
    offer_amount, created_at, updated_at";

const INTERVIEW_COLUMNS: &str = "id, application_id, interview_date, interview_type,
    interviewer_name, interviewer_title, questions_asked, my_answers, feedback_received,
    next_steps, preparation_notes, created_at, updated_at";

const TOP_COMPANIES: i64 = 10;
const RECENT_MONTHS: i64 = 12;

/// Handle on the tracker's SQLite file.
///
/// Holds only the path: every operation opens its own connection, runs in a
/// single transaction and closes the connection before returning.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn open(path: impl Into<PathBuf>) -> TrackerResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobtrack") {
            proj_dirs.data_dir().join("job_tracker.db")
        } else {
            PathBuf::from("data/job_tracker.db")
        }
    }

    fn connect(&self) -> TrackerResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Creates both tables and their indexes. Safe to call on every startup.
    pub fn init(&self) -> TrackerResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            BEGIN;

            CREATE TABLE IF NOT EXISTS job_applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company TEXT NOT NULL,
                position TEXT NOT NULL,
                location TEXT,
                job_url TEXT,
                job_description TEXT,
                application_date TEXT,
                status TEXT NOT NULL DEFAULT 'applied',
                priority TEXT NOT NULL DEFAULT 'medium',
                salary_range TEXT,
                notes TEXT,
                recruiter_name TEXT,
                recruiter_email TEXT,
                follow_up_date TEXT,
                interview_date TEXT,
                interview_type TEXT,
                interview_notes TEXT,
                rejection_reason TEXT,
                offer_amount TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS interviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                application_id INTEGER NOT NULL
                    REFERENCES job_applications(id) ON DELETE CASCADE,
                interview_date TEXT,
                interview_type TEXT,
                interviewer_name TEXT,
                interviewer_title TEXT,
                questions_asked TEXT,
                my_answers TEXT,
                feedback_received TEXT,
                next_steps TEXT,
                preparation_notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_company ON job_applications(company);
            CREATE INDEX IF NOT EXISTS idx_status ON job_applications(status);
            CREATE INDEX IF NOT EXISTS idx_application_date ON job_applications(application_date);
            CREATE INDEX IF NOT EXISTS idx_application_id ON interviews(application_id);

            COMMIT;
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> TrackerResult<()> {
        let conn = self.connect()?;
        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master
             WHERE type = 'table' AND name IN ('job_applications', 'interviews')",
            [],
            |row| row.get(0),
        )?;
        if tables < 2 {
            return Err(TrackerError::Config(format!(
                "database at {} is not initialized. Run 'jobtrack init' first.",
                self.path.display()
            )));
        }
        Ok(())
    }

    // --- Application operations ---

    pub fn add_application(&self, app: &NewApplication) -> TrackerResult<i64> {
        let conn = self.connect()?;
        let now = timestamp();
        conn.execute(
            "INSERT INTO job_applications (
                company, position, location, job_url, job_description,
                application_date, status, priority, salary_range, notes,
                recruiter_name, recruiter_email, follow_up_date,
                interview_date, interview_type, interview_notes,
                rejection_reason, offer_amount, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19)",
            params![
                app.company,
                app.position,
                app.location,
                app.job_url,
                app.job_description,
                app.application_date,
                app.status,
                app.priority,
                app.salary_range,
                app.notes,
                app.recruiter_name,
                app.recruiter_email,
                app.follow_up_date,
                app.interview_date,
                app.interview_type,
                app.interview_notes,
                app.rejection_reason,
                app.offer_amount,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_application(&self, id: i64) -> TrackerResult<Option<Application>> {
        let conn = self.connect()?;
        let app = conn
            .query_row(
                &format!("SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = ?1"),
                [id],
                Self::row_to_application,
            )
            .optional()?;
        Ok(app)
    }

    pub fn list_applications(&self, filter: &ApplicationFilter) -> TrackerResult<Vec<Application>> {
        let mut sql = format!("SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE 1=1");
        let mut params: Vec<Value> = vec![];

        if let Some(status) = filter.status {
            params.push(Value::Text(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", params.len()));
        }

        if let Some(company) = &filter.company {
            params.push(Value::Text(company.clone()));
            sql.push_str(&format!(
                " AND instr(LOWER(company), LOWER(?{})) > 0",
                params.len()
            ));
        }

        let limit = filter.limit.unwrap_or(DEFAULT_LIST_LIMIT);
        params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        sql.push_str(&format!(
            " ORDER BY application_date DESC, id DESC LIMIT ?{}",
            params.len()
        ));

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), Self::row_to_application)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Applies `update` and stamps `updated_at`. Returns whether a row matched `id`.
    pub fn update_application(&self, id: i64, update: &ApplicationUpdate) -> TrackerResult<bool> {
        let mut assignments: Vec<String> = vec![];
        let mut params: Vec<Value> = vec![];

        for (field, value) in update.changes() {
            params.push(value.clone());
            assignments.push(format!("{} = ?{}", field.column(), params.len()));
        }

        params.push(Value::Text(timestamp()));
        assignments.push(format!("updated_at = ?{}", params.len()));
        params.push(Value::Integer(id));

        let sql = format!(
            "UPDATE job_applications SET {} WHERE id = ?{}",
            assignments.join(", "),
            params.len()
        );

        let conn = self.connect()?;
        let changed = conn.execute(&sql, params_from_iter(params))?;
        Ok(changed > 0)
    }

    /// Deletes the application and its interviews. Returns whether the application existed.
    pub fn delete_application(&self, id: i64) -> TrackerResult<bool> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM interviews WHERE application_id = ?1", [id])?;
        let removed = tx.execute("DELETE FROM job_applications WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// Applications waiting on a reply whose follow-up date is on or before `cutoff`.
    pub fn follow_ups_due(&self, cutoff: NaiveDate) -> TrackerResult<Vec<Application>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications
             WHERE follow_up_date IS NOT NULL
               AND follow_up_date <= ?1
               AND status IN (?2, ?3)
             ORDER BY follow_up_date ASC, id ASC"
        ))?;
        let [first, second] = ApplicationStatus::AWAITING_REPLY;
        let rows = stmt.query_map(params![cutoff, first, second], Self::row_to_application)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn row_to_application(row: &Row) -> rusqlite::Result<Application> {
        Ok(Application {
            id: row.get(0)?,
            company: row.get(1)?,
            position: row.get(2)?,
            location: row.get(3)?,
            job_url: row.get(4)?,
            job_description: row.get(5)?,
            application_date: row.get(6)?,
            status: row.get(7)?,
            priority: row.get(8)?,
            salary_range: row.get(9)?,
            notes: row.get(10)?,
            recruiter_name: row.get(11)?,
            recruiter_email: row.get(12)?,
            follow_up_date: row.get(13)?,
            interview_date: row.get(14)?,
            interview_type: row.get(15)?,
            interview_notes: row.get(16)?,
            rejection_reason: row.get(17)?,
            offer_amount: row.get(18)?,
            created_at: row.get(19)?,
            updated_at: row.get(20)?,
        })
    }

    // --- Interview operations ---

    pub fn add_interview(&self, interview: &NewInterview) -> TrackerResult<i64> {
        let conn = self.connect()?;
        let now = timestamp();
        conn.execute(
            "INSERT INTO interviews (
                application_id, interview_date, interview_type,
                interviewer_name, interviewer_title, questions_asked,
                my_answers, feedback_received, next_steps,
                preparation_notes, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                interview.application_id,
                interview.interview_date,
                interview.interview_type,
                interview.interviewer_name,
                interview.interviewer_title,
                interview.questions_asked,
                interview.answers,
                interview.feedback_received,
                interview.next_steps,
                interview.preparation_notes,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_interview(&self, id: i64) -> TrackerResult<Option<Interview>> {
        let conn = self.connect()?;
        let interview = conn
            .query_row(
                &format!("SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = ?1"),
                [id],
                Self::row_to_interview,
            )
            .optional()?;
        Ok(interview)
    }

    pub fn list_interviews(&self, application_id: Option<i64>) -> TrackerResult<Vec<Interview>> {
        let conn = self.connect()?;
        let interviews = match application_id {
            Some(app_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {INTERVIEW_COLUMNS} FROM interviews
                     WHERE application_id = ?1
                     ORDER BY interview_date DESC, id DESC"
                ))?;
                stmt.query_map([app_id], Self::row_to_interview)?
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {INTERVIEW_COLUMNS} FROM interviews
                     ORDER BY interview_date DESC, id DESC"
                ))?;
                stmt.query_map([], Self::row_to_interview)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(interviews)
    }

    fn row_to_interview(row: &Row) -> rusqlite::Result<Interview> {
        Ok(Interview {
            id: row.get(0)?,
            application_id: row.get(1)?,
            interview_date: row.get(2)?,
            interview_type: row.get(3)?,
            interviewer_name: row.get(4)?,
            interviewer_title: row.get(5)?,
            questions_asked: row.get(6)?,
            answers: row.get(7)?,
            feedback_received: row.get(8)?,
            next_steps: row.get(9)?,
            preparation_notes: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    // --- Aggregates ---

    pub fn statistics(&self) -> TrackerResult<Statistics> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let total_applications: i64 =
            tx.query_row("SELECT COUNT(*) FROM job_applications", [], |row| row.get(0))?;

        let status_counts: BTreeMap<String, i64> = {
            let mut stmt =
                tx.prepare("SELECT status, COUNT(*) FROM job_applications GROUP BY status")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            rows.collect::<Result<_, _>>()?
        };

        let company_counts = {
            let mut stmt = tx.prepare(
                "SELECT company, COUNT(*) AS n FROM job_applications
                 GROUP BY company ORDER BY n DESC, company ASC LIMIT ?1",
            )?;
            let rows = stmt.query_map([TOP_COMPANIES], Self::row_to_group_count)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let monthly_counts = {
            let mut stmt = tx.prepare(
                "SELECT strftime('%Y-%m', application_date) AS month, COUNT(*)
                 FROM job_applications
                 WHERE strftime('%Y-%m', application_date) IS NOT NULL
                 GROUP BY month ORDER BY month DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map([RECENT_MONTHS], Self::row_to_group_count)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let total_interviews: i64 =
            tx.query_row("SELECT COUNT(*) FROM interviews", [], |row| row.get(0))?;

        tx.commit()?;

        let responded: i64 = ApplicationStatus::RESPONDED
            .iter()
            .filter_map(|status| status_counts.get(status.as_str()))
            .sum();

        Ok(Statistics {
            total_applications,
            status_counts,
            company_counts,
            monthly_counts,
            total_interviews,
            response_rate: response_rate(responded, total_applications),
        })
    }

    fn row_to_group_count(row: &Row) -> rusqlite::Result<GroupCount> {
        Ok(GroupCount {
            key: row.get(0)?,
            count: row.get(1)?,
        })
    }
}

/// `responded / total` as a percentage rounded to two decimals; zero for an empty tracker.
pub fn response_rate(responded: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = responded as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InterviewType, Priority};
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("data").join("job_tracker.db")).unwrap();
        db.init().unwrap();
        (dir, db)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn application(company: &str, position: &str) -> NewApplication {
        NewApplication::new(company, position)
    }

    #[test]
    fn test_init_is_idempotent() {
        let (_dir, db) = test_db();
        db.init().unwrap();
        db.ensure_initialized().unwrap();

        let conn = db.connect().unwrap();
        let indexes: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index'
                 AND name IN ('idx_company', 'idx_status', 'idx_application_date', 'idx_application_id')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexes, 4);
    }

    #[test]
    fn test_ensure_initialized_fails_on_fresh_file() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("fresh.db")).unwrap();
        let err = db.ensure_initialized().unwrap_err();
        assert!(err.to_string().contains("jobtrack init"));
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let (_dir, db) = test_db();
        let ids: Vec<i64> = (0..5)
            .map(|i| db.add_application(&application("Acme", &format!("Role {}", i))).unwrap())
            .collect();
        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn test_add_and_get_application_round_trip() {
        let (_dir, db) = test_db();
        let mut app = application("Google", "Senior Data Engineer");
        app.location = Some("Mountain View, CA".to_string());
        app.application_date = Some(date("2024-01-15"));
        app.priority = Priority::High;
        app.salary_range = Some("$180K-$220K".to_string());
        app.follow_up_date = Some(date("2024-01-22"));
        app.interview_type = Some(InterviewType::Video);

        let id = db.add_application(&app).unwrap();
        let stored = db.get_application(id).unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.company, "Google");
        assert_eq!(stored.location.as_deref(), Some("Mountain View, CA"));
        assert_eq!(stored.application_date, Some(date("2024-01-15")));
        assert_eq!(stored.status, ApplicationStatus::Applied);
        assert_eq!(stored.priority, Priority::High);
        assert_eq!(stored.interview_type, Some(InterviewType::Video));
        assert_eq!(stored.recruiter_name, None);
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[test]
    fn test_get_missing_application_is_none() {
        let (_dir, db) = test_db();
        assert!(db.get_application(42).unwrap().is_none());
        assert!(db.get_interview(42).unwrap().is_none());
    }

    #[test]
    fn test_filter_by_status_is_exact() {
        let (_dir, db) = test_db();
        let mut applied = application("Meta", "ML Engineer");
        applied.status = ApplicationStatus::Applied;
        let mut review = application("Meta", "Data Scientist");
        review.status = ApplicationStatus::UnderReview;
        db.add_application(&applied).unwrap();
        db.add_application(&review).unwrap();

        let found = db
            .list_applications(&ApplicationFilter::with_status(ApplicationStatus::UnderReview))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.iter().all(|a| a.status == ApplicationStatus::UnderReview));
    }

    #[test]
    fn test_filter_by_company_is_case_insensitive_substring() {
        let (_dir, db) = test_db();
        db.add_application(&application("Google", "SWE")).unwrap();
        db.add_application(&application("Google DeepMind", "Research Engineer"))
            .unwrap();
        db.add_application(&application("Meta", "SWE")).unwrap();

        let found = db
            .list_applications(&ApplicationFilter::with_company("gOOg"))
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|a| a.company.to_lowercase().contains("goog")));
    }

    #[test]
    fn test_list_orders_by_date_desc_and_honors_limit() {
        let (_dir, db) = test_db();
        for day in ["2024-01-10", "2024-03-01", "2024-02-15"] {
            let mut app = application("Acme", day);
            app.application_date = Some(date(day));
            db.add_application(&app).unwrap();
        }

        let all = db.list_applications(&ApplicationFilter::default()).unwrap();
        let dates: Vec<_> = all.iter().map(|a| a.position.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-15", "2024-01-10"]);

        let limited = db
            .list_applications(&ApplicationFilter {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_update_changes_fields_and_timestamp() {
        let (_dir, db) = test_db();
        let id = db.add_application(&application("Google", "SWE")).unwrap();
        let before = db.get_application(id).unwrap().unwrap();

        let update = ApplicationUpdate::new()
            .status(ApplicationStatus::Rejected)
            .rejection_reason(Some("Position filled".to_string()));
        assert!(db.update_application(id, &update).unwrap());

        let after = db.get_application(id).unwrap().unwrap();
        assert_eq!(after.status, ApplicationStatus::Rejected);
        assert_eq!(after.rejection_reason.as_deref(), Some("Position filled"));
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at >= before.updated_at);
    }

    #[test]
    fn test_update_allows_any_transition() {
        let (_dir, db) = test_db();
        let mut app = application("Google", "SWE");
        app.status = ApplicationStatus::Rejected;
        let id = db.add_application(&app).unwrap();

        let update = ApplicationUpdate::new().status(ApplicationStatus::Applied);
        assert!(db.update_application(id, &update).unwrap());
        assert_eq!(
            db.get_application(id).unwrap().unwrap().status,
            ApplicationStatus::Applied
        );
    }

    #[test]
    fn test_update_missing_application_reports_false() {
        let (_dir, db) = test_db();
        let update = ApplicationUpdate::new().notes("hello");
        assert!(!db.update_application(99, &update).unwrap());
        assert!(!db.update_application(99, &ApplicationUpdate::new()).unwrap());
    }

    #[test]
    fn test_delete_cascades_to_interviews() {
        let (_dir, db) = test_db();
        let id = db.add_application(&application("Google", "SWE")).unwrap();
        let keep = db.add_application(&application("Meta", "SWE")).unwrap();
        let interview_id = db
            .add_interview(&NewInterview {
                application_id: id,
                interview_type: Some(InterviewType::Phone),
                ..Default::default()
            })
            .unwrap();
        db.add_interview(&NewInterview {
            application_id: keep,
            ..Default::default()
        })
        .unwrap();

        assert!(db.delete_application(id).unwrap());
        assert!(db.get_application(id).unwrap().is_none());
        assert!(db.get_interview(interview_id).unwrap().is_none());
        assert!(db.list_interviews(Some(id)).unwrap().is_empty());
        assert_eq!(db.list_interviews(None).unwrap().len(), 1);

        assert!(!db.delete_application(id).unwrap());
    }

    #[test]
    fn test_interview_for_missing_application_is_storage_error() {
        let (_dir, db) = test_db();
        let err = db
            .add_interview(&NewInterview {
                application_id: 7,
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, TrackerError::Storage(_)));
    }

    #[test]
    fn test_list_interviews_filters_and_orders() {
        let (_dir, db) = test_db();
        let id = db.add_application(&application("Google", "SWE")).unwrap();
        for day in ["2024-01-25", "2024-02-05"] {
            db.add_interview(&NewInterview {
                application_id: id,
                interview_date: Some(date(day)),
                interviewer_name: Some("John Smith".to_string()),
                ..Default::default()
            })
            .unwrap();
        }

        let interviews = db.list_interviews(Some(id)).unwrap();
        assert_eq!(interviews.len(), 2);
        assert_eq!(interviews[0].interview_date, Some(date("2024-02-05")));
        assert_eq!(interviews[1].interviewer_name.as_deref(), Some("John Smith"));
    }

    #[test]
    fn test_statistics_on_empty_store() {
        let (_dir, db) = test_db();
        let stats = db.statistics().unwrap();
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.response_rate, 0.0);
    }

    #[test]
    fn test_statistics_company_counts() {
        let (_dir, db) = test_db();
        db.add_application(&application("Meta", "ML Engineer")).unwrap();
        db.add_application(&application("Meta", "Data Scientist")).unwrap();
        db.add_application(&application("Google", "SWE")).unwrap();

        let stats = db.statistics().unwrap();
        assert_eq!(
            stats.company_counts,
            vec![
                GroupCount { key: "Meta".to_string(), count: 2 },
                GroupCount { key: "Google".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_statistics_status_month_and_response_rate() {
        let (_dir, db) = test_db();
        let rows = [
            ("2024-01-15", ApplicationStatus::Applied),
            ("2024-01-20", ApplicationStatus::Rejected),
            ("2024-02-03", ApplicationStatus::InterviewScheduled),
        ];
        for (day, status) in rows {
            let mut app = application("Acme", "Engineer");
            app.application_date = Some(date(day));
            app.status = status;
            db.add_application(&app).unwrap();
        }
        db.add_application(&application("Undated", "Engineer")).unwrap();
        let id = db.add_application(&application("Acme", "Lead")).unwrap();
        db.add_interview(&NewInterview {
            application_id: id,
            ..Default::default()
        })
        .unwrap();

        let stats = db.statistics().unwrap();
        assert_eq!(stats.total_applications, 5);
        assert_eq!(stats.status_counts.get("applied"), Some(&3));
        assert_eq!(stats.status_counts.get("rejected"), Some(&1));
        assert_eq!(
            stats.monthly_counts,
            vec![
                GroupCount { key: "2024-02".to_string(), count: 1 },
                GroupCount { key: "2024-01".to_string(), count: 2 },
            ]
        );
        assert_eq!(stats.total_interviews, 1);
        assert_eq!(stats.response_rate, 40.0);
    }

    #[test]
    fn test_response_rate_rounding() {
        assert_eq!(response_rate(0, 0), 0.0);
        assert_eq!(response_rate(1, 3), 33.33);
        assert_eq!(response_rate(2, 3), 66.67);
        assert_eq!(response_rate(3, 3), 100.0);
    }

    #[test]
    fn test_follow_ups_due_window_status_and_order() {
        let (_dir, db) = test_db();
        let cases = [
            ("late", "2024-01-20", ApplicationStatus::UnderReview),
            ("soon", "2024-01-05", ApplicationStatus::Applied),
            ("edge", "2024-01-08", ApplicationStatus::Applied),
            ("outside", "2024-01-09", ApplicationStatus::Applied),
            ("closed", "2024-01-02", ApplicationStatus::Rejected),
        ];
        for (position, day, status) in cases {
            let mut app = application("Acme", position);
            app.follow_up_date = Some(date(day));
            app.status = status;
            db.add_application(&app).unwrap();
        }
        db.add_application(&application("Acme", "no date")).unwrap();

        let due = db.follow_ups_due(date("2024-01-08")).unwrap();
        let positions: Vec<_> = due.iter().map(|a| a.position.as_str()).collect();
        assert_eq!(positions, vec!["soon", "edge"]);

        let due = db.follow_ups_due(date("2024-01-31")).unwrap();
        let positions: Vec<_> = due.iter().map(|a| a.position.as_str()).collect();
        assert_eq!(positions, vec!["soon", "edge", "outside", "late"]);
    }
}
