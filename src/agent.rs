use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::ai::{fill_template, TextGenerator, DRAFT_MARKER};
use crate::context::AppContext;
use crate::listings::{JobListing, JobSource};
use crate::models::{
    Application, ApplicationFilter, ApplicationStatus, ApplicationUpdate, NewApplication, Priority,
};

/// Days between an application and its first follow-up, and between follow-ups.
const FOLLOW_UP_INTERVAL_DAYS: i64 = 7;
const MESSAGE_MAX_TOKENS: u32 = 1024;

const FOLLOW_UP_TEMPLATE: &str = "Hi {name},\n\n\
    I wanted to follow up on my application for the {position} role at {company}. \
    I'm still very interested and happy to share anything else that would help.\n\n\
    Thank you for your time.";

const OUTREACH_TEMPLATE: &str = "Hi {name},\n\n\
    I came across the {position} opening at {company} and believe my background is a strong match. \
    I'd welcome the chance to talk about how I could contribute.\n\n\
    Best regards";

const SENIOR_TITLES: [&str; 3] = ["senior", "staff", "principal"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowReport {
    pub follow_ups_sent: usize,
    pub new_jobs_found: usize,
    pub applications_processed: usize,
    pub statuses_updated: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentState {
    pub status: AgentStatus,
    pub daily_application_count: usize,
    pub counted_on: Option<NaiveDate>,
    pub last_activity: Option<String>,
}

/// Runs the daily routine over the tracker: follow-ups, discovery, preparation, ageing.
pub struct JobSearchAgent<'a> {
    ctx: &'a AppContext,
    generator: &'a dyn TextGenerator,
    source: &'a dyn JobSource,
    state: AgentState,
}

impl<'a> JobSearchAgent<'a> {
    pub fn new(ctx: &'a AppContext, generator: &'a dyn TextGenerator, source: &'a dyn JobSource) -> Self {
        Self {
            ctx,
            generator,
            source,
            state: AgentState::default(),
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    #[allow(dead_code)]
    pub fn pause(&mut self) {
        self.state.status = AgentStatus::Paused;
        info!("agent paused");
    }

    #[allow(dead_code)]
    pub fn resume(&mut self) {
        if self.state.status == AgentStatus::Paused {
            self.state.status = AgentStatus::Idle;
            info!("agent resumed");
        }
    }

    pub fn stop(&mut self) {
        self.state.status = AgentStatus::Stopped;
        info!("agent stopped");
    }

    pub fn run_daily_workflow(&mut self) -> WorkflowReport {
        self.run_daily_workflow_on(Local::now().date_naive())
    }

    pub fn run_daily_workflow_on(&mut self, today: NaiveDate) -> WorkflowReport {
        let mut report = WorkflowReport::default();

        if self.state.status != AgentStatus::Idle {
            report
                .errors
                .push(format!("agent is {:?}; not running", self.state.status).to_lowercase());
            return report;
        }

        if self.state.counted_on != Some(today) {
            self.state.counted_on = Some(today);
            self.state.daily_application_count = 0;
        }

        info!(%today, "starting daily workflow");
        self.state.status = AgentStatus::Running;
        self.state.last_activity = Some(Local::now().to_rfc3339());

        self.process_follow_ups(today, &mut report);
        self.search_new_jobs(today, &mut report);
        self.process_new_applications(&mut report);
        self.update_application_statuses(today, &mut report);

        self.state.status = AgentStatus::Idle;
        info!(
            follow_ups = report.follow_ups_sent,
            discovered = report.new_jobs_found,
            processed = report.applications_processed,
            aged = report.statuses_updated,
            errors = report.errors.len(),
            "daily workflow finished"
        );
        report
    }

    fn process_follow_ups(&mut self, today: NaiveDate, report: &mut WorkflowReport) {
        let tracker = &self.ctx.tracker;
        let due = tracker.follow_up_reminders_from(today, self.ctx.config.follow_up_days);

        for app in due {
            let draft = fill_template(FOLLOW_UP_TEMPLATE, &message_values(&app));
            let prompt = format!(
                "Rewrite this follow-up note to a recruiter so it stays brief and professional.\n\n{}{}",
                DRAFT_MARKER, draft
            );

            let message = match self.generator.generate(&prompt, MESSAGE_MAX_TOKENS) {
                Ok(generation) => generation.text,
                Err(e) => {
                    error!("Error drafting follow-up for {}: {e:#}", app.company);
                    report.errors.push(format!("Follow-up error for {}: {e}", app.company));
                    continue;
                }
            };

            let update = ApplicationUpdate::new()
                .follow_up_date(Some(today + Duration::days(FOLLOW_UP_INTERVAL_DAYS)))
                .notes(format!("Follow-up sent: {}", excerpt(&message, 100)));

            if tracker.update_application(app.id, &update) {
                report.follow_ups_sent += 1;
                info!("Generated follow-up for {} - {}", app.company, app.position);
            } else {
                report
                    .errors
                    .push(format!("Follow-up error for {}: could not update application {}", app.company, app.id));
            }
        }
    }

    fn search_new_jobs(&mut self, today: NaiveDate, report: &mut WorkflowReport) {
        let listings = match self.source.fetch() {
            Ok(listings) => listings,
            Err(e) => {
                error!("Error searching for jobs: {e:#}");
                report.errors.push(format!("Job search error: {e}"));
                return;
            }
        };

        let tracker = &self.ctx.tracker;
        for listing in listings {
            if self.already_tracked(&listing) {
                continue;
            }

            let application = NewApplication {
                company: listing.company.trim().to_string(),
                position: listing.title.trim().to_string(),
                location: listing.location.clone(),
                job_url: listing.link.clone(),
                job_description: listing.description.clone(),
                salary_range: listing.salary.clone(),
                application_date: Some(today),
                status: ApplicationStatus::Discovered,
                priority: priority_for(&listing, &self.ctx.config.agent.target_companies),
                notes: Some("Discovered by job search agent".to_string()),
                ..Default::default()
            };

            match tracker.add_application(&application) {
                Ok(_) => {
                    report.new_jobs_found += 1;
                    info!("Discovered new job: {} at {}", application.position, application.company);
                }
                Err(e) => report
                    .errors
                    .push(format!("Job processing error for {}: {e}", listing.company)),
            }
        }
    }

    fn already_tracked(&self, listing: &JobListing) -> bool {
        let title = listing.title.trim().to_lowercase();
        self.ctx
            .tracker
            .applications(&ApplicationFilter::with_company(listing.company.trim()))
            .iter()
            .any(|app| app.position.trim().to_lowercase() == title)
    }

    fn process_new_applications(&mut self, report: &mut WorkflowReport) {
        let tracker = &self.ctx.tracker;
        let limit = self.ctx.config.agent.daily_limit;
        let discovered = tracker.applications(&ApplicationFilter::with_status(ApplicationStatus::Discovered));

        for app in discovered {
            if self.state.daily_application_count >= limit {
                info!(limit, "daily application limit reached");
                break;
            }

            let draft = fill_template(OUTREACH_TEMPLATE, &message_values(&app));
            let prompt = format!(
                "Rewrite this introduction to a recruiter for the role below.\n\n\
                 Role: {} at {}\n{}\n\n{}{}",
                app.position,
                app.company,
                app.job_description.as_deref().unwrap_or_default(),
                DRAFT_MARKER,
                draft
            );

            let message = match self.generator.generate(&prompt, MESSAGE_MAX_TOKENS) {
                Ok(generation) => generation.text,
                Err(e) => {
                    error!("Error processing application {}: {e:#}", app.id);
                    report.errors.push(format!("Application processing error: {e}"));
                    continue;
                }
            };

            let update = ApplicationUpdate::new()
                .status(ApplicationStatus::ReadyToApply)
                .notes(format!("Recruiter message drafted: {}", excerpt(&message, 200)));

            if tracker.update_application(app.id, &update) {
                report.applications_processed += 1;
                self.state.daily_application_count += 1;
            } else {
                report
                    .errors
                    .push(format!("Application processing error: could not update application {}", app.id));
            }
        }
    }

    fn update_application_statuses(&mut self, today: NaiveDate, report: &mut WorkflowReport) {
        let tracker = &self.ctx.tracker;
        let applied = tracker.applications(&ApplicationFilter::with_status(ApplicationStatus::Applied));

        for app in applied {
            let Some(applied_on) = app.application_date else {
                continue;
            };
            if (today - applied_on).num_days() < FOLLOW_UP_INTERVAL_DAYS {
                continue;
            }

            let update = ApplicationUpdate::new()
                .status(ApplicationStatus::UnderReview)
                .follow_up_date(Some(today + Duration::days(FOLLOW_UP_INTERVAL_DAYS)));

            if tracker.update_application(app.id, &update) {
                report.statuses_updated += 1;
                info!("Updated status for {} - {} to under_review", app.company, app.position);
            } else {
                warn!(id = app.id, "could not move application to under_review");
                report
                    .errors
                    .push(format!("Status update error: could not update application {}", app.id));
            }
        }
    }
}

fn message_values(app: &Application) -> [(&'static str, &str); 3] {
    [
        ("name", app.recruiter_name.as_deref().unwrap_or("Hiring Manager")),
        ("company", app.company.as_str()),
        ("position", app.position.as_str()),
    ]
}

/// High for target companies and senior titles, medium otherwise.
pub fn priority_for(listing: &JobListing, target_companies: &[String]) -> Priority {
    let company = listing.company.trim().to_lowercase();
    if target_companies
        .iter()
        .any(|target| target.trim().to_lowercase() == company)
    {
        return Priority::High;
    }

    let title = listing.title.to_lowercase();
    if SENIOR_TITLES.iter().any(|word| title.contains(word)) {
        return Priority::High;
    }

    Priority::Medium
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{Generation, TemplateGenerator};
    use crate::config::TrackerConfig;
    use crate::listings::NoListings;
    use anyhow::{anyhow, Result};
    use tempfile::TempDir;

    struct StaticSource(Vec<JobListing>);

    impl JobSource for StaticSource {
        fn fetch(&self) -> Result<Vec<JobListing>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl JobSource for FailingSource {
        fn fetch(&self) -> Result<Vec<JobListing>> {
            Err(anyhow!("search quota exceeded"))
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<Generation> {
            Err(anyhow!("service unavailable"))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    fn test_context(daily_limit: usize) -> (TempDir, AppContext) {
        let dir = TempDir::new().unwrap();
        let mut config = TrackerConfig {
            database_path: Some(dir.path().join("jobs.db")),
            ..Default::default()
        };
        config.agent.daily_limit = daily_limit;
        config.agent.target_companies = vec!["Google".to_string()];
        (dir, AppContext::initialize(config).unwrap())
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn listing(title: &str, company: &str) -> JobListing {
        JobListing {
            title: title.to_string(),
            company: company.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_priority_for() {
        let targets = vec!["Google".to_string()];
        assert_eq!(priority_for(&listing("Data Engineer", "google"), &targets), Priority::High);
        assert_eq!(priority_for(&listing("Staff ML Engineer", "Acme"), &targets), Priority::High);
        assert_eq!(priority_for(&listing("ML Engineer", "Acme"), &targets), Priority::Medium);
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_follow_up_step_reschedules_and_notes() {
        let (_dir, ctx) = test_context(5);
        let today = day("2024-01-22");
        let mut app = NewApplication::new("Google", "Senior Data Engineer");
        app.recruiter_name = Some("Sarah Johnson".to_string());
        app.application_date = Some(day("2024-01-20"));
        app.follow_up_date = Some(day("2024-01-22"));
        let id = ctx.tracker.add_application(&app).unwrap();

        let mut agent = JobSearchAgent::new(&ctx, &TemplateGenerator, &NoListings);
        let report = agent.run_daily_workflow_on(today);

        assert_eq!(report.follow_ups_sent, 1);
        assert!(report.errors.is_empty());
        let stored = ctx.tracker.get_application(id).unwrap();
        assert_eq!(stored.follow_up_date, Some(day("2024-01-29")));
        let notes = stored.notes.unwrap();
        assert!(notes.starts_with("Follow-up sent: Hi Sarah Johnson,"));
        assert!(notes.ends_with("..."));
    }

    #[test]
    fn test_discovery_skips_tracked_positions() {
        let (_dir, ctx) = test_context(0);
        ctx.tracker
            .add_application(&NewApplication::new("Meta", "ML Engineer"))
            .unwrap();

        let source = StaticSource(vec![
            listing("ml engineer", "Meta"),
            listing("Data Engineer", "Google"),
            listing("Backend Engineer", "Acme"),
        ]);
        let mut agent = JobSearchAgent::new(&ctx, &TemplateGenerator, &source);
        let report = agent.run_daily_workflow_on(day("2024-02-01"));

        assert_eq!(report.new_jobs_found, 2);
        let discovered = ctx
            .tracker
            .applications(&ApplicationFilter::with_status(ApplicationStatus::Discovered));
        assert_eq!(discovered.len(), 2);
        let google = discovered.iter().find(|a| a.company == "Google").unwrap();
        assert_eq!(google.priority, Priority::High);
        assert_eq!(google.application_date, Some(day("2024-02-01")));
        let acme = discovered.iter().find(|a| a.company == "Acme").unwrap();
        assert_eq!(acme.priority, Priority::Medium);

        // A second run finds nothing new.
        let report = agent.run_daily_workflow_on(day("2024-02-01"));
        assert_eq!(report.new_jobs_found, 0);
    }

    #[test]
    fn test_preparation_respects_daily_limit() {
        let (_dir, ctx) = test_context(2);
        let source = StaticSource(vec![
            listing("Engineer I", "Acme"),
            listing("Engineer II", "Acme"),
            listing("Engineer III", "Acme"),
        ]);
        let mut agent = JobSearchAgent::new(&ctx, &TemplateGenerator, &source);

        let report = agent.run_daily_workflow_on(day("2024-02-01"));
        assert_eq!(report.new_jobs_found, 3);
        assert_eq!(report.applications_processed, 2);
        assert_eq!(agent.state().daily_application_count, 2);

        let ready = ctx
            .tracker
            .applications(&ApplicationFilter::with_status(ApplicationStatus::ReadyToApply));
        assert_eq!(ready.len(), 2);
        assert!(ready[0].notes.as_deref().unwrap().starts_with("Recruiter message drafted:"));

        let report = agent.run_daily_workflow_on(day("2024-02-01"));
        assert_eq!(report.applications_processed, 0);

        let report = agent.run_daily_workflow_on(day("2024-02-02"));
        assert_eq!(report.applications_processed, 1);
    }

    #[test]
    fn test_ageing_moves_old_applications_to_review() {
        let (_dir, ctx) = test_context(5);
        let mut old = NewApplication::new("Acme", "Old");
        old.application_date = Some(day("2024-01-01"));
        let old_id = ctx.tracker.add_application(&old).unwrap();
        let mut fresh = NewApplication::new("Acme", "Fresh");
        fresh.application_date = Some(day("2024-01-05"));
        let fresh_id = ctx.tracker.add_application(&fresh).unwrap();

        let mut agent = JobSearchAgent::new(&ctx, &TemplateGenerator, &NoListings);
        let report = agent.run_daily_workflow_on(day("2024-01-08"));

        assert_eq!(report.statuses_updated, 1);
        let old = ctx.tracker.get_application(old_id).unwrap();
        assert_eq!(old.status, ApplicationStatus::UnderReview);
        assert_eq!(old.follow_up_date, Some(day("2024-01-15")));
        assert_eq!(
            ctx.tracker.get_application(fresh_id).unwrap().status,
            ApplicationStatus::Applied
        );
    }

    #[test]
    fn test_failures_are_collected_not_fatal() {
        let (_dir, ctx) = test_context(5);
        let mut app = NewApplication::new("Google", "SWE");
        app.follow_up_date = Some(day("2024-01-01"));
        ctx.tracker.add_application(&app).unwrap();
        let mut discovered = NewApplication::new("Meta", "ML Engineer");
        discovered.status = ApplicationStatus::Discovered;
        ctx.tracker.add_application(&discovered).unwrap();

        let mut agent = JobSearchAgent::new(&ctx, &FailingGenerator, &FailingSource);
        let report = agent.run_daily_workflow_on(day("2024-01-02"));

        assert_eq!(report.follow_ups_sent, 0);
        assert_eq!(report.applications_processed, 0);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors.iter().any(|e| e.contains("search quota exceeded")));
        assert_eq!(agent.state().status, AgentStatus::Idle);
    }

    #[test]
    fn test_paused_agent_does_not_run() {
        let (_dir, ctx) = test_context(5);
        let mut agent = JobSearchAgent::new(&ctx, &TemplateGenerator, &NoListings);

        agent.pause();
        let report = agent.run_daily_workflow_on(day("2024-01-02"));
        assert_eq!(report.errors, vec!["agent is paused; not running".to_string()]);

        agent.resume();
        assert!(agent.run_daily_workflow_on(day("2024-01-02")).errors.is_empty());

        agent.stop();
        agent.resume();
        assert_eq!(agent.state().status, AgentStatus::Stopped);
    }
}
