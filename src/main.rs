mod agent;
mod ai;
mod config;
mod context;
mod db;
mod error;
mod listings;
mod models;
mod report;
mod tracker;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use agent::JobSearchAgent;
use config::TrackerConfig;
use context::AppContext;
use listings::{JobSource, JsonFileSource, NoListings};
use models::{
    Application, ApplicationFilter, ApplicationStatus, ApplicationUpdate, Interview,
    InterviewType, NewApplication, NewInterview, Priority,
};
use report::truncate;

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Job application tracker - applications, interviews, follow-ups and stats")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Track a new application
    Add {
        /// Company name
        company: String,

        /// Position title
        position: String,

        #[arg(short, long)]
        location: Option<String>,

        /// Job posting URL
        #[arg(short, long)]
        url: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Application date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// discovered, ready_to_apply, applied, under_review, interview_scheduled, rejected, offer_received
        #[arg(short, long, default_value = "applied")]
        status: ApplicationStatus,

        /// high, medium, low
        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        #[arg(long)]
        salary: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        #[arg(long)]
        recruiter: Option<String>,

        #[arg(long)]
        recruiter_email: Option<String>,

        /// Follow-up date (YYYY-MM-DD)
        #[arg(long)]
        follow_up: Option<NaiveDate>,
    },

    /// List applications
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<ApplicationStatus>,

        /// Filter by company (substring, case-insensitive)
        #[arg(short, long)]
        company: Option<String>,

        /// Maximum rows to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show an application and its interviews
    Show {
        /// Application ID
        id: i64,
    },

    /// Change fields of an application
    Update {
        /// Application ID
        id: i64,

        /// Changes as field=value, e.g. notes="Referred by Sam" follow_up_date=2024-02-01
        #[arg(required = true)]
        changes: Vec<String>,
    },

    /// Set the status of an application
    Status {
        /// Application ID
        id: i64,

        status: ApplicationStatus,
    },

    /// Set the priority of an application
    Priority {
        /// Application ID
        id: i64,

        /// high, medium, low
        priority: Priority,
    },

    /// Set the next follow-up date
    FollowUp {
        /// Application ID
        id: i64,

        /// Follow-up date (YYYY-MM-DD)
        date: NaiveDate,
    },

    /// Record an interview date and move the application to interview_scheduled
    Schedule {
        /// Application ID
        id: i64,

        /// Interview date (YYYY-MM-DD)
        date: NaiveDate,

        /// phone, video, onsite
        #[arg(short = 't', long = "type")]
        kind: Option<InterviewType>,
    },

    /// Mark an application as rejected
    Reject {
        /// Application ID
        id: i64,

        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Record an offer
    Offer {
        /// Application ID
        id: i64,

        #[arg(short, long)]
        amount: Option<String>,
    },

    /// Delete an application and its interviews
    Delete {
        /// Application ID
        id: i64,
    },

    /// Log and list interviews
    Interview {
        #[command(subcommand)]
        command: InterviewCommands,
    },

    /// Show job search statistics
    Stats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show applications with follow-ups due
    FollowUps {
        /// Days ahead to look (defaults to the configured window)
        #[arg(short, long)]
        days: Option<i64>,
    },

    /// Run the daily workflow: follow-ups, discovery, preparation, status ageing
    Run {
        /// JSON file of job listings to discover from
        #[arg(long)]
        listings: Option<PathBuf>,

        /// Text model: template (offline), api-sonnet, api-haiku, gpt-4o, gpt-4o-mini
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
enum InterviewCommands {
    /// Log an interview for an application
    Add {
        /// Application ID
        application_id: i64,

        /// Interview date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// phone, video, onsite
        #[arg(short = 't', long = "type")]
        kind: Option<InterviewType>,

        #[arg(long)]
        interviewer: Option<String>,

        #[arg(long)]
        interviewer_title: Option<String>,

        #[arg(long)]
        questions: Option<String>,

        #[arg(long)]
        answers: Option<String>,

        #[arg(long)]
        feedback: Option<String>,

        #[arg(long)]
        next_steps: Option<String>,

        #[arg(long)]
        prep: Option<String>,
    },

    /// Show one interview in full
    Show {
        /// Interview ID
        id: i64,
    },

    /// List interviews
    List {
        /// Only interviews for this application
        application_id: Option<i64>,
    },
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TrackerConfig::load(cli.config.as_deref())?;
    init_logging(&config.log_level);

    let ctx = match cli.command {
        Commands::Init => AppContext::initialize(config)?,
        _ => AppContext::attach(config)?,
    };

    let result = run_command(&ctx, cli.command);
    ctx.shutdown();
    result
}

fn run_command(ctx: &AppContext, command: Commands) -> Result<()> {
    let tracker = &ctx.tracker;

    match command {
        Commands::Init => {
            println!(
                "Database initialized at {}",
                tracker.database().path().display()
            );
        }

        Commands::Add {
            company,
            position,
            location,
            url,
            description,
            date,
            status,
            priority,
            salary,
            notes,
            recruiter,
            recruiter_email,
            follow_up,
        } => {
            let application = NewApplication {
                location,
                job_url: url,
                job_description: description,
                application_date: date.or_else(|| Some(chrono::Local::now().date_naive())),
                status,
                priority,
                salary_range: salary,
                notes,
                recruiter_name: recruiter,
                recruiter_email,
                follow_up_date: follow_up,
                ..NewApplication::new(company, position)
            };
            let id = tracker
                .add_application(&application)
                .context("Failed to add application")?;
            println!(
                "Added application #{} ({} at {})",
                id, application.position, application.company
            );
        }

        Commands::List {
            status,
            company,
            limit,
        } => {
            let filter = ApplicationFilter {
                status,
                company,
                limit: limit.or(Some(ctx.config.list_limit)),
            };
            let apps = tracker.applications(&filter);
            if apps.is_empty() {
                println!("No applications found.");
            } else {
                println!(
                    "{:<6} {:<20} {:<8} {:<11} {:<22} {:<28}",
                    "ID", "STATUS", "PRIORITY", "APPLIED", "COMPANY", "POSITION"
                );
                println!("{}", "-".repeat(98));
                for app in apps {
                    println!(
                        "{:<6} {:<20} {:<8} {:<11} {:<22} {:<28}",
                        app.id,
                        app.status.as_str(),
                        app.priority.as_str(),
                        app.application_date.map(|d| d.to_string()).unwrap_or_default(),
                        truncate(&app.company, 20),
                        truncate(&app.position, 26)
                    );
                }
            }
        }

        Commands::Show { id } => match tracker.get_application(id) {
            Some(app) => print_application(ctx, &app),
            None => println!("Application #{} not found.", id),
        },

        Commands::Update { id, changes } => {
            let mut update = ApplicationUpdate::new();
            for change in &changes {
                let (field, value) = change
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Expected field=value, got '{}'", change))?;
                update = update.set(field, value)?;
            }
            if update.is_empty() {
                return Err(anyhow!("No changes given for application #{}", id));
            }
            report_change(id, tracker.update_application(id, &update));
        }

        Commands::Status { id, status } => {
            if tracker.set_status(id, status) {
                println!("Application #{} is now {}.", id, status);
            } else {
                println!("Application #{} not updated.", id);
            }
        }

        Commands::Priority { id, priority } => {
            report_change(id, tracker.set_priority(id, priority));
        }

        Commands::FollowUp { id, date } => {
            report_change(id, tracker.schedule_follow_up(id, date));
        }

        Commands::Schedule { id, date, kind } => {
            report_change(id, tracker.schedule_interview(id, date, kind));
        }

        Commands::Reject { id, reason } => {
            report_change(id, tracker.mark_rejected(id, reason));
        }

        Commands::Offer { id, amount } => {
            report_change(id, tracker.record_offer(id, amount));
        }

        Commands::Delete { id } => {
            if tracker.delete_application(id) {
                println!("Deleted application #{} and its interviews.", id);
            } else {
                println!("Application #{} not found.", id);
            }
        }

        Commands::Interview { command } => match command {
            InterviewCommands::Add {
                application_id,
                date,
                kind,
                interviewer,
                interviewer_title,
                questions,
                answers,
                feedback,
                next_steps,
                prep,
            } => {
                let interview = NewInterview {
                    application_id,
                    interview_date: date,
                    interview_type: kind,
                    interviewer_name: interviewer,
                    interviewer_title,
                    questions_asked: questions,
                    answers,
                    feedback_received: feedback,
                    next_steps,
                    preparation_notes: prep,
                };
                let id = tracker.add_interview(&interview).with_context(|| {
                    format!("Failed to log interview for application #{}", application_id)
                })?;
                println!("Logged interview #{} for application #{}", id, application_id);
            }

            InterviewCommands::Show { id } => match tracker.get_interview(id) {
                Some(interview) => print_interview(&interview),
                None => println!("Interview #{} not found.", id),
            },

            InterviewCommands::List { application_id } => {
                let interviews = tracker.interviews(application_id);
                if interviews.is_empty() {
                    println!("No interviews found.");
                } else {
                    println!(
                        "{:<6} {:<6} {:<11} {:<8} {:<24} {:<30}",
                        "ID", "APP", "DATE", "TYPE", "INTERVIEWER", "NEXT STEPS"
                    );
                    println!("{}", "-".repeat(90));
                    for interview in interviews {
                        println!(
                            "{:<6} {:<6} {:<11} {:<8} {:<24} {:<30}",
                            interview.id,
                            interview.application_id,
                            interview.interview_date.map(|d| d.to_string()).unwrap_or_default(),
                            interview.interview_type.map(|t| t.as_str()).unwrap_or("-"),
                            truncate(&interview.interviewer_name.unwrap_or_default(), 22),
                            truncate(&interview.next_steps.unwrap_or_default(), 30)
                        );
                    }
                }
            }
        },

        Commands::Stats { json } => {
            let stats = tracker.statistics();
            if json {
                println!("{}", report::statistics_json(&stats)?);
            } else {
                print!("{}", report::render_statistics(&stats));
            }
        }

        Commands::FollowUps { days } => {
            let days = days.unwrap_or(ctx.config.follow_up_days);
            let due = tracker.follow_up_reminders(days);
            print!("{}", report::render_follow_ups(&due, days));
        }

        Commands::Run { listings, model } => {
            let model = model.unwrap_or_else(|| ctx.config.agent.model.clone());
            let generator = ai::create_generator(&ai::resolve_model(&model)?)?;

            let listings_path = listings.or_else(|| ctx.config.agent.listings_path.clone());
            let source: Box<dyn JobSource> = match listings_path {
                Some(path) => Box::new(JsonFileSource::new(path)),
                None => Box::new(NoListings),
            };

            println!("Running daily workflow with model '{}'...", generator.model_name());
            let mut agent = JobSearchAgent::new(ctx, generator.as_ref(), source.as_ref());
            let report = agent.run_daily_workflow();
            agent.stop();

            println!("\nResults:");
            println!("  Follow-ups sent:         {}", report.follow_ups_sent);
            println!("  New jobs found:          {}", report.new_jobs_found);
            println!("  Applications processed:  {}", report.applications_processed);
            println!("  Statuses updated:        {}", report.statuses_updated);
            if !report.errors.is_empty() {
                println!("  Errors:                  {}", report.errors.len());
                for err in &report.errors {
                    println!("    - {}", err);
                }
            }
            let state = agent.state();
            println!(
                "  Applications today:      {} (limit {})",
                state.daily_application_count, ctx.config.agent.daily_limit
            );
        }
    }

    Ok(())
}

fn print_interview(interview: &Interview) {
    println!("Interview #{} (application #{})", interview.id, interview.application_id);
    if let Some(date) = interview.interview_date {
        println!("Date: {}", date);
    }
    if let Some(kind) = interview.interview_type {
        println!("Type: {}", kind);
    }
    match (&interview.interviewer_name, &interview.interviewer_title) {
        (Some(name), Some(title)) => println!("Interviewer: {} ({})", name, title),
        (Some(name), None) => println!("Interviewer: {}", name),
        (None, Some(title)) => println!("Interviewer: {}", title),
        (None, None) => {}
    }

    for (title, text) in [
        ("Preparation", &interview.preparation_notes),
        ("Questions asked", &interview.questions_asked),
        ("My answers", &interview.answers),
        ("Feedback", &interview.feedback_received),
        ("Next steps", &interview.next_steps),
    ] {
        if let Some(text) = text {
            println!("\n--- {} ---", title);
            for line in textwrap::wrap(text, 80) {
                println!("{}", line);
            }
        }
    }
}

fn report_change(id: i64, changed: bool) {
    if changed {
        println!("Updated application #{}.", id);
    } else {
        println!("Application #{} not updated.", id);
    }
}

fn print_application(ctx: &AppContext, app: &Application) {
    println!("Application #{}", app.id);
    println!("Company: {}", app.company);
    println!("Position: {}", app.position);
    println!("Status: {}", app.status);
    println!("Priority: {}", app.priority);

    let optional = [
        ("Location", app.location.clone()),
        ("URL", app.job_url.clone()),
        ("Applied", app.application_date.map(|d| d.to_string())),
        ("Salary", app.salary_range.clone()),
        ("Recruiter", app.recruiter_name.clone()),
        ("Recruiter email", app.recruiter_email.clone()),
        ("Follow up", app.follow_up_date.map(|d| d.to_string())),
        ("Interview", app.interview_date.map(|d| d.to_string())),
        ("Interview type", app.interview_type.map(|t| t.to_string())),
        ("Rejection reason", app.rejection_reason.clone()),
        ("Offer", app.offer_amount.clone()),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
    println!("Created: {}", app.created_at);
    println!("Updated: {}", app.updated_at);

    for (title, text) in [
        ("Notes", &app.notes),
        ("Interview notes", &app.interview_notes),
        ("Description", &app.job_description),
    ] {
        if let Some(text) = text {
            println!("\n--- {} ---", title);
            for line in textwrap::wrap(text, 80) {
                println!("{}", line);
            }
        }
    }

    let interviews = ctx.tracker.interviews(Some(app.id));
    if !interviews.is_empty() {
        println!("\nInterviews ({}):", interviews.len());
        for interview in interviews {
            println!(
                "  #{} {} {} {}",
                interview.id,
                interview.interview_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                interview.interview_type.map(|t| t.as_str()).unwrap_or("-"),
                interview.interviewer_name.unwrap_or_default()
            );
        }
    }
}
