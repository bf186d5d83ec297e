use tracing::info;

use crate::config::TrackerConfig;
use crate::db::Database;
use crate::error::TrackerResult;
use crate::tracker::JobTracker;

/// Everything a command needs, built once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: TrackerConfig,
    pub tracker: JobTracker,
}

impl AppContext {
    /// Opens the configured database and creates the schema if missing.
    pub fn initialize(config: TrackerConfig) -> TrackerResult<Self> {
        let db = Database::open(config.database_path())?;
        let tracker = JobTracker::open(db)?;
        Ok(Self { config, tracker })
    }

    /// Opens the configured database without touching the schema. Fails if `init` never ran.
    pub fn attach(config: TrackerConfig) -> TrackerResult<Self> {
        let db = Database::open(config.database_path())?;
        db.ensure_initialized()?;
        Ok(Self {
            config,
            tracker: JobTracker::new(db),
        })
    }

    pub fn shutdown(self) {
        info!(path = %self.tracker.database().path().display(), "closing job tracker");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_attach_requires_initialize() {
        let dir = TempDir::new().unwrap();
        let config = TrackerConfig {
            database_path: Some(dir.path().join("jobs.db")),
            ..Default::default()
        };

        assert!(AppContext::attach(config.clone()).is_err());

        let ctx = AppContext::initialize(config.clone()).unwrap();
        ctx.shutdown();

        let ctx = AppContext::attach(config).unwrap();
        assert!(ctx.tracker.statistics().total_applications == 0);
    }
}
