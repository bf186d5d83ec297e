use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// One row from a job search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub posted: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
}

pub trait JobSource {
    fn fetch(&self) -> Result<Vec<JobListing>>;
}

/// Listings saved as a JSON array, e.g. exported from a search API.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl JobSource for JsonFileSource {
    fn fetch(&self) -> Result<Vec<JobListing>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read listings file: {}", self.path.display()))?;
        let listings: Vec<JobListing> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse listings file: {}", self.path.display()))?;
        Ok(dedupe_listings(listings))
    }
}

/// Source with nothing to offer; discovery becomes a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoListings;

impl JobSource for NoListings {
    fn fetch(&self) -> Result<Vec<JobListing>> {
        Ok(Vec::new())
    }
}

/// Keeps the first listing for each title and company, ignoring case and blanks.
pub fn dedupe_listings(listings: Vec<JobListing>) -> Vec<JobListing> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    listings
        .into_iter()
        .filter(|l| !l.title.trim().is_empty() && !l.company.trim().is_empty())
        .filter(|l| {
            seen.insert((
                l.title.trim().to_lowercase(),
                l.company.trim().to_lowercase(),
            ))
        })
        .collect()
}
