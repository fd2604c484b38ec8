//! Project and experiment label parsing
//!
//! Labels look like `Project#2013-15 Rice trial` or
//! `Project#2013-0015_Experiment#3`. Only the first whitespace-separated
//! token is significant; it is normalized to zero-padded form
//! (`Project#2013-0015`, `Project#2013-0015_Experiment#0003`).

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{self, Display, Formatter};

static PROJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^project#?(\d{4})-(\d{1,4})$").expect("valid project regex"));

static EXPERIMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^project#?(\d{4})-(\d{1,4})_experiment#?(\d{1,4})$")
        .expect("valid experiment regex")
});

/// Parsed project label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectLabel {
    /// Four-digit year
    pub year: u16,
    /// Project number within the year
    pub number: u16,
}

impl ProjectLabel {
    /// Parse the first token of a label
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let caps = PROJECT.captures(first_token(label)?)?;
        Some(Self {
            year: caps[1].parse().ok()?,
            number: caps[2].parse().ok()?,
        })
    }
}

impl Display for ProjectLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Project#{:04}-{:04}", self.year, self.number)
    }
}

/// Parsed experiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExperimentLabel {
    /// Owning project
    pub project: ProjectLabel,
    /// Experiment number within the project
    pub number: u16,
}

impl ExperimentLabel {
    /// Parse the first token of a label
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let caps = EXPERIMENT.captures(first_token(label)?)?;
        Some(Self {
            project: ProjectLabel {
                year: caps[1].parse().ok()?,
                number: caps[2].parse().ok()?,
            },
            number: caps[3].parse().ok()?,
        })
    }
}

impl Display for ExperimentLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}_Experiment#{:04}", self.project, self.number)
    }
}

fn first_token(label: &str) -> Option<&str> {
    label.split_whitespace().next()
}

/// Normalized project key, or the trimmed input if it does not parse
#[must_use]
pub fn project_key(raw: &str) -> String {
    ProjectLabel::parse(raw).map_or_else(|| raw.trim().to_string(), |p| p.to_string())
}

/// Normalized experiment key, or the trimmed input if it does not parse
#[must_use]
pub fn experiment_key(raw: &str) -> String {
    ExperimentLabel::parse(raw).map_or_else(|| raw.trim().to_string(), |e| e.to_string())
}
