//! Report renderers for a finished resolution.
//!
//! Each submodule renders one output mode, as text or as JSON:
//! - `short`: commit id, original time, corrected time
//! - `long`: identities, the causing parent and where its own time came from
//! - `errors`: commits skipped during the walk

pub mod errors;
pub mod long;
pub mod short;

use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::git::{CommitSource, Resolution};
use crate::models::{TimeSource, rfc3339};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Short,
    Long,
    Errors,
}

impl FromStr for OutputMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(OutputMode::Short),
            "long" => Ok(OutputMode::Long),
            "errors" => Ok(OutputMode::Errors),
            other => Err(AppError::Config(format!(
                "--output must be either \"short\", \"long\" or \"errors\", got \"{}\"",
                other
            ))),
        }
    }
}

pub struct ReportOptions {
    pub mode: OutputMode,
    pub time_source: TimeSource,
    pub json: bool,
}

pub fn render<S: CommitSource, W: Write>(
    out: &mut W,
    options: &ReportOptions,
    resolution: &Resolution,
    source: &S,
) -> anyhow::Result<()> {
    match options.mode {
        OutputMode::Short => short::render(out, resolution, options.json),
        OutputMode::Long => {
            long::render(out, resolution, source, options.time_source, options.json)
        }
        OutputMode::Errors => errors::render(out, resolution, options.json),
    }
}

/// RFC 3339 in UTC with an explicit offset, e.g. `2021-03-04T05:06:07+00:00`.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    rfc3339::format(time)
}

pub fn format_relative_time(time: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let diff = now.timestamp() - time.timestamp();

    if diff < 0 {
        "in the future".to_string()
    } else if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        let mins = diff / 60;
        format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if diff < 86400 {
        let hours = diff / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if diff < 2592000 {
        let days = diff / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if diff < 31536000 {
        let months = diff / 2592000;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = diff / 31536000;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}
