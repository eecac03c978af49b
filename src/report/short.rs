use std::io::Write;

use serde::Serialize;

use crate::git::Resolution;
use crate::report::format_timestamp;

#[derive(Debug, Serialize)]
struct ShortRecord<'a> {
    commit: &'a str,
    original: String,
    corrected: String,
}

pub fn render<W: Write>(out: &mut W, resolution: &Resolution, json: bool) -> anyhow::Result<()> {
    let records: Vec<ShortRecord> = resolution
        .changes
        .values()
        .map(|change| ShortRecord {
            commit: &change.commit_id,
            original: format_timestamp(&change.original),
            corrected: format_timestamp(&change.corrected),
        })
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *out, &records)?;
        writeln!(out)?;
        return Ok(());
    }

    for record in &records {
        writeln!(
            out,
            "commit \"{}\" from \"{}\" to \"{}\"",
            record.commit, record.original, record.corrected
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Change;
    use chrono::{TimeZone, Utc};

    fn resolution_with_change() -> Resolution {
        let mut resolution = Resolution::default();
        resolution.changes.insert(
            "B".into(),
            Change {
                commit_id: "B".into(),
                original: Utc.timestamp_opt(50, 0).unwrap(),
                corrected: Utc.timestamp_opt(101, 0).unwrap(),
                causing_parent: Some("A".into()),
            },
        );
        resolution
    }

    #[test]
    fn one_line_per_change() {
        let mut out = Vec::new();
        render(&mut out, &resolution_with_change(), false).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "commit \"B\" from \"1970-01-01T00:00:50+00:00\" to \"1970-01-01T00:01:41+00:00\"\n"
        );
    }

    #[test]
    fn json_lists_changes() {
        let mut out = Vec::new();
        render(&mut out, &resolution_with_change(), true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["commit"], "B");
        assert_eq!(value[0]["corrected"], "1970-01-01T00:01:41+00:00");
    }

    #[test]
    fn no_changes_prints_nothing() {
        let mut out = Vec::new();
        render(&mut out, &Resolution::default(), false).unwrap();
        assert!(out.is_empty());
    }
}
