use std::io::Write;

use crate::git::Resolution;

pub fn render<W: Write>(out: &mut W, resolution: &Resolution, json: bool) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, &resolution.errors)?;
        writeln!(out)?;
        return Ok(());
    }

    for error in &resolution.errors {
        match &error.child_id {
            Some(child) => writeln!(
                out,
                "#ERROR commit \"{}\" (parent of \"{}\") skipped: {}",
                error.commit_id, child, error.message
            )?,
            None => writeln!(
                out,
                "#ERROR commit \"{}\" skipped: {}",
                error.commit_id, error.message
            )?,
        }
    }

    Ok(())
}
