//! Managed PATH entry in a shell profile.
//!
//! The entry lives in a block delimited by marker comments. Writing it
//! again replaces the block in place, so repeated runs never stack
//! duplicate PATH entries.

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, ProvisionError};
use crate::types::StepOutcome;

fn begin_marker(tag: &str) -> String {
    format!("# >>> hostup {tag} >>>")
}

fn end_marker(tag: &str) -> String {
    format!("# <<< hostup {tag} <<<")
}

/// Render the profile contents with the managed block for `tag` set to
/// append `dir` to `PATH`.
pub fn render_path_block(existing: &str, dir: &Path, tag: &str) -> String {
    let begin = begin_marker(tag);
    let end = end_marker(tag);
    let block = format!("{begin}\nexport PATH=\"$PATH:{}\"\n{end}\n", dir.display());

    let mut out = String::with_capacity(existing.len() + block.len());
    let mut lines = existing.lines();
    let mut replaced = false;

    while let Some(line) = lines.next() {
        if line.trim_end() == begin && !replaced {
            // Drop everything up to and including the end marker.
            for inner in lines.by_ref() {
                if inner.trim_end() == end {
                    break;
                }
            }
            out.push_str(&block);
            replaced = true;
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    if !replaced {
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(&block);
    }
    out
}

/// Ensure `profile` appends `dir` to `PATH` exactly once.
pub fn ensure_path_entry(
    profile: &Path,
    dir: &Path,
    tag: &str,
) -> Result<StepOutcome, ProvisionError> {
    let existing = match fs::read_to_string(profile) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ProvisionError::io(format!("Failed to read {}", profile.display()), e)),
    };

    let updated = render_path_block(&existing, dir, tag);
    if updated == existing {
        return Ok(StepOutcome::Unchanged);
    }

    if let Some(parent) = profile.parent() {
        fs::create_dir_all(parent)
            .io_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(profile, updated).io_context(|| format!("Failed to write {}", profile.display()))?;
    Ok(StepOutcome::Changed)
}
