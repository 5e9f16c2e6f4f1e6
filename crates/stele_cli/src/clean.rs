//! `stele clean`: reclaim cache space.

use crate::pipeline::{open_session, status};
use crate::{GlobalArgs, ReportFormat};

/// Runs `stele clean`. Without `all`, only stale temporary files go.
pub fn run(all: bool, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let session = open_session(global, &[])?;
    let cache_dir = session.config().cache_dir.clone();
    status(global, "Cleaning", cache_dir.display());

    let removed = session.clean(all)?;
    match global.format {
        ReportFormat::Text => status(global, "Removed", format!("{removed} file(s)")),
        ReportFormat::Json => println!(
            "{}",
            serde_json::json!({
                "cache_dir": cache_dir.display().to_string(),
                "removed": removed,
            })
        ),
    }
    Ok(0)
}
