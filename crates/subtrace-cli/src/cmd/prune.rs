use crate::output::print_json;
use anyhow::Context;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PruneOutput {
    dry_run: bool,
    removed: Vec<String>,
}

pub fn run(root: &Path, older_than_hours: u32, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root);
    let store = super::open_store(root, &config);
    let cutoff = Utc::now() - Duration::hours(i64::from(older_than_hours));
    let removed = store
        .prune_older_than(cutoff, dry_run)
        .with_context(|| format!("failed to prune {}", store.path().display()))?;

    if json {
        return print_json(&PruneOutput { dry_run, removed });
    }
    let verb = if dry_run { "Would remove" } else { "Removed" };
    if removed.is_empty() {
        println!("No pending tasks older than {older_than_hours}h.");
    } else {
        println!("{verb} {} pending task(s):", removed.len());
        for key in &removed {
            println!("  {key}");
        }
    }
    Ok(())
}
