use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use subtrace_core::{PendingTaskRecord, TaskStore};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingEntry<'a> {
    key: &'a str,
    age_seconds: i64,
    #[serde(flatten)]
    record: &'a PendingTaskRecord,
}

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root);
    let store = super::open_store(root, &config);
    let records = store
        .list()
        .with_context(|| format!("failed to read {}", store.path().display()))?;
    let now = Utc::now();

    if json {
        let entries: Vec<PendingEntry> = records
            .iter()
            .map(|(key, record)| PendingEntry {
                key,
                age_seconds: record.age(now).num_seconds(),
                record,
            })
            .collect();
        return print_json(&entries);
    }

    if records.is_empty() {
        println!("No pending tasks.");
        return Ok(());
    }
    let rows = records
        .iter()
        .map(|(key, record)| {
            vec![
                key.clone(),
                display_or_dash(&record.agent_type),
                display_or_dash(&record.session_id),
                format_age(record.age(now)),
            ]
        })
        .collect();
    print_table(&["KEY", "AGENT", "SESSION", "AGE"], rows);
    Ok(())
}

fn display_or_dash(s: &str) -> String {
    if s.is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h{}m", s / 3600, (s % 3600) / 60),
        s => format!("{}d{}h", s / 86_400, (s % 86_400) / 3600),
    }
}
