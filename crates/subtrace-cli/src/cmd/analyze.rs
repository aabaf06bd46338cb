use crate::output::print_json;
use anyhow::bail;
use std::path::Path;
use subtrace_core::definition;
use subtrace_core::EditClassifier;

pub fn run(root: &Path, transcript: &Path, cwd: Option<&Path>) -> anyhow::Result<()> {
    if !transcript.is_file() {
        bail!("transcript not found: {}", transcript.display());
    }
    let config = super::load_config(root);
    let mut classifier =
        EditClassifier::new(config.tools.clone()).with_home(definition::home_dir());
    if let Some(dir) = cwd {
        classifier = classifier.with_base_dir(dir);
    }

    let mut report = classifier.classify(claude_transcript::read(transcript));
    report.transcript_path = Some(transcript.display().to_string());
    if let Some(dir) = cwd {
        report.cwd = dir.display().to_string();
    }
    tracing::debug!(summary = %report.summary(), "transcript analysed");
    print_json(&report)
}
