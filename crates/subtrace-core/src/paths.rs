use crate::error::{Result, SubtraceError};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const AGENTS_DIR: &str = ".claude/agents";
pub const SKILLS_DIR: &str = ".claude/skills";

pub const CONFIG_FILE: &str = ".claude/subtrace.yaml";
pub const STORE_FILE: &str = ".claude/state/pending-tasks.json";
pub const DIAGNOSTICS_FILE: &str = ".claude/state/subtrace-diagnostics.jsonl";
pub const SKILL_FILE: &str = "SKILL.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn store_path(root: &Path) -> PathBuf {
    root.join(STORE_FILE)
}

pub fn diagnostics_path(root: &Path) -> PathBuf {
    root.join(DIAGNOSTICS_FILE)
}

/// `<base>/.claude/agents/<agent_type>.md`
pub fn agent_definition_path(base: &Path, agent_type: &str) -> PathBuf {
    base.join(AGENTS_DIR).join(format!("{agent_type}.md"))
}

/// `<base>/.claude/skills/<name>/SKILL.md`
pub fn skill_file_path(base: &Path, name: &str) -> PathBuf {
    base.join(SKILLS_DIR).join(name).join(SKILL_FILE)
}

/// Resolve `path` against `base` and normalise `.` / `..` lexically.
/// Absolute paths ignore `base`.
pub fn resolve_against(base: Option<&Path>, path: &str) -> PathBuf {
    let p = Path::new(path);
    let joined = match base {
        Some(b) if p.is_relative() => b.join(p),
        _ => p.to_path_buf(),
    };
    normalize(&joined)
}

/// Lexical normalisation: drops `.` components and folds `..` into the
/// preceding component. Does not touch the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("valid name regex"))
}

/// Agent types and skill names become file names; reject anything that
/// could escape the agents/skills directory.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 128 || name.contains("..") || !name_re().is_match(name) {
        return Err(SubtraceError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
