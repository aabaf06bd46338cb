use crate::error::Result;
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_STORE: &str = "SUBTRACE_STORE";
pub const ENV_DIAGNOSTICS: &str = "SUBTRACE_DIAGNOSTICS";
pub const ENV_STRICT: &str = "SUBTRACE_STRICT";

// ---------------------------------------------------------------------------
// ToolNames
// ---------------------------------------------------------------------------

/// Which host tool names count as which kind of operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolNames {
    /// Whole-file writes (`file_path` argument)
    #[serde(default = "default_write_tools")]
    pub write: Vec<String>,
    /// Partial edits (`file_path` / `notebook_path` argument)
    #[serde(default = "default_edit_tools")]
    pub edit: Vec<String>,
    /// Shell execution (`command` argument)
    #[serde(default = "default_command_tools")]
    pub command: Vec<String>,
    #[serde(default = "default_read_tools")]
    pub read: Vec<String>,
    #[serde(default = "default_skill_tools")]
    pub skill: Vec<String>,
    /// Tools that hand work to a subagent
    #[serde(default = "default_delegate_tools")]
    pub delegate: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_write_tools() -> Vec<String> {
    names(&["Write"])
}

fn default_edit_tools() -> Vec<String> {
    names(&["Edit", "MultiEdit", "NotebookEdit"])
}

fn default_command_tools() -> Vec<String> {
    names(&["Bash"])
}

fn default_read_tools() -> Vec<String> {
    names(&["Read"])
}

fn default_skill_tools() -> Vec<String> {
    names(&["Skill"])
}

fn default_delegate_tools() -> Vec<String> {
    names(&["Task", "Agent"])
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            write: default_write_tools(),
            edit: default_edit_tools(),
            command: default_command_tools(),
            read: default_read_tools(),
            skill: default_skill_tools(),
            delegate: default_delegate_tools(),
        }
    }
}

impl ToolNames {
    pub fn is_write(&self, name: &str) -> bool {
        self.write.iter().any(|t| t == name)
    }

    pub fn is_edit(&self, name: &str) -> bool {
        self.edit.iter().any(|t| t == name)
    }

    pub fn is_command(&self, name: &str) -> bool {
        self.command.iter().any(|t| t == name)
    }

    pub fn is_read(&self, name: &str) -> bool {
        self.read.iter().any(|t| t == name)
    }

    pub fn is_skill(&self, name: &str) -> bool {
        self.skill.iter().any(|t| t == name)
    }

    pub fn is_delegate(&self, name: &str) -> bool {
        self.delegate.iter().any(|t| t == name)
    }
}

// ---------------------------------------------------------------------------
// DiagnosticsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Relative paths resolve against the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

/// Contents of `.claude/subtrace.yaml`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    /// Escalate internal failures to a blocking hook response.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub tools: ToolNames,
}

impl Config {
    /// Load the project config. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        match io::read_if_exists(&path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_yaml::from_str(&data)?),
            _ => Ok(Config::default()),
        }
    }

    /// Like [`Config::load`], but a malformed file is logged and ignored so a
    /// bad config never blocks a hook.
    pub fn load_or_default(root: &Path) -> Self {
        match Config::load(root) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(
                    path = %paths::config_path(root).display(),
                    "ignoring unreadable config: {e}"
                );
                Config::default()
            }
        }
    }

    /// Load the project config and apply process-environment overrides.
    pub fn resolve(root: &Path) -> Self {
        let mut cfg = Config::load_or_default(root);
        cfg.apply_env(|key| std::env::var(key).ok());
        cfg
    }

    /// Apply `SUBTRACE_*` overrides from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(store) = lookup(ENV_STORE).filter(|s| !s.trim().is_empty()) {
            self.store_path = Some(PathBuf::from(store));
        }
        if let Some(diag) = lookup(ENV_DIAGNOSTICS).map(|s| s.trim().to_string()) {
            if is_truthy(&diag) {
                self.diagnostics.enabled = true;
            } else if is_falsy(&diag) {
                self.diagnostics.enabled = false;
            } else {
                self.diagnostics.enabled = true;
                self.diagnostics.path = Some(PathBuf::from(diag));
            }
        }
        if let Some(strict) = lookup(ENV_STRICT) {
            self.strict = is_truthy(strict.trim());
        }
    }

    pub fn store_path(&self, root: &Path) -> PathBuf {
        match &self.store_path {
            Some(p) => root.join(p),
            None => paths::store_path(root),
        }
    }

    /// `None` when the diagnostic channel is disabled.
    pub fn diagnostics_path(&self, root: &Path) -> Option<PathBuf> {
        if !self.diagnostics.enabled {
            return None;
        }
        Some(match &self.diagnostics.path {
            Some(p) => root.join(p),
            None => paths::diagnostics_path(root),
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn is_falsy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.tools.is_write("Write"));
        assert!(cfg.tools.is_delegate("Task"));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = paths::config_path(dir.path());
        io::atomic_write(
            &path,
            b"strict: true\ntools:\n  command: [Bash, Shell]\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert!(cfg.strict);
        assert!(cfg.tools.is_command("Shell"));
        assert!(cfg.tools.is_edit("MultiEdit"));
        assert!(!cfg.diagnostics.enabled);
    }

    #[test]
    fn malformed_yaml_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        io::atomic_write(&paths::config_path(dir.path()), b"strict: [not a bool").unwrap();
        assert!(Config::load(dir.path()).is_err());
        assert_eq!(Config::load_or_default(dir.path()), Config::default());
    }

    #[test]
    fn store_path_defaults_under_claude_state() {
        let root = Path::new("/proj");
        assert_eq!(
            Config::default().store_path(root),
            PathBuf::from("/proj/.claude/state/pending-tasks.json")
        );
    }

    #[test]
    fn env_overrides_store_and_strict() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[(ENV_STORE, "/var/tmp/tasks.json"), (ENV_STRICT, "1")]));
        assert!(cfg.strict);
        assert_eq!(
            cfg.store_path(Path::new("/proj")),
            PathBuf::from("/var/tmp/tasks.json")
        );
    }

    #[test]
    fn diagnostics_flag_uses_default_path() {
        let mut cfg = Config::default();
        assert!(cfg.diagnostics_path(Path::new("/proj")).is_none());
        cfg.apply_env(env(&[(ENV_DIAGNOSTICS, "true")]));
        assert_eq!(
            cfg.diagnostics_path(Path::new("/proj")),
            Some(PathBuf::from("/proj/.claude/state/subtrace-diagnostics.jsonl"))
        );
    }

    #[test]
    fn diagnostics_env_path_value() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[(ENV_DIAGNOSTICS, "logs/hooks.jsonl")]));
        assert_eq!(
            cfg.diagnostics_path(Path::new("/proj")),
            Some(PathBuf::from("/proj/logs/hooks.jsonl"))
        );
    }

    #[test]
    fn diagnostics_env_can_disable() {
        let mut cfg = Config::default();
        cfg.diagnostics.enabled = true;
        cfg.apply_env(env(&[(ENV_DIAGNOSTICS, "0")]));
        assert!(cfg.diagnostics_path(Path::new("/proj")).is_none());
    }
}
