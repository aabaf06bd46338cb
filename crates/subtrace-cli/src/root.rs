use std::path::{Path, PathBuf};

/// Environment variable the host sets for hook processes.
pub const CLAUDE_PROJECT_DIR: &str = "CLAUDE_PROJECT_DIR";

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `SUBTRACE_ROOT` env var (passed in as `explicit`)
/// 2. `CLAUDE_PROJECT_DIR`
/// 3. Walk upward from `cwd` looking for `.claude/`
/// 4. Walk upward from `cwd` looking for `.git/`
/// 5. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    let project_dir = std::env::var_os(CLAUDE_PROJECT_DIR).map(PathBuf::from);
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(explicit, project_dir.as_deref(), &cwd)
}

fn resolve_from(explicit: Option<&Path>, project_dir: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    if let Some(p) = project_dir.filter(|p| !p.as_os_str().is_empty()) {
        return p.to_path_buf();
    }
    find_upward(cwd, ".claude")
        .or_else(|| find_upward(cwd, ".git"))
        .unwrap_or_else(|| cwd.to_path_buf())
}

fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_from(Some(dir.path()), Some(Path::new("/elsewhere")), dir.path());
        assert_eq!(result, dir.path());
    }

    #[test]
    fn project_dir_beats_walking() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        let result = resolve_from(None, Some(Path::new("/proj")), dir.path());
        assert_eq!(result, PathBuf::from("/proj"));
    }

    #[test]
    fn finds_claude_dir_above_cwd() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(resolve_from(None, None, &subdir), dir.path());
    }

    #[test]
    fn claude_dir_is_preferred_over_git() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let inner = dir.path().join("pkg");
        std::fs::create_dir_all(inner.join(".claude")).unwrap();
        assert_eq!(resolve_from(None, None, &inner.join("src")), inner);
    }

    #[test]
    fn falls_back_to_git_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let subdir = dir.path().join("a/b");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(resolve_from(None, None, &subdir), dir.path());
    }
}
