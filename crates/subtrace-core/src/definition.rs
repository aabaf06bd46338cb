//! Agent definition files (`.claude/agents/<type>.md`) and the skills they
//! preload.

use crate::error::Result;
use crate::{io, paths};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A resolved agent definition.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub path: PathBuf,
    /// Skill names from the frontmatter, in declaration order.
    pub skills: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Frontmatter {
    #[serde(default)]
    skills: Option<SkillList>,
}

/// `skills:` may be a YAML list or a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillList {
    List(Vec<String>),
    Csv(String),
}

impl SkillList {
    fn into_names(self) -> Vec<String> {
        let raw = match self {
            SkillList::List(v) => v,
            SkillList::Csv(s) => s.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn extract_frontmatter(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    let rest = if let Some(r) = rest.strip_prefix('\n') {
        r
    } else if let Some(r) = rest.strip_prefix("\r\n") {
        r
    } else {
        return None;
    };
    let end = rest.find("\n---")?;
    Some(&rest[..end])
}

/// Parse a definition file's content. A file without frontmatter, or with
/// frontmatter that is not valid YAML, still yields a definition with no
/// skills.
pub fn parse(path: &Path, content: &str) -> AgentDefinition {
    let fm = match extract_frontmatter(content) {
        Some(yaml) => serde_yaml::from_str::<Frontmatter>(yaml).unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), "unreadable agent frontmatter: {e}");
            Frontmatter::default()
        }),
        None => Frontmatter::default(),
    };
    AgentDefinition {
        path: path.to_path_buf(),
        skills: fm.skills.map(SkillList::into_names).unwrap_or_default(),
    }
}

/// Candidate directories in lookup order: the task's working directory, then
/// the user's home.
fn bases<'a>(cwd: Option<&'a Path>, home: Option<&'a Path>) -> impl Iterator<Item = &'a Path> {
    cwd.into_iter().chain(home)
}

/// First existing definition file for `agent_type`.
pub fn locate(agent_type: &str, cwd: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    if paths::validate_name(agent_type).is_err() {
        tracing::debug!(agent_type, "not looking up definition for unsafe agent type");
        return None;
    }
    bases(cwd, home)
        .map(|base| paths::agent_definition_path(base, agent_type))
        .find(|p| p.is_file())
}

/// Locate and parse the definition for `agent_type`. `Ok(None)` when no
/// definition file exists.
pub fn load(agent_type: &str, cwd: Option<&Path>, home: Option<&Path>) -> Result<Option<AgentDefinition>> {
    let Some(path) = locate(agent_type, cwd, home) else {
        return Ok(None);
    };
    let Some(content) = io::read_if_exists(&path)? else {
        return Ok(None);
    };
    Ok(Some(parse(&path, &content)))
}

/// `SKILL.md` for `name`: the first existing of the project and home
/// locations, otherwise the project location. `None` for unsafe names or
/// when no base directory is known.
pub fn resolve_skill_file(name: &str, cwd: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    if paths::validate_name(name).is_err() {
        return None;
    }
    let candidates: Vec<PathBuf> = bases(cwd, home)
        .map(|base| paths::skill_file_path(base, name))
        .collect();
    candidates
        .iter()
        .find(|p| p.is_file())
        .or_else(|| candidates.first())
        .cloned()
}

/// The user's home directory, where global agents and skills live.
pub fn home_dir() -> Option<PathBuf> {
    home::home_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        io::atomic_write(path, content.as_bytes()).unwrap();
    }

    #[test]
    fn parses_skill_list() {
        let def = parse(
            Path::new("a.md"),
            "---\nname: reviewer\ndescription: Reviews code\nskills:\n  - testing\n  - lint\n---\nBody\n",
        );
        assert_eq!(def.skills, vec!["testing", "lint"]);
    }

    #[test]
    fn parses_comma_separated_skills() {
        let def = parse(Path::new("a.md"), "---\nskills: testing, lint ,\n---\n");
        assert_eq!(def.skills, vec!["testing", "lint"]);
    }

    #[test]
    fn no_frontmatter_means_no_skills() {
        let def = parse(Path::new("a.md"), "# Just markdown\n");
        assert!(def.skills.is_empty());
    }

    #[test]
    fn bad_yaml_frontmatter_is_tolerated() {
        let def = parse(Path::new("a.md"), "---\nskills: [unterminated\n---\n");
        assert!(def.skills.is_empty());
    }

    #[test]
    fn project_definition_wins_over_home() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        write(&paths::agent_definition_path(project.path(), "Explore"), "---\nskills: [a]\n---\n");
        write(&paths::agent_definition_path(home.path(), "Explore"), "---\nskills: [b]\n---\n");

        let def = load("Explore", Some(project.path()), Some(home.path()))
            .unwrap()
            .unwrap();
        assert_eq!(def.skills, vec!["a"]);
        assert!(def.path.starts_with(project.path()));
    }

    #[test]
    fn falls_back_to_home_definition() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        write(&paths::agent_definition_path(home.path(), "Explore"), "---\nskills: [b]\n---\n");

        let def = load("Explore", Some(project.path()), Some(home.path()))
            .unwrap()
            .unwrap();
        assert_eq!(def.skills, vec!["b"]);
    }

    #[test]
    fn missing_definition_is_none() {
        let project = TempDir::new().unwrap();
        assert!(load("Explore", Some(project.path()), None).unwrap().is_none());
    }

    #[test]
    fn unsafe_agent_type_is_not_looked_up() {
        let project = TempDir::new().unwrap();
        assert!(locate("../secrets", Some(project.path()), None).is_none());
    }

    #[test]
    fn skill_prefers_existing_home_file_over_missing_project_file() {
        let project = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        let home_skill = paths::skill_file_path(home.path(), "testing");
        write(&home_skill, "# testing\n");

        assert_eq!(
            resolve_skill_file("testing", Some(project.path()), Some(home.path())),
            Some(home_skill)
        );
        assert_eq!(
            resolve_skill_file("other", Some(project.path()), Some(home.path())),
            Some(paths::skill_file_path(project.path(), "other"))
        );
        assert!(resolve_skill_file("a/b", Some(project.path()), None).is_none());
        assert!(resolve_skill_file("testing", None, None).is_none());
    }
}
