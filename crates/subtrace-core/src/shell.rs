//! Conservative detection of file deletions in shell command text.
//!
//! Recognises `rm`, `unlink` and `git rm` (without `--cached`) at the start
//! of a command segment. Arguments with globs, variable expansion, command
//! substitution or `~` are skipped rather than guessed at.

use std::path::Path;

/// A path argument of a recognised deletion command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionTarget {
    pub path: String,
    /// `-r` / `-R` / `--recursive` was given: everything below `path` goes too.
    pub recursive: bool,
}

/// Split a command string on `&&`, `||`, `|`, `;`, `&` and newlines,
/// respecting quotes and backslash escapes.
pub fn split_segments(cmd: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = cmd.chars().peekable();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    let mut flush = |current: &mut String| {
        let seg = current.trim();
        if !seg.is_empty() {
            segments.push(seg.to_string());
        }
        current.clear();
    };

    while let Some(ch) = chars.next() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }
        if ch == '\\' && !in_single_quote {
            escape_next = true;
            current.push(ch);
            continue;
        }
        if ch == '\'' && !in_double_quote {
            in_single_quote = !in_single_quote;
            current.push(ch);
            continue;
        }
        if ch == '"' && !in_single_quote {
            in_double_quote = !in_double_quote;
            current.push(ch);
            continue;
        }

        if !in_single_quote && !in_double_quote {
            match ch {
                '&' | '|' => {
                    // `2>&1` and `&>` are redirections, not separators
                    if ch == '&' && (current.ends_with('>') || chars.peek() == Some(&'>')) {
                        current.push(ch);
                        continue;
                    }
                    if chars.peek() == Some(&ch) {
                        chars.next();
                    }
                    flush(&mut current);
                    continue;
                }
                ';' | '\n' => {
                    flush(&mut current);
                    continue;
                }
                _ => {}
            }
        }
        current.push(ch);
    }
    flush(&mut current);
    segments
}

/// Paths removed by `command`, in the order they appear.
///
/// Once a segment changes directory (`cd`, `pushd`, `popd`), relative
/// operands of later segments are dropped: the caller resolves them against
/// the task's cwd, which no longer applies.
pub fn deletion_targets(command: &str) -> Vec<DeletionTarget> {
    let mut targets = Vec::new();
    let mut moved = false;
    for segment in split_segments(command) {
        let Some(words) = segment_words(&segment) else {
            continue;
        };
        let words = strip_sudo(&words);
        let Some(base_cmd) = words.first().map(|w| command_name(w)) else {
            continue;
        };
        if matches!(base_cmd, "cd" | "pushd" | "popd") {
            moved = true;
            continue;
        }
        targets.extend(
            segment_targets(base_cmd, words)
                .into_iter()
                .filter(|t| !moved || Path::new(&t.path).is_absolute()),
        );
    }
    targets
}

fn segment_words(segment: &str) -> Option<Vec<String>> {
    match shell_words::split(segment) {
        Ok(words) => Some(words),
        Err(e) => {
            tracing::debug!(segment, "skipping unparseable command segment: {e}");
            None
        }
    }
}

fn strip_sudo(words: &[String]) -> &[String] {
    match words.first().map(String::as_str) {
        Some("sudo") => &words[1..],
        _ => words,
    }
}

/// Base name of a command word; a leading subshell `(` is ignored.
fn command_name(word: &str) -> &str {
    let word = word.trim_start_matches('(');
    Path::new(word)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(word)
}

fn segment_targets(base_cmd: &str, words: &[String]) -> Vec<DeletionTarget> {
    let args = match base_cmd {
        "rm" | "unlink" => &words[1..],
        "git" if words.get(1).map(String::as_str) == Some("rm") => {
            if words.iter().any(|w| w == "--cached") {
                return Vec::new();
            }
            &words[2..]
        }
        _ => return Vec::new(),
    };

    let recursive = args.iter().any(|a| is_recursive_flag(a));
    path_arguments(args)
        .into_iter()
        .map(|path| DeletionTarget { path, recursive })
        .collect()
}

fn is_recursive_flag(arg: &str) -> bool {
    if arg == "--recursive" {
        return true;
    }
    arg.starts_with('-') && !arg.starts_with("--") && (arg.contains('r') || arg.contains('R'))
}

fn is_redirect(arg: &str) -> bool {
    arg.contains('>') || arg.contains('<')
}

/// Operand words of a deletion command: flags, redirections and anything
/// the shell would expand are dropped.
fn path_arguments(args: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    let mut options_done = false;
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if !options_done {
            if arg == "--" {
                options_done = true;
                continue;
            }
            if arg.starts_with('-') && arg.len() > 1 {
                continue;
            }
        }
        if is_redirect(arg) {
            // a bare operator (`>`, `2>`) takes the next word as its target
            skip_next = arg.trim_start_matches(|c: char| c.is_ascii_digit() || c == '&')
                .trim_end_matches('>')
                .trim_end_matches('<')
                .is_empty();
            continue;
        }
        if arg.is_empty() || is_expanded(arg) {
            continue;
        }
        out.push(arg.clone());
    }
    out
}

fn is_expanded(arg: &str) -> bool {
    arg.starts_with('~') || arg.chars().any(|c| matches!(c, '*' | '?' | '[' | '$' | '`' | '{'))
}
