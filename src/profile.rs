use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// A configuration line owned by envboot, paired with the comment that
/// marks it in the profile file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedLine {
    pub content: String,
    pub comment: String,
}

impl ManagedLine {
    pub fn new(content: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            comment: comment.into(),
        }
    }
}

/// Result of an idempotent edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Added,
    AlreadyPresent,
}

/// Ensure `line.content` is present in the file as a whole line.
///
/// Creates the file if it does not exist. When the content is absent the
/// edit appends a blank separator, the comment, and the content. Presence
/// is judged by exact full-line match: a line that merely contains the
/// content as a substring does not count, and a reformatted-but-equivalent
/// command is treated as distinct.
pub fn ensure_line(path: &Path, line: &ManagedLine) -> Result<EditOutcome> {
    let contents = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?
    } else {
        fs::write(path, "").with_context(|| format!("Failed to create {:?}", path))?;
        String::new()
    };

    if contents.lines().any(|existing| existing == line.content) {
        tracing::debug!(?path, content = %line.content, "line already present");
        return Ok(EditOutcome::AlreadyPresent);
    }

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {:?} for appending", path))?;

    write!(file, "\n{}\n{}\n", line.comment, line.content)
        .with_context(|| format!("Failed to write to {:?}", path))?;

    Ok(EditOutcome::Added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn managed() -> ManagedLine {
        ManagedLine::new(
            r#"export PATH="$HOME/.local/bin:$PATH""#,
            "# envboot: add user-local bin to PATH",
        )
    }

    #[test]
    fn test_creates_missing_file_and_appends() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");

        let outcome = ensure_line(&rc, &managed()).unwrap();
        assert_eq!(outcome, EditOutcome::Added);

        let contents = fs::read_to_string(&rc).unwrap();
        assert_eq!(
            contents,
            "\n# envboot: add user-local bin to PATH\nexport PATH=\"$HOME/.local/bin:$PATH\"\n"
        );
    }

    #[test]
    fn test_second_run_is_a_noop() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".zshrc");

        ensure_line(&rc, &managed()).unwrap();
        let after_first = fs::read_to_string(&rc).unwrap();

        let outcome = ensure_line(&rc, &managed()).unwrap();
        assert_eq!(outcome, EditOutcome::AlreadyPresent);
        assert_eq!(fs::read_to_string(&rc).unwrap(), after_first);
    }

    #[test]
    fn test_exactly_one_occurrence_after_repeated_runs() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");
        let line = managed();

        for _ in 0..3 {
            ensure_line(&rc, &line).unwrap();
        }

        let contents = fs::read_to_string(&rc).unwrap();
        let occurrences = contents
            .lines()
            .filter(|existing| *existing == line.content)
            .count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn test_preserves_existing_content() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");
        fs::write(&rc, "alias ll='ls -l'\n").unwrap();

        ensure_line(&rc, &managed()).unwrap();

        let contents = fs::read_to_string(&rc).unwrap();
        assert!(contents.starts_with("alias ll='ls -l'\n"));
        assert!(contents.contains("# envboot: add user-local bin to PATH"));
    }

    #[test]
    fn test_substring_match_does_not_count() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");
        let line = managed();

        // Line containing the content plus trailing text is not a match.
        fs::write(&rc, format!("{} # local tools\n", line.content)).unwrap();

        let outcome = ensure_line(&rc, &line).unwrap();
        assert_eq!(outcome, EditOutcome::Added);

        let contents = fs::read_to_string(&rc).unwrap();
        let exact = contents
            .lines()
            .filter(|existing| *existing == line.content)
            .count();
        assert_eq!(exact, 1);
    }

    #[test]
    fn test_differently_formatted_equivalents_accumulate() {
        // Acknowledged limitation: equivalent commands with different
        // formatting are distinct lines and both end up in the file.
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");

        let spaced = ManagedLine::new(
            r#"export PATH="$HOME/.local/bin:$PATH" "#,
            "# envboot: add user-local bin to PATH",
        );
        ensure_line(&rc, &managed()).unwrap();
        let outcome = ensure_line(&rc, &spaced).unwrap();
        assert_eq!(outcome, EditOutcome::Added);
    }
}
