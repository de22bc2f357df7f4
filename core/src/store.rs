//! Flat-file roster: one `Name, Age, Profession[, Comment]` record per line.
//!
//! There is no escaping. The comment is everything after the third comma, so
//! it may itself contain commas. No locking either: two runs pointed at the
//! same file overwrite each other.

use anyhow::{Context, Result};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAX_COMMENT_WORDS: usize = 10;

pub const SAMPLE_RECORDS: &str = "Pepe Romero, 38, Bombero\nMaria Garcia, 29, Ingeniera";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected 'Name, Age, Profession[, Comment]', got '{0}'")]
    Malformed(String),
    #[error("age '{0}' is not a number")]
    NonNumericAge(String),
    #[error("comment has {0} words (max {max})", max = MAX_COMMENT_WORDS)]
    CommentTooLong(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub age: String,
    pub profession: String,
    pub comment: Option<String>,
}

impl Record {
    pub fn new(
        name: impl Into<String>,
        age: impl Into<String>,
        profession: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age: age.into(),
            profession: profession.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns `None` when the line has fewer than three fields.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.splitn(4, ',').map(str::trim);
        let name = fields.next().filter(|s| !s.is_empty())?;
        let age = fields.next()?;
        let profession = fields.next()?;
        let comment = fields
            .next()
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Some(Self {
            name: name.to_string(),
            age: age.to_string(),
            profession: profession.to_string(),
            comment,
        })
    }

    pub fn has_comment(&self) -> bool {
        self.comment.is_some()
    }

    pub fn age_years(&self) -> Option<u32> {
        self.age.parse().ok()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.age_years().is_none() {
            return Err(ValidationError::NonNumericAge(self.age.clone()));
        }

        if let Some(comment) = &self.comment {
            let words = comment.split_whitespace().count();
            if words > MAX_COMMENT_WORDS {
                return Err(ValidationError::CommentTooLong(words));
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}, {}", self.name, self.age, self.profession)?;
        if let Some(comment) = &self.comment {
            write!(f, ", {}", comment)?;
        }
        Ok(())
    }
}

/// Parses and validates one line in a single step.
pub fn validate_line(line: &str) -> Result<Record, ValidationError> {
    let record =
        Record::parse(line).ok_or_else(|| ValidationError::Malformed(line.trim().to_string()))?;
    record.validate()?;
    Ok(record)
}

#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn read_to_string(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }

    /// Lines of the file with trailing blank lines dropped.
    pub fn read_lines(&self) -> Result<Vec<String>> {
        let content = self.read_to_string()?;
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        Ok(lines)
    }

    pub fn read_records(&self) -> Result<Vec<Record>> {
        Ok(self
            .read_lines()?
            .iter()
            .filter_map(|line| Record::parse(line))
            .collect())
    }

    pub fn write_string(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    pub fn write_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<()> {
        let mut content = lines
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        self.write_string(&content)
    }

    pub fn write_records(&self, records: &[Record]) -> Result<()> {
        let lines: Vec<String> = records.iter().map(Record::to_string).collect();
        self.write_lines(&lines)
    }

    pub fn append_line(&self, line: &str) -> Result<()> {
        let needs_newline = self.exists()
            && self
                .read_to_string()
                .is_ok_and(|c| !c.is_empty() && !c.ends_with('\n'));

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        if needs_newline {
            writeln!(file)?;
        }
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to append to {}", self.path.display()))
    }

    /// Writes `default` when the file is missing. Returns whether it did.
    pub fn seed_if_missing(&self, default: &str) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.write_string(default)?;
        Ok(true)
    }
}
