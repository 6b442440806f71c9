//! Config loading failures and validation findings.

use super::FieldPath;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no `{}` found here or in any parent directory", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML")]
    Parse(#[from] toml::de::Error),

    // not #[source]: the findings are the message
    #[error("{0}")]
    Invalid(ConfigDiagnostics),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found in one field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub severity: Severity,
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.as_str();
        match self.severity {
            Severity::Error => write!(f, "  {} {}: {}", "✗".red(), field.cyan(), self.message)?,
            Severity::Warning => write!(f, "  {} {}: {}", "!".yellow(), field.cyan(), self.message)?,
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n    {} {hint}", "hint:".dimmed())?;
        }
        Ok(())
    }
}

/// Findings of one validation run, reported together.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics(Vec<ConfigDiagnostic>);

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, field: FieldPath, message: String, hint: Option<String>) {
        self.0.push(ConfigDiagnostic {
            severity,
            field,
            message,
            hint,
        });
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(Severity::Error, field, message.into(), None);
    }

    pub fn error_with_hint(&mut self, field: FieldPath, message: impl Into<String>, hint: impl Into<String>) {
        self.push(Severity::Error, field, message.into(), Some(hint.into()));
    }

    /// Reported, but does not fail validation.
    pub fn warn(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(Severity::Warning, field, message.into(), None);
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConfigDiagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConfigDiagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.errors().count()
    }

    pub fn print_warnings(&self) {
        for warning in self.warnings() {
            crate::log!("warning"; "{}: {}", warning.field.as_str(), warning.message);
        }
    }

    /// `Err` with every finding when any of them is an error.
    pub fn into_result(self) -> Result<(), ConfigError> {
        if self.len() == 0 {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self))
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.len();
        let noun = if count == 1 { "error" } else { "errors" };
        write!(f, "{}", format!("invalid config ({count} {noun}):").red().bold())?;
        for diagnostic in self.errors() {
            write!(f, "\n{diagnostic}")?;
        }
        Ok(())
    }
}
