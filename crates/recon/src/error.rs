use std::fmt;

use crate::model::Period;

#[derive(Debug)]
pub enum AuditError {
    /// Fewer than two non-empty lines (no header + data).
    EmptyOrMalformedFile,
    /// No header resolves to a mandatory column role.
    MissingRequiredColumn { role: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (negative threshold, etc.).
    ConfigValidation(String),
    /// A decoder failure attributed to one of the two input files.
    InPeriod { period: Period, source: Box<AuditError> },
}

impl AuditError {
    /// Attach the period whose file produced this error.
    pub fn in_period(self, period: Period) -> Self {
        Self::InPeriod { period, source: Box::new(self) }
    }

    /// The innermost error, with any period wrapper removed.
    pub fn root(&self) -> &AuditError {
        match self {
            Self::InPeriod { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyOrMalformedFile => {
                write!(f, "empty or malformed CSV file: need a header and at least one data line")
            }
            Self::MissingRequiredColumn { role } => {
                write!(f, "required column not found: {role}")
            }
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InPeriod { period, source } => write!(f, "{period} period file: {source}"),
        }
    }
}

impl std::error::Error for AuditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InPeriod { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
