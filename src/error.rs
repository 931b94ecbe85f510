use std::fmt;

/// A single wire value that does not match its field's encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub key: String,
    pub raw: String,
    pub reason: &'static str,
}

impl DecodeError {
    pub(crate) fn new(key: &str, raw: &str, reason: &'static str) -> Self {
        Self {
            key: key.to_string(),
            raw: raw.to_string(),
            reason,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot decode {}={:?}: {}", self.key, self.raw, self.reason)
    }
}

impl std::error::Error for DecodeError {}

/// The payload text is not a well-formed `key=value` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    NonAscii,
    MissingSeparator(String),
    EmptyKey(String),
    DuplicateKey(String),
    DelimiterInValue { key: String, value: String },
    DelimiterInKey(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::NonAscii => write!(f, "payload is not ASCII"),
            FormatError::MissingSeparator(pair) => write!(f, "pair without '=': {pair:?}"),
            FormatError::EmptyKey(pair) => write!(f, "pair with empty key: {pair:?}"),
            FormatError::DuplicateKey(key) => write!(f, "duplicate key: {key}"),
            FormatError::DelimiterInValue { key, value } => {
                write!(f, "value for {key} contains a delimiter: {value:?}")
            }
            FormatError::DelimiterInKey(key) => write!(f, "key contains a delimiter: {key:?}"),
        }
    }
}

impl std::error::Error for FormatError {}

/// A field that is missing, undecodable, or violates a domain rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Missing {
        field: &'static str,
        key: &'static str,
    },
    Invalid(DecodeError),
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    Resolution {
        field: &'static str,
        value: f64,
        step: f64,
    },
    /// A value outside the field's accepted set.
    Unsupported {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ValidationError {
    /// Field name the error refers to (the wire key for decode failures).
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Missing { field, .. } => field,
            ValidationError::Invalid(e) => &e.key,
            ValidationError::OutOfRange { field, .. } => field,
            ValidationError::Resolution { field, .. } => field,
            ValidationError::Unsupported { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Missing { field, key } => {
                write!(f, "required field missing: {field} ({key})")
            }
            ValidationError::Invalid(e) => write!(f, "{e}"),
            ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} out of range: {value:.1} not in {min:.1}..={max:.1}"),
            ValidationError::Resolution { field, value, step } => {
                write!(f, "{field} {value} is not a multiple of {step}")
            }
            ValidationError::Unsupported {
                field,
                value,
                reason,
            } => write!(f, "{field} cannot be {value:?}: {reason}"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<DecodeError> for ValidationError {
    fn from(e: DecodeError) -> Self {
        ValidationError::Invalid(e)
    }
}

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Status { path: String, status: u16 },
    EmptyResponse { path: String },
    Rejected { path: String, reason: String },
    Format(FormatError),
    Validation(Vec<ValidationError>),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Status { path, status } => write!(f, "{path} answered HTTP {status}"),
            Error::EmptyResponse { path } => write!(f, "empty response from {path}"),
            Error::Rejected { path, reason } => write!(f, "device rejected {path}: {reason}"),
            Error::Format(e) => write!(f, "malformed payload: {e}"),
            Error::Validation(errors) => {
                write!(f, "validation failed")?;
                for (i, e) in errors.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{sep}{e}")?;
                }
                Ok(())
            }
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Format(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<FormatError> for Error {
    fn from(e: FormatError) -> Self {
        Error::Format(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(vec![e])
    }
}

impl From<Vec<ValidationError>> for Error {
    fn from(errors: Vec<ValidationError>) -> Self {
        Error::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
