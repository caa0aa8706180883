use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum IoError {
    /// File read/write failure.
    Io { path: PathBuf, message: String },
    /// Malformed XML.
    Xml(String),
    /// Required attribute absent on an element.
    MissingAttribute { element: String, attribute: String },
    /// Attribute present but unparseable (bad time, bad count).
    InvalidAttribute { element: String, attribute: String, value: String },
    /// Log file name lacks the year/month/day digit groups.
    FileName(String),
    /// JSON serialization error.
    Json(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Xml(msg) => write!(f, "XML error: {msg}"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "<{element}> is missing attribute '{attribute}'")
            }
            Self::InvalidAttribute { element, attribute, value } => {
                write!(f, "<{element}> attribute '{attribute}' has invalid value '{value}'")
            }
            Self::FileName(name) => write!(
                f,
                "cannot read year/month/day from log file name '{name}'"
            ),
            Self::Json(msg) => write!(f, "JSON serialization error: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}
