use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuddyError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid argument '{argument}' = '{value}': {reason}")]
    InvalidArgument {
        argument: String,
        value: String,
        reason: String,
    },

    #[error("Member not found: {id}")]
    MemberNotFound { id: String },

    #[error("Internal invariant violated: {message}")]
    InvariantViolation { message: String },
}

pub type Result<T> = std::result::Result<T, BuddyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Membership,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for the binaries. `Low` still counts as success.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl BuddyError {
    pub fn invalid_argument(argument: &str, value: &str, reason: impl Into<String>) -> Self {
        BuddyError::InvalidArgument {
            argument: argument.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        BuddyError::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BuddyError::IoError(_) => ErrorCategory::Io,
            BuddyError::CsvError(_) | BuddyError::SerializationError(_) => ErrorCategory::Data,
            BuddyError::ConfigError { .. }
            | BuddyError::ConfigValidationError { .. }
            | BuddyError::InvalidConfigValueError { .. }
            | BuddyError::MissingConfigError { .. }
            | BuddyError::InvalidArgument { .. } => ErrorCategory::Configuration,
            BuddyError::MemberNotFound { .. } => ErrorCategory::Membership,
            BuddyError::InvariantViolation { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 檔案暫時無法讀寫，重試可能成功
            BuddyError::IoError(_) => ErrorSeverity::Medium,
            BuddyError::CsvError(_)
            | BuddyError::SerializationError(_)
            | BuddyError::ConfigError { .. }
            | BuddyError::ConfigValidationError { .. }
            | BuddyError::InvalidConfigValueError { .. }
            | BuddyError::MissingConfigError { .. }
            | BuddyError::InvalidArgument { .. }
            | BuddyError::MemberNotFound { .. } => ErrorSeverity::High,
            // 分組與名冊不同步，屬於程式錯誤
            BuddyError::InvariantViolation { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BuddyError::IoError(_) => {
                "Check that the input file exists and the output directory is writable".to_string()
            }
            BuddyError::CsvError(_) => {
                "Make sure the CSV roster has a header row: name,email,capacity,role,match,prev_match"
                    .to_string()
            }
            BuddyError::SerializationError(_) => {
                "Make sure the roster is a JSON array of member objects with name and email"
                    .to_string()
            }
            BuddyError::ConfigError { .. }
            | BuddyError::ConfigValidationError { .. }
            | BuddyError::InvalidConfigValueError { .. }
            | BuddyError::MissingConfigError { .. } => {
                "Review the configuration file or command line flags".to_string()
            }
            BuddyError::InvalidArgument { argument, .. } => match argument.as_str() {
                "input_format" => "Use one of the supported input formats: json, csv".to_string(),
                "output_format" => "Use one of the supported output formats: json, txt".to_string(),
                _ => format!("Check the value passed for '{}'", argument),
            },
            BuddyError::MemberNotFound { .. } => {
                "Re-import the roster so every paired identifier is registered".to_string()
            }
            BuddyError::InvariantViolation { .. } => {
                "This is a bug in the pairing engine; please report it with the input roster"
                    .to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BuddyError::IoError(e) => format!("Could not access a file: {}", e),
            BuddyError::CsvError(e) => format!("The CSV roster could not be read: {}", e),
            BuddyError::SerializationError(e) => {
                format!("The JSON data could not be processed: {}", e)
            }
            BuddyError::ConfigError { message } => format!("Configuration problem: {}", message),
            BuddyError::ConfigValidationError { field, message } => {
                format!("Configuration field '{}' is invalid: {}", field, message)
            }
            BuddyError::InvalidConfigValueError { field, value, reason } => {
                format!("'{}' is not a valid value for {}: {}", value, field, reason)
            }
            BuddyError::MissingConfigError { field } => {
                format!("Configuration field '{}' is required", field)
            }
            BuddyError::InvalidArgument { argument, value, reason } => {
                format!("'{}' is not supported for {}: {}", value, argument, reason)
            }
            BuddyError::MemberNotFound { id } => format!("No member registered as '{}'", id),
            BuddyError::InvariantViolation { message } => {
                format!("Pairing aborted, the group state is inconsistent: {}", message)
            }
        }
    }
}
