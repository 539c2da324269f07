//! Domain error types
//!
//! Only argument validation is decided here. Store failures are carried
//! verbatim so callers can inspect the original `DbErr`.

use std::fmt;

#[derive(Debug)]
pub enum DomainError {
    /// A required argument was absent
    InvalidArgument {
        name: &'static str,
        message: String,
    },
    /// Whatever the ORM or the database driver raised
    Database(sea_orm::DbErr),
}

impl DomainError {
    pub fn invalid_argument(name: &'static str, message: impl Into<String>) -> Self {
        DomainError::InvalidArgument {
            name,
            message: message.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, DomainError::InvalidArgument { .. })
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::InvalidArgument { name, message } => {
                write!(f, "Invalid argument '{}': {}", name, message)
            }
            DomainError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for DomainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DomainError::InvalidArgument { .. } => None,
            DomainError::Database(e) => Some(e),
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_argument_display() {
        let err = DomainError::invalid_argument("entity", "Entity can not be null");
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "Invalid argument 'entity': Entity can not be null"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_database_error_keeps_source() {
        let err: DomainError = sea_orm::DbErr::RecordNotUpdated.into();
        assert!(!err.is_invalid_argument());
        assert!(err.to_string().starts_with("Database error:"));
        assert!(matches!(
            err.source()
                .and_then(|s| s.downcast_ref::<sea_orm::DbErr>()),
            Some(sea_orm::DbErr::RecordNotUpdated)
        ));
    }
}
