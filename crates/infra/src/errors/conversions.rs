//! Conversions from external infrastructure errors into domain errors.

use aura_domain::AuraError;
use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AuraError);

impl From<InfraError> for AuraError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AuraError> for InfraError {
    fn from(value: AuraError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAuraError {
    fn into_aura(self) -> AuraError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → AuraError */
/* -------------------------------------------------------------------------- */

/// `SQLITE_CONSTRAINT_CHECK`
const CHECK_CONSTRAINT: i32 = 275;
/// `SQLITE_CONSTRAINT_FOREIGNKEY`
const FOREIGN_KEY_CONSTRAINT: i32 = 787;
/// `SQLITE_CONSTRAINT_UNIQUE`
const UNIQUE_CONSTRAINT: i32 = 2067;

impl IntoAuraError for SqlError {
    fn into_aura(self) -> AuraError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => AuraError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        AuraError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, CHECK_CONSTRAINT) => {
                        AuraError::Validation(format!("event violates a store constraint: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, UNIQUE_CONSTRAINT) => {
                        AuraError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, FOREIGN_KEY_CONSTRAINT) => {
                        AuraError::Database("foreign key constraint violation".into())
                    }
                    _ => AuraError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => AuraError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                AuraError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                AuraError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => AuraError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                AuraError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => AuraError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => AuraError::Database("invalid SQL query".into()),
            other => AuraError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_aura())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → AuraError */
/* -------------------------------------------------------------------------- */

impl IntoAuraError for PoolError {
    fn into_aura(self) -> AuraError {
        AuraError::Database(format!("connection pool error: {self}"))
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        Self(value.into_aura())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AuraError */
/* -------------------------------------------------------------------------- */

impl IntoAuraError for HttpError {
    fn into_aura(self) -> AuraError {
        if self.is_timeout() {
            return AuraError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AuraError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => AuraError::NotFound(message),
                429 => AuraError::Network(message),
                400..=499 => AuraError::External(message),
                _ => AuraError::Network(message),
            };
        }

        AuraError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_aura())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
