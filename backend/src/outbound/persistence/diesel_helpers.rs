//! Shared error classification for the Diesel adapters.
//!
//! Each adapter turns a [`DbFailure`] into its own port error. Constraint
//! violations are classified by constraint name so adapters can report
//! duplicates and dangling references precisely.

use diesel::IntoSql as _;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Bool;
use tracing::{debug, warn};

use crate::domain::PeriodWindow;

use super::pool::PoolError;
use super::schema::strokes;

/// Storage failure, stripped of driver types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DbFailure {
    /// The connection was refused, dropped or could not be checked out.
    Connection(String),
    /// A unique index rejected the write.
    Unique { constraint: Option<String> },
    /// A foreign key rejected the write.
    ForeignKey { constraint: Option<String> },
    /// Any other failure.
    Query(String),
}

impl DbFailure {
    /// Whether this is a unique violation on `constraint`.
    pub(crate) fn is_unique_on(&self, constraint: &str) -> bool {
        matches!(self, Self::Unique { constraint: Some(name) } if name == constraint)
    }

    /// Whether this is a foreign key violation on `constraint`.
    pub(crate) fn is_foreign_key_on(&self, constraint: &str) -> bool {
        matches!(self, Self::ForeignKey { constraint: Some(name) } if name == constraint)
    }

    /// Fold the failure into a port error using connection/query
    /// constructors. Constraint violations that reach this point were not
    /// expected by the adapter and are logged.
    pub(crate) fn into_port_error<E>(
        self,
        connection: impl FnOnce(String) -> E,
        query: impl FnOnce(String) -> E,
    ) -> E {
        match self {
            Self::Connection(message) => connection(message),
            Self::Query(message) => query(message),
            Self::Unique { constraint } | Self::ForeignKey { constraint } => {
                warn!(?constraint, "unexpected constraint violation");
                query(format!(
                    "constraint violation: {}",
                    constraint.as_deref().unwrap_or("unknown")
                ))
            }
        }
    }
}

impl From<PoolError> for DbFailure {
    fn from(error: PoolError) -> Self {
        Self::Connection(error.message().to_owned())
    }
}

impl From<DieselError> for DbFailure {
    fn from(error: DieselError) -> Self {
        match &error {
            DieselError::DatabaseError(kind, info) => {
                debug!(?kind, message = info.message(), "diesel operation failed");
            }
            _ => debug!(
                error_type = %std::any::type_name_of_val(&error),
                "diesel operation failed"
            ),
        }

        match error {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => Self::Unique {
                constraint: info.constraint_name().map(str::to_owned),
            },
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::ForeignKey {
                    constraint: info.constraint_name().map(str::to_owned),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                Self::Connection("database connection error".to_owned())
            }
            DieselError::NotFound => Self::Query("record not found".to_owned()),
            DieselError::QueryBuilderError(_) => Self::Query("database query error".to_owned()),
            _ => Self::Query("database error".to_owned()),
        }
    }
}

/// Error type threaded through transactions: either a storage failure or a
/// port-level refusal decided inside the transaction.
#[derive(Debug)]
pub(crate) enum TxError<E> {
    Db(DbFailure),
    Refused(E),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(error: DieselError) -> Self {
        Self::Db(DbFailure::from(error))
    }
}

impl<E> TxError<E> {
    /// Resolve into the port error, mapping storage failures with `map`.
    pub(crate) fn resolve(self, map: impl FnOnce(DbFailure) -> E) -> E {
        match self {
            Self::Db(failure) => map(failure),
            Self::Refused(error) => error,
        }
    }
}

/// Convert a count returned by Postgres into the unsigned domain type.
pub(crate) fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Convert an affected-row count into the unsigned domain type.
pub(crate) fn affected_to_u64(affected: usize) -> u64 {
    u64::try_from(affected).unwrap_or(u64::MAX)
}

/// Boxed predicate over the strokes table.
pub(crate) type StrokePredicate = Box<dyn BoxableExpression<strokes::table, Pg, SqlType = Bool>>;

/// Restrict strokes to `[start, end_exclusive)`; `None` admits every stroke.
pub(crate) fn stroke_window(window: Option<PeriodWindow>) -> StrokePredicate {
    match window {
        Some(window) => Box::new(
            strokes::created_at
                .ge(window.start)
                .and(strokes::created_at.lt(window.end_exclusive)),
        ),
        None => Box::new(true.into_sql::<Bool>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_are_connection_failures() {
        let failure = DbFailure::from(PoolError::checkout("timed out"));
        assert_eq!(failure, DbFailure::Connection("timed out".to_owned()));
    }

    #[rstest]
    fn not_found_is_a_query_failure() {
        let failure = DbFailure::from(DieselError::NotFound);
        assert!(matches!(failure, DbFailure::Query(_)));
    }

    #[rstest]
    fn constraint_matching_is_by_name() {
        let failure = DbFailure::Unique {
            constraint: Some("rooms_name_key".to_owned()),
        };
        assert!(failure.is_unique_on("rooms_name_key"));
        assert!(!failure.is_unique_on("items_room_name_key"));
        assert!(!failure.is_foreign_key_on("rooms_name_key"));
    }

    #[rstest]
    fn unexpected_violations_become_query_errors() {
        let failure = DbFailure::ForeignKey { constraint: None };
        let mapped: String = failure.into_port_error(|m| format!("conn:{m}"), |m| format!("query:{m}"));
        assert_eq!(mapped, "query:constraint violation: unknown");
    }

    #[rstest]
    fn refusals_pass_through_transactions() {
        let error: TxError<&str> = TxError::Refused("last admin");
        assert_eq!(error.resolve(|_| "storage"), "last admin");
    }
}
