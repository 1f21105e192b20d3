//! Shared error mapping for the Diesel adapters.

use tracing::debug;

use super::database::DbError;

/// Map database handle errors into a repository-specific connection error.
pub fn map_db_error<E, C>(error: DbError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        DbError::Open { message } | DbError::Migration { message } | DbError::Task { message } => {
            message
        }
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// `NotFound`, query-builder and constraint failures map to query errors;
/// a closed connection maps to a connection error.
pub fn map_basic_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            %error,
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            query("foreign key violation")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

