use domain::StoreError;
use thiserror::Error;

/// Bootstrap gave up on reaching the database.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {source}")]
pub struct RetriesExhausted {
    pub attempts: u32,
    #[source]
    pub source: sqlx::Error,
}

/// Returns a mapper from `sqlx::Error` to [`StoreError`].
///
/// Unique violations become [`StoreError::Duplicate`] named after the
/// violated constraint; everything else is a backend failure with `context`.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return StoreError::Duplicate(db_err.constraint().unwrap_or("key").to_string());
        }
        StoreError::backend(context, err)
    }
}

/// Wraps a persisted value that no longer satisfies domain rules.
pub(crate) fn decode_error(what: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Decode(format!("{what}: {err}"))
}
