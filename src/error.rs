use thiserror::Error;

pub(crate) type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub(crate) enum CoreError {
    #[error("{kind} not found with id: {id}")]
    NotFound { kind: &'static str, id: i64 },
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl CoreError {
    pub(crate) fn not_found(kind: &'static str, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    #[cfg(test)]
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
