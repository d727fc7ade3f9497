use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Category '{0}' is not allowed")]
    CategoryNotAllowed(String),
}
