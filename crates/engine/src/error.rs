//! The module contains the errors the engine can throw.
//!
//! Every error aborts the running operation and rolls back its database
//! transaction, so state is left untouched on failure. The variants name the
//! rule that blocked the operation:
//!
//! - [`DuplicateCode`] a client or material code is already taken.
//! - [`InvalidReference`] an unknown client or material was referenced.
//! - [`PolicyViolation`] a business rule rejected the operation.
//! - [`InvoiceNumberConflict`] a manual invoice number belongs to another client.
//! - [`NotFound`] an entity looked up by id does not exist.
//!
//!  [`DuplicateCode`]: EngineError::DuplicateCode
//!  [`InvalidReference`]: EngineError::InvalidReference
//!  [`PolicyViolation`]: EngineError::PolicyViolation
//!  [`InvoiceNumberConflict`]: EngineError::InvoiceNumberConflict
//!  [`NotFound`]: EngineError::NotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" code already in use!")]
    DuplicateCode(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Policy violation: {0}")]
    PolicyViolation(String),
    #[error("Invoice number \"{0}\" belongs to another client")]
    InvoiceNumberConflict(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DuplicateCode(a), Self::DuplicateCode(b)) => a == b,
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::PolicyViolation(a), Self::PolicyViolation(b)) => a == b,
            (Self::InvoiceNumberConflict(a), Self::InvoiceNumberConflict(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
