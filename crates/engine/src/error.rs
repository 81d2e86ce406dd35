//! The module contains the error the engine can throw.
//!
//! Every variant carries a human-readable context. Request layers should not
//! match on the message: [`EngineError::kind`] returns a stable
//! [`ErrorKind`] meant to be mapped to transport responses.
//!
//! Storage failures are wrapped in [`EngineError::Database`] and keep the
//! original [`DbErr`] as source.
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("\"{0}\" already present!")]
    Conflict(String),
    #[error("Insufficient wallet balance: {0}")]
    WalletInsufficient(String),
    #[error("Insufficient credit limit: {0}")]
    CreditLimitInsufficient(String),
    #[error("Invoice already paid: {0}")]
    InvoiceAlreadyPaid(String),
    #[error("Invoice not paid: {0}")]
    InvoiceNotPaid(String),
    #[error("Invoice cannot be modified: {0}")]
    InvoiceCannotModify(String),
    #[error("Invalid payment amount: {0}")]
    InvalidPaymentAmount(String),
    #[error("Credit card movement must not be paid: {0}")]
    CreditMovementShouldNotBePaid(String),
    #[error("Unsupported movement type: {0}")]
    UnsupportedMovementType(String),
    #[error("Recurrent credit card movements are not supported: {0}")]
    RecurrentCreditCardNotSupported(String),
    #[error("Origin and destination wallet must differ: {0}")]
    SameWalletTransfer(String),
    #[error("Invalid transfer amount: {0}")]
    InvalidTransferAmount(String),
    #[error("Date required: {0}")]
    DateRequired(String),
    #[error("Transfer pair mismatch: {0}")]
    TransferPairMismatch(String),
    #[error("Transfer pair not found: {0}")]
    TransferPairNotFound(String),
    #[error("Movement is not an internal transfer: {0}")]
    MovementNotInternalTransfer(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Stable classification of [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    WalletInsufficient,
    CreditLimitInsufficient,
    InvoiceAlreadyPaid,
    InvoiceNotPaid,
    InvoiceCannotModify,
    UnsupportedMovementType,
    RecurrentCreditCardNotSupported,
    SameWalletTransfer,
    InvalidTransferAmount,
    DateRequired,
    TransferPairMismatch,
    TransferPairNotFound,
    MovementNotInternalTransfer,
    Internal,
}

impl EngineError {
    /// Returns the stable kind of the error.
    ///
    /// Payment amount and paid credit movements are input problems, so they
    /// share [`ErrorKind::InvalidInput`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_)
            | Self::InvalidPaymentAmount(_)
            | Self::CreditMovementShouldNotBePaid(_) => ErrorKind::InvalidInput,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::WalletInsufficient(_) => ErrorKind::WalletInsufficient,
            Self::CreditLimitInsufficient(_) => ErrorKind::CreditLimitInsufficient,
            Self::InvoiceAlreadyPaid(_) => ErrorKind::InvoiceAlreadyPaid,
            Self::InvoiceNotPaid(_) => ErrorKind::InvoiceNotPaid,
            Self::InvoiceCannotModify(_) => ErrorKind::InvoiceCannotModify,
            Self::UnsupportedMovementType(_) => ErrorKind::UnsupportedMovementType,
            Self::RecurrentCreditCardNotSupported(_) => {
                ErrorKind::RecurrentCreditCardNotSupported
            }
            Self::SameWalletTransfer(_) => ErrorKind::SameWalletTransfer,
            Self::InvalidTransferAmount(_) => ErrorKind::InvalidTransferAmount,
            Self::DateRequired(_) => ErrorKind::DateRequired,
            Self::TransferPairMismatch(_) => ErrorKind::TransferPairMismatch,
            Self::TransferPairNotFound(_) => ErrorKind::TransferPairNotFound,
            Self::MovementNotInternalTransfer(_) => ErrorKind::MovementNotInternalTransfer,
            Self::Database(_) => ErrorKind::Internal,
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => self.kind() == other.kind() && self.to_string() == other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_errors_are_input_errors() {
        let err = EngineError::InvalidPaymentAmount("amount must not be 0".to_string());
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn database_errors_are_internal() {
        let err = EngineError::from(DbErr::Custom("boom".to_string()));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "Custom Error: boom");
    }
}
