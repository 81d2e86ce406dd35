//! Personal ledger engine.
//!
//! The engine keeps movements, recurring series, credit card invoices and
//! wallet transfers consistent with each other:
//!
//! - wallet balances move by the signed amount of every paid movement;
//! - credit card purchases accumulate on the invoice of their billing cycle
//!   and consume the card limit;
//! - editing "this" or "this and the following" instances of a recurring
//!   series splits the series around the edited month.
//!
//! Every public operation of [`Engine`] runs inside one database transaction
//! and leaves no partial writes behind on error.

pub use commands::{MovementPatch, NewMovement, PayInvoiceCmd, TransferCmd, UpdateTransferCmd};
pub use categories::SystemCategoryKind;
pub use credit_cards::{BillingCycle, CreditCard};
pub use error::{EngineError, ErrorKind};
pub use invoices::Invoice;
pub use months::MonthYear;
pub use movements::{CreditCardInfo, Movement, PaymentType};
pub use ops::{
    Engine, EngineBuilder, InvoiceAudit, MovementTarget, ResolvedMovement, WalletAudit,
};
pub use recurrents::{RecurrentMovement, split as split_series};
pub use wallets::Wallet;

mod categories;
mod commands;
mod credit_cards;
mod error;
mod invoices;
pub mod months;
mod movements;
mod ops;
mod recurrents;
mod sub_categories;
mod util;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
