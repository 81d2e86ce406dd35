use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod balances;
mod categories;
mod credit_cards;
mod invoices;
mod movements;
mod resolver;
mod store;
mod transfers;
mod wallets;

pub use balances::{InvoiceAudit, WalletAudit};
pub use resolver::{MovementTarget, ResolvedMovement};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// The transaction is the unit of work of one top-level operation: helpers
/// receive `&DatabaseTransaction` and never commit. The body runs in its own
/// async block, so `return` and `?` inside it leave the block, not the
/// caller, and the outcome always goes through commit or rollback.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: $crate::ResultEngine<_> = async { $body }.await;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The ledger engine.
///
/// Every public mutation runs in its own database transaction: either all of
/// its writes (movements, series, wallet balances, invoice amounts, card
/// limits) are committed, or none is.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
