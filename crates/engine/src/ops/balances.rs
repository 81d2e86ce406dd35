use std::collections::HashMap;

use sea_orm::{DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Movement, PaymentType, ResultEngine, Wallet};

use super::{Engine, with_tx};

/// Stored balance of a wallet compared with the one replayed from its paid
/// movements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WalletAudit {
    pub wallet_id: Uuid,
    pub stored: i64,
    pub computed: i64,
    /// `stored - computed`, 0 when consistent.
    pub drift: i64,
}

/// Stored amount of an invoice compared with the sum of its purchases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvoiceAudit {
    pub invoice_id: Uuid,
    pub stored: i64,
    pub computed: i64,
    pub drift: i64,
}

impl Engine {
    /// Applies signed wallet deltas, aggregated per wallet.
    ///
    /// A wallet whose net delta is negative must stay at or above zero,
    /// otherwise nothing is written and `WalletInsufficient` is returned.
    pub(super) async fn apply_wallet_changes(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        changes: &[(Uuid, i64)],
    ) -> ResultEngine<()> {
        let mut deltas: Vec<(Uuid, i64)> = Vec::new();
        for (wallet_id, delta_minor) in changes {
            match deltas.iter_mut().find(|(id, _)| id == wallet_id) {
                Some((_, total)) => *total += delta_minor,
                None => deltas.push((*wallet_id, *delta_minor)),
            }
        }

        let mut wallet_new_balances: HashMap<Uuid, i64> = HashMap::new();
        for (wallet_id, delta_minor) in deltas {
            if delta_minor == 0 {
                continue;
            }
            let mut wallet = self.require_wallet(db_tx, user_id, wallet_id).await?;
            if !wallet.can_afford(delta_minor) {
                return Err(insufficient(&wallet, delta_minor));
            }
            wallet.apply(delta_minor);
            wallet_new_balances.insert(wallet_id, wallet.balance);
        }

        for (wallet_id, new_balance) in wallet_new_balances {
            self.update_wallet_balance(db_tx, wallet_id, new_balance)
                .await?;
        }
        Ok(())
    }

    /// Moves wallet balances from the effect of `old` to the effect of `new`.
    ///
    /// Either side may be missing (insert, delete) or unpaid, in which case it
    /// contributes nothing.
    pub(super) async fn reconcile_wallets(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        old: Option<&Movement>,
        new: Option<&Movement>,
    ) -> ResultEngine<()> {
        let mut changes = Vec::with_capacity(2);
        if let Some((wallet_id, amount)) = old.and_then(Movement::wallet_effect) {
            changes.push((wallet_id, -amount));
        }
        if let Some((wallet_id, amount)) = new.and_then(Movement::wallet_effect) {
            changes.push((wallet_id, amount));
        }
        self.apply_wallet_changes(db_tx, user_id, &changes).await
    }

    async fn compute_wallet_audit(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        wallet_id: Uuid,
    ) -> ResultEngine<WalletAudit> {
        let wallet = self.require_wallet(db_tx, user_id, wallet_id).await?;
        let applied: i64 = self
            .paid_movements_of_wallet(db_tx, wallet_id)
            .await?
            .iter()
            .map(|movement| movement.amount)
            .sum();
        let computed = wallet.initial_balance + applied;
        Ok(WalletAudit {
            wallet_id,
            stored: wallet.balance,
            computed,
            drift: wallet.balance - computed,
        })
    }

    /// Compares the stored balance of a wallet with its initial balance plus
    /// every paid movement attached to it.
    pub async fn audit_wallet(&self, user_id: &str, wallet_id: Uuid) -> ResultEngine<WalletAudit> {
        with_tx!(self, |db_tx| {
            self.compute_wallet_audit(&db_tx, user_id, wallet_id).await
        })
    }

    /// Overwrites the stored balance with the replayed one.
    ///
    /// Returns the audit taken before the repair.
    pub async fn recalculate_wallet(
        &self,
        user_id: &str,
        wallet_id: Uuid,
    ) -> ResultEngine<WalletAudit> {
        with_tx!(self, |db_tx| {
            let audit = self.compute_wallet_audit(&db_tx, user_id, wallet_id).await?;
            if audit.drift != 0 {
                tracing::warn!(
                    "wallet {wallet_id} drifted by {}: stored {}, computed {}",
                    audit.drift,
                    audit.stored,
                    audit.computed
                );
                self.update_wallet_balance(&db_tx, wallet_id, audit.computed)
                    .await?;
            }
            Ok(audit)
        })
    }

    /// Compares the stored amount of an invoice with the sum of the movements
    /// billed on it, payments excluded.
    pub async fn audit_invoice(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> ResultEngine<InvoiceAudit> {
        with_tx!(self, |db_tx| {
            let invoice = self.require_invoice(&db_tx, user_id, invoice_id).await?;
            let computed: i64 = self
                .movements_by_invoice_id(&db_tx, invoice_id)
                .await?
                .iter()
                .filter(|movement| movement.payment_type != PaymentType::InvoicePayment)
                .map(|movement| movement.amount)
                .sum();
            let drift = invoice.amount - computed;
            if drift != 0 {
                tracing::warn!("invoice {invoice_id} drifted by {drift}");
            }
            Ok(InvoiceAudit {
                invoice_id,
                stored: invoice.amount,
                computed,
                drift,
            })
        })
    }
}

pub(super) fn insufficient(wallet: &Wallet, delta_minor: i64) -> EngineError {
    EngineError::WalletInsufficient(format!(
        "wallet '{}' has {} but {} is required",
        wallet.name,
        wallet.balance,
        delta_minor.abs()
    ))
}
