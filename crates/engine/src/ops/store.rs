//! Storage access shared by every operation.
//!
//! All helpers run against the caller's transaction and are scoped to one
//! owner: a row belonging to another user is reported as missing.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*,
};
use uuid::Uuid;

use crate::{
    CreditCard, EngineError, Invoice, MonthYear, Movement, PaymentType, RecurrentMovement,
    ResultEngine, SystemCategoryKind, Wallet, categories, credit_cards, invoices, movements,
    recurrents, sub_categories, util::parse_uuid, wallets,
};

use super::Engine;

fn into_movements(models: Vec<movements::Model>) -> ResultEngine<Vec<Movement>> {
    models.into_iter().map(Movement::try_from).collect()
}

impl Engine {
    // Movements

    pub(super) async fn find_movement(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        movement_id: Uuid,
    ) -> ResultEngine<Option<Movement>> {
        movements::Entity::find_by_id(movement_id.to_string())
            .filter(movements::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .map(Movement::try_from)
            .transpose()
    }

    pub(super) async fn require_movement(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        movement_id: Uuid,
    ) -> ResultEngine<Movement> {
        self.find_movement(db_tx, user_id, movement_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("movement {movement_id}")))
    }

    pub(super) async fn insert_movement(
        &self,
        db_tx: &DatabaseTransaction,
        movement: &Movement,
    ) -> ResultEngine<()> {
        if movements::Entity::find_by_id(movement.id.to_string())
            .one(db_tx)
            .await?
            .is_some()
        {
            return Err(EngineError::Conflict(format!("movement {}", movement.id)));
        }
        movements::ActiveModel::from(movement).insert(db_tx).await?;
        Ok(())
    }

    pub(super) async fn update_movement(
        &self,
        db_tx: &DatabaseTransaction,
        movement: &Movement,
    ) -> ResultEngine<()> {
        movements::ActiveModel::from(movement).update(db_tx).await?;
        Ok(())
    }

    pub(super) async fn delete_movement(
        &self,
        db_tx: &DatabaseTransaction,
        movement_id: Uuid,
    ) -> ResultEngine<()> {
        movements::Entity::delete_by_id(movement_id.to_string())
            .exec(db_tx)
            .await?;
        Ok(())
    }

    pub(super) async fn movements_by_invoice_id(
        &self,
        db_tx: &DatabaseTransaction,
        invoice_id: Uuid,
    ) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .filter(movements::Column::InvoiceId.eq(invoice_id.to_string()))
            .order_by_asc(movements::Column::Date)
            .all(db_tx)
            .await?;
        into_movements(models)
    }

    pub(super) async fn movements_by_pair_id(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        pair_id: Uuid,
    ) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .filter(movements::Column::UserId.eq(user_id))
            .filter(movements::Column::PairId.eq(pair_id.to_string()))
            .all(db_tx)
            .await?;
        into_movements(models)
    }

    /// Installments of a group numbered `from_number` or later, in order.
    pub(super) async fn installments_from_number(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        group_id: Uuid,
        from_number: i32,
    ) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .filter(movements::Column::UserId.eq(user_id))
            .filter(movements::Column::InstallmentGroupId.eq(group_id.to_string()))
            .filter(movements::Column::InstallmentNumber.gte(from_number))
            .order_by_asc(movements::Column::InstallmentNumber)
            .all(db_tx)
            .await?;
        into_movements(models)
    }

    /// The movement `invoice_id` carried into the next cycle when it was
    /// partially paid.
    pub(super) async fn remainder_of_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        invoice_id: Uuid,
    ) -> ResultEngine<Option<Movement>> {
        movements::Entity::find()
            .filter(movements::Column::RemainderOfInvoiceId.eq(invoice_id.to_string()))
            .one(db_tx)
            .await?
            .map(Movement::try_from)
            .transpose()
    }

    /// Materialized instances of a series dated on or after `from`.
    pub(super) async fn series_instances_from(
        &self,
        db_tx: &DatabaseTransaction,
        recurrent_id: Uuid,
        from: NaiveDate,
    ) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .filter(movements::Column::RecurrentId.eq(recurrent_id.to_string()))
            .filter(movements::Column::Date.gte(from))
            .all(db_tx)
            .await?;
        into_movements(models)
    }

    pub(super) async fn paid_movements_of_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<Vec<Movement>> {
        let models = movements::Entity::find()
            .filter(movements::Column::WalletId.eq(wallet_id.to_string()))
            .filter(movements::Column::IsPaid.eq(true))
            .all(db_tx)
            .await?;
        into_movements(models)
    }

    // Recurrent movements

    pub(super) async fn find_recurrent(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        recurrent_id: Uuid,
    ) -> ResultEngine<Option<RecurrentMovement>> {
        recurrents::Entity::find_by_id(recurrent_id.to_string())
            .filter(recurrents::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .map(RecurrentMovement::try_from)
            .transpose()
    }

    pub(super) async fn recurrents_of_user(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<RecurrentMovement>> {
        recurrents::Entity::find()
            .filter(recurrents::Column::UserId.eq(user_id))
            .order_by_asc(recurrents::Column::InitialDate)
            .all(db_tx)
            .await?
            .into_iter()
            .map(RecurrentMovement::try_from)
            .collect()
    }

    pub(super) async fn insert_recurrent(
        &self,
        db_tx: &DatabaseTransaction,
        series: &RecurrentMovement,
    ) -> ResultEngine<()> {
        recurrents::ActiveModel::from(series).insert(db_tx).await?;
        Ok(())
    }

    pub(super) async fn update_recurrent(
        &self,
        db_tx: &DatabaseTransaction,
        series: &RecurrentMovement,
    ) -> ResultEngine<()> {
        recurrents::ActiveModel::from(series).update(db_tx).await?;
        Ok(())
    }

    // Wallets

    pub(super) async fn require_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        wallet_id: Uuid,
    ) -> ResultEngine<Wallet> {
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .filter(wallets::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("wallet {wallet_id}")))?;
        Wallet::try_from(model)
    }

    /// Persists the new absolute balance of a wallet.
    pub(super) async fn update_wallet_balance(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
        balance: i64,
    ) -> ResultEngine<()> {
        let wallet_model = wallets::ActiveModel {
            id: ActiveValue::Set(wallet_id.to_string()),
            balance: ActiveValue::Set(balance),
            ..Default::default()
        };
        wallet_model.update(db_tx).await?;
        Ok(())
    }

    // Invoices

    pub(super) async fn find_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        invoice_id: Uuid,
    ) -> ResultEngine<Option<Invoice>> {
        invoices::Entity::find_by_id(invoice_id.to_string())
            .filter(invoices::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .map(Invoice::try_from)
            .transpose()
    }

    pub(super) async fn require_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        invoice_id: Uuid,
    ) -> ResultEngine<Invoice> {
        self.find_invoice(db_tx, user_id, invoice_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("invoice {invoice_id}")))
    }

    pub(super) async fn find_invoice_by_month(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        credit_card_id: Uuid,
        month: MonthYear,
    ) -> ResultEngine<Option<Invoice>> {
        invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::CreditCardId.eq(credit_card_id.to_string()))
            .filter(invoices::Column::MonthIndex.eq(month.index()))
            .one(db_tx)
            .await?
            .map(Invoice::try_from)
            .transpose()
    }

    pub(super) async fn open_invoices_by_credit_card(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        credit_card_id: Uuid,
    ) -> ResultEngine<Vec<Invoice>> {
        invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::CreditCardId.eq(credit_card_id.to_string()))
            .filter(invoices::Column::IsPaid.eq(false))
            .order_by_asc(invoices::Column::MonthIndex)
            .all(db_tx)
            .await?
            .into_iter()
            .map(Invoice::try_from)
            .collect()
    }

    pub(super) async fn insert_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        invoice: &Invoice,
    ) -> ResultEngine<()> {
        invoices::ActiveModel::from(invoice).insert(db_tx).await?;
        Ok(())
    }

    /// Adds `delta_minor` to the running amount of an open invoice.
    pub(super) async fn add_to_invoice_amount(
        &self,
        db_tx: &DatabaseTransaction,
        invoice: &Invoice,
        delta_minor: i64,
    ) -> ResultEngine<i64> {
        if invoice.is_paid {
            return Err(EngineError::InvoiceCannotModify(invoice.id.to_string()));
        }
        let amount = invoice.amount + delta_minor;
        let invoice_model = invoices::ActiveModel {
            id: ActiveValue::Set(invoice.id.to_string()),
            amount: ActiveValue::Set(amount),
            ..Default::default()
        };
        invoice_model.update(db_tx).await?;
        Ok(amount)
    }

    /// Persists paid flag, payment date and wallet of an invoice.
    pub(super) async fn update_invoice_status(
        &self,
        db_tx: &DatabaseTransaction,
        invoice: &Invoice,
    ) -> ResultEngine<()> {
        let invoice_model = invoices::ActiveModel {
            id: ActiveValue::Set(invoice.id.to_string()),
            is_paid: ActiveValue::Set(invoice.is_paid),
            payment_date: ActiveValue::Set(invoice.payment_date),
            wallet_id: ActiveValue::Set(invoice.wallet_id.map(|id| id.to_string())),
            ..Default::default()
        };
        invoice_model.update(db_tx).await?;
        Ok(())
    }

    // Credit cards

    pub(super) async fn require_credit_card(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        credit_card_id: Uuid,
    ) -> ResultEngine<CreditCard> {
        let model = credit_cards::Entity::find_by_id(credit_card_id.to_string())
            .filter(credit_cards::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("credit card {credit_card_id}")))?;
        CreditCard::try_from(model)
    }

    /// Moves the available limit of a card by `delta_minor`.
    ///
    /// With `enforce`, a delta that would bring the limit below zero fails
    /// with `CreditLimitInsufficient`.
    pub(super) async fn update_limit_delta(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        credit_card_id: Uuid,
        delta_minor: i64,
        enforce: bool,
    ) -> ResultEngine<()> {
        if delta_minor == 0 {
            return Ok(());
        }
        let card = self
            .require_credit_card(db_tx, user_id, credit_card_id)
            .await?;
        if enforce && delta_minor < 0 && !card.has_sufficient_limit(delta_minor) {
            return Err(EngineError::CreditLimitInsufficient(format!(
                "card '{}' has {} available, {} required",
                card.name,
                card.credit_limit,
                delta_minor.abs()
            )));
        }
        let card_model = credit_cards::ActiveModel {
            id: ActiveValue::Set(card.id.to_string()),
            credit_limit: ActiveValue::Set(card.credit_limit + delta_minor),
            ..Default::default()
        };
        card_model.update(db_tx).await?;
        Ok(())
    }

    // Categories

    pub(super) async fn require_category(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::UserId.eq(user_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("category {category_id}")))
    }

    pub(super) async fn is_sub_category_of(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        sub_category_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<bool> {
        Ok(sub_categories::Entity::find_by_id(sub_category_id.to_string())
            .filter(sub_categories::Column::UserId.eq(user_id))
            .filter(sub_categories::Column::CategoryId.eq(category_id.to_string()))
            .one(db_tx)
            .await?
            .is_some())
    }

    /// Returns the system category of `kind`, creating it on first use.
    pub(super) async fn system_category_id(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        kind: SystemCategoryKind,
    ) -> ResultEngine<Uuid> {
        if let Some(model) = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::SystemKind.eq(kind.as_str()))
            .one(db_tx)
            .await?
        {
            return parse_uuid(&model.id, "category");
        }

        let id = Uuid::new_v4();
        let category_model = categories::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            name: ActiveValue::Set(kind.display_name().to_string()),
            system_kind: ActiveValue::Set(Some(kind.as_str().to_string())),
        };
        category_model.insert(db_tx).await?;
        tracing::debug!("created system category {} for {user_id}", kind.as_str());
        Ok(id)
    }

    /// Payment movement created when `invoice_id` was settled.
    pub(super) async fn payment_movement_of_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        invoice_id: Uuid,
    ) -> ResultEngine<Option<Movement>> {
        movements::Entity::find()
            .filter(movements::Column::InvoiceId.eq(invoice_id.to_string()))
            .filter(movements::Column::PaymentType.eq(PaymentType::InvoicePayment.as_str()))
            .one(db_tx)
            .await?
            .map(Movement::try_from)
            .transpose()
    }
}
