use chrono::{Days, NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{
    CreditCard, CreditCardInfo, EngineError, Invoice, MonthYear, Movement, PayInvoiceCmd,
    PaymentType, ResultEngine, SystemCategoryKind,
};

use super::{Engine, with_tx};

impl Engine {
    /// Return an invoice snapshot from DB.
    pub async fn invoice(&self, user_id: &str, invoice_id: Uuid) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            self.require_invoice(&db_tx, user_id, invoice_id).await
        })
    }

    /// Return the invoice of `credit_card_id` closing in `month`, if any.
    pub async fn invoice_for_month(
        &self,
        user_id: &str,
        credit_card_id: Uuid,
        month: MonthYear,
    ) -> ResultEngine<Option<Invoice>> {
        with_tx!(self, |db_tx| {
            self.find_invoice_by_month(&db_tx, user_id, credit_card_id, month)
                .await
        })
    }

    /// Return the open invoices of a card, oldest first.
    pub async fn open_invoices(
        &self,
        user_id: &str,
        credit_card_id: Uuid,
    ) -> ResultEngine<Vec<Invoice>> {
        with_tx!(self, |db_tx| {
            self.require_credit_card(&db_tx, user_id, credit_card_id)
                .await?;
            self.open_invoices_by_credit_card(&db_tx, user_id, credit_card_id)
                .await
        })
    }

    /// Return the movements billed on (or paying) an invoice.
    pub async fn movements_by_invoice(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> ResultEngine<Vec<Movement>> {
        with_tx!(self, |db_tx| {
            self.require_invoice(&db_tx, user_id, invoice_id).await?;
            self.movements_by_invoice_id(&db_tx, invoice_id).await
        })
    }

    /// Returns the invoice a movement of `card` dated `date` is billed on.
    ///
    /// An explicit `invoice_id` wins when it exists for this card; otherwise
    /// the invoice of the cycle of `date` is looked up and created when
    /// missing.
    pub(super) async fn find_or_create_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        invoice_id: Option<Uuid>,
        card: &CreditCard,
        date: NaiveDate,
    ) -> ResultEngine<Invoice> {
        if let Some(invoice_id) = invoice_id
            && let Some(invoice) = self.find_invoice(db_tx, user_id, invoice_id).await?
            && invoice.credit_card_id == card.id
        {
            return Ok(invoice);
        }

        let cycle = card.cycle_for_date(date)?;
        if let Some(invoice) = self
            .find_invoice_by_month(db_tx, user_id, card.id, cycle.month)
            .await?
        {
            return Ok(invoice);
        }

        let invoice = Invoice::open(user_id.to_string(), card.id, &cycle);
        self.insert_invoice(db_tx, &invoice).await?;
        tracing::debug!(
            "opened invoice {} of card {} closing {}",
            invoice.id,
            card.id,
            invoice.period_end
        );
        Ok(invoice)
    }

    /// Adds `delta_minor` to an invoice a movement is billed on.
    ///
    /// Fails with `InvoiceAlreadyPaid` when the invoice is paid.
    pub(super) async fn adjust_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        invoice_id: Uuid,
        delta_minor: i64,
    ) -> ResultEngine<()> {
        if delta_minor == 0 {
            return Ok(());
        }
        let invoice = self.require_invoice(db_tx, user_id, invoice_id).await?;
        invoice.ensure_open()?;
        self.add_to_invoice_amount(db_tx, &invoice, delta_minor)
            .await?;
        Ok(())
    }

    /// Adds `delta_minor` to the amount of an open invoice.
    pub async fn update_invoice_amount(
        &self,
        user_id: &str,
        invoice_id: Uuid,
        delta_minor: i64,
    ) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            let invoice = self.require_invoice(&db_tx, user_id, invoice_id).await?;
            let amount = self
                .add_to_invoice_amount(&db_tx, &invoice, delta_minor)
                .await?;
            Ok(Invoice { amount, ..invoice })
        })
    }

    /// Pay an invoice, fully or partially, from a wallet.
    ///
    /// The paid part is debited from the wallet through an `invoice_payment`
    /// movement and given back to the card limit. An unpaid rest is carried
    /// into the next invoice as a credit card movement dated the day after
    /// the due date.
    pub async fn pay_invoice(&self, cmd: PayInvoiceCmd) -> ResultEngine<Invoice> {
        let user_id = cmd.user_id.as_str();
        with_tx!(self, |db_tx| {
            let mut invoice = self.require_invoice(&db_tx, user_id, cmd.invoice_id).await?;
            invoice.ensure_open()?;
            let paid = invoice.payable_amount(cmd.amount_minor)?;
            self.require_wallet(&db_tx, user_id, cmd.wallet_id).await?;
            let card = self
                .require_credit_card(&db_tx, user_id, invoice.credit_card_id)
                .await?;
            let category_id = self
                .system_category_id(&db_tx, user_id, SystemCategoryKind::InvoicePayment)
                .await?;
            let payment_date = cmd
                .payment_date
                .unwrap_or_else(|| Utc::now().date_naive());
            let now = Utc::now();

            let payment = Movement {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                description: format!("Invoice payment {} {}", card.name, invoice.period_end),
                amount: paid,
                date: payment_date,
                is_paid: true,
                is_recurrent: false,
                recurrent_id: None,
                wallet_id: cmd.wallet_id,
                payment_type: PaymentType::InvoicePayment,
                category_id,
                sub_category_id: None,
                credit_card: Some(CreditCardInfo::new(card.id, invoice.id)),
                pair_id: None,
                remainder_of_invoice_id: None,
                created_at: now,
                updated_at: now,
            };
            self.insert_movement(&db_tx, &payment).await?;
            self.reconcile_wallets(&db_tx, user_id, None, Some(&payment))
                .await?;

            invoice.is_paid = true;
            invoice.payment_date = Some(payment_date);
            invoice.wallet_id = Some(cmd.wallet_id);
            self.update_invoice_status(&db_tx, &invoice).await?;
            self.update_limit_delta(&db_tx, user_id, card.id, -paid, false)
                .await?;

            let rest = invoice.amount - paid;
            if rest < 0 {
                let date = invoice
                    .due_date
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| EngineError::InvalidInput("date out of range".to_string()))?;
                let next = self
                    .find_or_create_invoice(&db_tx, user_id, None, &card, date)
                    .await?;
                next.ensure_open()?;
                let remainder = Movement {
                    id: Uuid::new_v4(),
                    description: format!("Remainder of invoice {} {}", card.name, invoice.period_end),
                    amount: rest,
                    date,
                    is_paid: false,
                    payment_type: PaymentType::CreditCard,
                    credit_card: Some(CreditCardInfo::new(card.id, next.id)),
                    remainder_of_invoice_id: Some(invoice.id),
                    ..payment.clone()
                };
                self.insert_movement(&db_tx, &remainder).await?;
                self.add_to_invoice_amount(&db_tx, &next, rest).await?;
                tracing::debug!("carried {rest} of invoice {} into {}", invoice.id, next.id);
            }

            tracing::info!(
                "paid {} of invoice {} for {user_id}",
                paid.abs(),
                invoice.id
            );
            Ok(invoice)
        })
    }

    /// Undo the payment of an invoice.
    ///
    /// The wallet is credited back, the invoice reopened, the card limit
    /// consumed again and a carried remainder removed from the next invoice.
    pub async fn revert_payment(&self, user_id: &str, invoice_id: Uuid) -> ResultEngine<Invoice> {
        with_tx!(self, |db_tx| {
            let mut invoice = self.require_invoice(&db_tx, user_id, invoice_id).await?;
            if !invoice.is_paid {
                return Err(EngineError::InvoiceNotPaid(invoice_id.to_string()));
            }
            let payment = self
                .payment_movement_of_invoice(&db_tx, invoice_id)
                .await?
                .ok_or_else(|| {
                    EngineError::NotFound(format!("payment movement of invoice {invoice_id}"))
                })?;

            if let Some(remainder) = self.remainder_of_invoice(&db_tx, invoice_id).await? {
                let next_id = remainder.invoice_id().ok_or_else(|| {
                    EngineError::NotFound(format!("invoice of remainder {}", remainder.id))
                })?;
                self.adjust_invoice(&db_tx, user_id, next_id, -remainder.amount)
                    .await?;
                self.delete_movement(&db_tx, remainder.id).await?;
            }

            self.reconcile_wallets(&db_tx, user_id, Some(&payment), None)
                .await?;
            self.delete_movement(&db_tx, payment.id).await?;
            self.update_limit_delta(&db_tx, user_id, invoice.credit_card_id, payment.amount, false)
                .await?;

            invoice.is_paid = false;
            invoice.payment_date = None;
            invoice.wallet_id = None;
            self.update_invoice_status(&db_tx, &invoice).await?;

            tracing::info!("reverted payment of invoice {invoice_id} for {user_id}");
            Ok(invoice)
        })
    }
}
