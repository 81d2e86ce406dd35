//! Transfers between two wallets of the same user.
//!
//! A transfer is stored as two `internal_transfer` movements sharing a
//! `pair_id`: the origin leg carries `-amount`, the destination leg
//! `+amount`.

use chrono::{NaiveDate, Utc};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    EngineError, Movement, PaymentType, ResultEngine, SystemCategoryKind, TransferCmd,
    UpdateTransferCmd, Wallet, util::normalize_optional_text,
};

use super::{Engine, balances::insufficient, with_tx};

impl Engine {
    /// Move `amount_minor` from one wallet to another.
    ///
    /// Returns the origin and destination legs.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<(Movement, Movement)> {
        let date = validate_transfer(
            cmd.origin_wallet_id,
            cmd.destination_wallet_id,
            cmd.amount_minor,
            cmd.date,
        )?;
        let user_id = cmd.user_id.as_str();
        with_tx!(self, |db_tx| {
            let origin = self
                .require_wallet(&db_tx, user_id, cmd.origin_wallet_id)
                .await?;
            let destination = self
                .require_wallet(&db_tx, user_id, cmd.destination_wallet_id)
                .await?;
            if cmd.is_paid && !origin.can_afford(-cmd.amount_minor) {
                return Err(insufficient(&origin, -cmd.amount_minor));
            }

            let out_category = self
                .system_category_id(&db_tx, user_id, SystemCategoryKind::TransferOut)
                .await?;
            let in_category = self
                .system_category_id(&db_tx, user_id, SystemCategoryKind::TransferIn)
                .await?;
            let description = transfer_description(&origin, &destination, cmd.note.as_deref());
            let pair_id = Uuid::new_v4();
            let now = Utc::now();

            let out_leg = Movement {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                description,
                amount: -cmd.amount_minor,
                date,
                is_paid: cmd.is_paid,
                is_recurrent: false,
                recurrent_id: None,
                wallet_id: origin.id,
                payment_type: PaymentType::InternalTransfer,
                category_id: out_category,
                sub_category_id: None,
                credit_card: None,
                pair_id: Some(pair_id),
                remainder_of_invoice_id: None,
                created_at: now,
                updated_at: now,
            };
            let in_leg = Movement {
                id: Uuid::new_v4(),
                amount: cmd.amount_minor,
                wallet_id: destination.id,
                category_id: in_category,
                ..out_leg.clone()
            };

            self.insert_movement(&db_tx, &out_leg).await?;
            self.insert_movement(&db_tx, &in_leg).await?;
            if cmd.is_paid {
                self.apply_wallet_changes(
                    &db_tx,
                    user_id,
                    &[
                        (origin.id, -cmd.amount_minor),
                        (destination.id, cmd.amount_minor),
                    ],
                )
                .await?;
            }

            tracing::info!(
                "transferred {} from {} to {} for {user_id}",
                cmd.amount_minor,
                origin.id,
                destination.id
            );
            Ok((out_leg, in_leg))
        })
    }

    /// Edit a transfer through either of its legs.
    ///
    /// When only the date changes, only the addressed leg is moved. Any other
    /// change rewrites both legs and moves the wallet balances of a paid
    /// transfer from the old legs to the new ones.
    ///
    /// Returns the origin and destination legs.
    pub async fn update_transfer(
        &self,
        cmd: UpdateTransferCmd,
    ) -> ResultEngine<(Movement, Movement)> {
        let date = validate_transfer(
            cmd.origin_wallet_id,
            cmd.destination_wallet_id,
            cmd.amount_minor,
            cmd.date,
        )?;
        let user_id = cmd.user_id.as_str();
        with_tx!(self, |db_tx| {
            let target = self
                .require_movement(&db_tx, user_id, cmd.movement_id)
                .await?;
            let Some(pair_id) = target.pair_id.filter(|_| target.is_internal_transfer()) else {
                return Err(EngineError::MovementNotInternalTransfer(
                    cmd.movement_id.to_string(),
                ));
            };
            let legs = self.movements_by_pair_id(&db_tx, user_id, pair_id).await?;
            let (out_leg, in_leg) = split_pair(legs, pair_id)?;

            let origin = self
                .require_wallet(&db_tx, user_id, cmd.origin_wallet_id)
                .await?;
            let destination = self
                .require_wallet(&db_tx, user_id, cmd.destination_wallet_id)
                .await?;
            let description = transfer_description(&origin, &destination, cmd.note.as_deref());
            let now = Utc::now();

            let date_only = in_leg.amount == cmd.amount_minor
                && out_leg.wallet_id == origin.id
                && in_leg.wallet_id == destination.id
                && target.description == description;
            if date_only {
                let moved = Movement {
                    date,
                    updated_at: now,
                    ..target.clone()
                };
                self.update_movement(&db_tx, &moved).await?;
                tracing::info!("moved transfer leg {} to {date} for {user_id}", moved.id);
                let legs = if moved.id == out_leg.id {
                    (moved, in_leg)
                } else {
                    (out_leg, moved)
                };
                return Ok(legs);
            }

            let out_category = self
                .system_category_id(&db_tx, user_id, SystemCategoryKind::TransferOut)
                .await?;
            let in_category = self
                .system_category_id(&db_tx, user_id, SystemCategoryKind::TransferIn)
                .await?;
            let new_out = Movement {
                description: description.clone(),
                amount: -cmd.amount_minor,
                date,
                wallet_id: origin.id,
                category_id: out_category,
                updated_at: now,
                ..out_leg.clone()
            };
            let new_in = Movement {
                description,
                amount: cmd.amount_minor,
                date,
                wallet_id: destination.id,
                category_id: in_category,
                updated_at: now,
                ..in_leg.clone()
            };

            let mut changes = Vec::with_capacity(4);
            for (old, new) in [(&out_leg, &new_out), (&in_leg, &new_in)] {
                if let Some((wallet_id, amount)) = old.wallet_effect() {
                    changes.push((wallet_id, -amount));
                }
                if let Some((wallet_id, amount)) = new.wallet_effect() {
                    changes.push((wallet_id, amount));
                }
            }
            self.update_movement(&db_tx, &new_out).await?;
            self.update_movement(&db_tx, &new_in).await?;
            self.apply_wallet_changes(&db_tx, user_id, &changes).await?;

            tracing::info!("updated transfer {pair_id} for {user_id}");
            Ok((new_out, new_in))
        })
    }
}

/// Checks a transfer request before any storage access and returns its date.
fn validate_transfer(
    origin_wallet_id: Uuid,
    destination_wallet_id: Uuid,
    amount_minor: i64,
    date: Option<NaiveDate>,
) -> ResultEngine<NaiveDate> {
    if origin_wallet_id == destination_wallet_id {
        return Err(EngineError::SameWalletTransfer(origin_wallet_id.to_string()));
    }
    if amount_minor <= 0 {
        return Err(EngineError::InvalidTransferAmount(format!(
            "transfer amount must be > 0, got {amount_minor}"
        )));
    }
    date.ok_or_else(|| EngineError::DateRequired("transfer date is required".to_string()))
}

fn transfer_description(origin: &Wallet, destination: &Wallet, note: Option<&str>) -> String {
    let base = format!("Transfer from {} to {}", origin.name, destination.name);
    match normalize_optional_text(note) {
        Some(note) => format!("{base} - {note}"),
        None => base,
    }
}

/// Returns the (origin, destination) legs of a transfer.
fn split_pair(legs: Vec<Movement>, pair_id: Uuid) -> ResultEngine<(Movement, Movement)> {
    if legs.is_empty() {
        return Err(EngineError::TransferPairNotFound(pair_id.to_string()));
    }
    let mismatch = || EngineError::TransferPairMismatch(pair_id.to_string());
    let [first, second]: [Movement; 2] = legs.try_into().map_err(|_| mismatch())?;
    let (out_leg, in_leg) = if first.amount < 0 {
        (first, second)
    } else {
        (second, first)
    };
    if out_leg.amount >= 0 || in_leg.amount <= 0 || out_leg.amount != -in_leg.amount {
        return Err(mismatch());
    }
    Ok((out_leg, in_leg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(amount: i64, pair_id: Uuid) -> Movement {
        let now = Utc::now();
        Movement {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            description: "Transfer from Cash to Bank".to_string(),
            amount,
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            is_paid: true,
            is_recurrent: false,
            recurrent_id: None,
            wallet_id: Uuid::new_v4(),
            payment_type: PaymentType::InternalTransfer,
            category_id: Uuid::new_v4(),
            sub_category_id: None,
            credit_card: None,
            pair_id: Some(pair_id),
            remainder_of_invoice_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn validation_order() {
        let wallet = Uuid::new_v4();
        let other = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2025, 5, 1);

        assert!(matches!(
            validate_transfer(wallet, wallet, 10, date),
            Err(EngineError::SameWalletTransfer(_))
        ));
        assert!(matches!(
            validate_transfer(wallet, other, 0, date),
            Err(EngineError::InvalidTransferAmount(_))
        ));
        assert!(matches!(
            validate_transfer(wallet, other, 10, None),
            Err(EngineError::DateRequired(_))
        ));
        assert_eq!(validate_transfer(wallet, other, 10, date).unwrap(), date.unwrap());
    }

    #[test]
    fn pair_is_ordered_origin_first() {
        let pair_id = Uuid::new_v4();
        let (out_leg, in_leg) = split_pair(vec![leg(50, pair_id), leg(-50, pair_id)], pair_id).unwrap();
        assert_eq!(out_leg.amount, -50);
        assert_eq!(in_leg.amount, 50);
    }

    #[test]
    fn broken_pairs_are_rejected() {
        let pair_id = Uuid::new_v4();
        assert!(matches!(
            split_pair(Vec::new(), pair_id),
            Err(EngineError::TransferPairNotFound(_))
        ));
        assert!(matches!(
            split_pair(vec![leg(-50, pair_id)], pair_id),
            Err(EngineError::TransferPairMismatch(_))
        ));
        assert!(matches!(
            split_pair(vec![leg(-50, pair_id), leg(40, pair_id)], pair_id),
            Err(EngineError::TransferPairMismatch(_))
        ));
        assert!(matches!(
            split_pair(vec![leg(50, pair_id), leg(50, pair_id)], pair_id),
            Err(EngineError::TransferPairMismatch(_))
        ));
    }

    #[test]
    fn description_includes_note() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let cash = Wallet::new("alice".to_string(), "Cash".to_string(), 0, date);
        let bank = Wallet::new("alice".to_string(), "Bank".to_string(), 0, date);
        assert_eq!(transfer_description(&cash, &bank, None), "Transfer from Cash to Bank");
        assert_eq!(
            transfer_description(&cash, &bank, Some(" rent ")),
            "Transfer from Cash to Bank - rent"
        );
    }
}
