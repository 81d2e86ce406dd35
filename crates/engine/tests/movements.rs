mod common;

use common::{USER, assert_no_drift, balance, count, date, ledger};
use engine::{EngineError, MonthYear, MovementPatch, MovementTarget, NewMovement, PaymentType};

#[tokio::test]
async fn paid_expense_moves_wallet_balance() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(
            NewMovement::new(USER, "Groceries", -120_50, date(2025, 2, 3), ledger.cash, ledger.home)
                .paid(),
        )
        .await
        .unwrap();

    assert!(movement.is_paid);
    assert_eq!(balance(&ledger, ledger.cash).await, 879_50);
    assert_no_drift(&ledger, ledger.cash).await;

    ledger
        .engine
        .add(NewMovement::new(USER, "Salary", 2000_00, date(2025, 2, 5), ledger.cash, ledger.home).paid())
        .await
        .unwrap();
    assert_eq!(balance(&ledger, ledger.cash).await, 2879_50);
}

#[tokio::test]
async fn unpaid_movement_leaves_wallet_alone() {
    let ledger = ledger().await;
    ledger
        .engine
        .add(NewMovement::new(USER, "Rent", -900_00, date(2025, 2, 3), ledger.cash, ledger.home))
        .await
        .unwrap();
    assert_eq!(balance(&ledger, ledger.cash).await, 1000_00);
}

#[tokio::test]
async fn insufficient_paid_expense_persists_nothing() {
    let ledger = ledger().await;
    let err = ledger
        .engine
        .add(
            NewMovement::new(USER, "Laptop", -1500_00, date(2025, 2, 3), ledger.cash, ledger.home)
                .paid()
                .recurrent(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::WalletInsufficient(_)));
    assert_eq!(balance(&ledger, ledger.cash).await, 1000_00);
    assert_eq!(count(&ledger.db, "movements").await, 0);
    assert_eq!(count(&ledger.db, "recurrent_movements").await, 0);
}

#[tokio::test]
async fn sub_category_must_belong_to_category() {
    let ledger = ledger().await;
    let food = ledger.engine.new_category(USER, "Food").await.unwrap();
    let bakery = ledger
        .engine
        .new_sub_category(USER, food, "Bakery")
        .await
        .unwrap();

    let err = ledger
        .engine
        .add(
            NewMovement::new(USER, "Bread", -3_00, date(2025, 2, 3), ledger.cash, ledger.home)
                .sub_category(bakery),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Bread", -3_00, date(2025, 2, 3), ledger.cash, food).sub_category(bakery))
        .await
        .unwrap();
    assert_eq!(movement.sub_category_id, Some(bakery));
}

#[tokio::test]
async fn recurrent_movement_starts_a_series() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Rent", -100_00, date(2025, 1, 15), ledger.cash, ledger.home).recurrent())
        .await
        .unwrap();

    let series_id = movement.recurrent_id.unwrap();
    let series = ledger
        .engine
        .recurrent_movement(USER, series_id)
        .await
        .unwrap();
    assert_eq!(series.initial_date, date(2025, 1, 15));
    assert_eq!(series.end_date, None);
    assert_eq!(series.amount, -100_00);

    let resolved = ledger
        .engine
        .resolve_movement(USER, series_id, Some(date(2025, 4, 2)))
        .await
        .unwrap();
    assert!(resolved.is_virtual());
    assert_eq!(resolved.movement().date, date(2025, 4, 15));
    assert_eq!(resolved.target_month, MonthYear::new(2025, 4));
}

#[tokio::test]
async fn virtual_instance_requires_a_date() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Rent", -100_00, date(2025, 1, 15), ledger.cash, ledger.home).recurrent())
        .await
        .unwrap();
    let err = ledger
        .engine
        .resolve_movement(USER, movement.recurrent_id.unwrap(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DateRequired(_)));

    let err = ledger
        .engine
        .resolve_movement(USER, uuid::Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn update_one_on_virtual_instance_splits_series() {
    let ledger = ledger().await;
    let first = ledger
        .engine
        .add(NewMovement::new(USER, "Rent", -100_00, date(2025, 1, 15), ledger.cash, ledger.home).recurrent())
        .await
        .unwrap();
    let series_id = first.recurrent_id.unwrap();

    let june = ledger
        .engine
        .update_one(
            USER,
            series_id,
            Some(date(2025, 6, 15)),
            MovementPatch::new().amount(-150_00),
        )
        .await
        .unwrap();

    assert_eq!(june.amount, -150_00);
    assert_eq!(june.date, date(2025, 6, 15));
    assert!(!june.is_recurrent);
    assert_eq!(june.recurrent_id, None);
    assert_ne!(june.id, series_id);

    let series = ledger.engine.recurrent_movements(USER).await.unwrap();
    assert_eq!(series.len(), 2);
    let ended = &series[0];
    let successor = &series[1];
    assert_eq!(ended.id, series_id);
    assert_eq!(ended.end_date, Some(date(2025, 5, 15)));
    assert_eq!(successor.initial_date, date(2025, 7, 15));
    assert_eq!(successor.end_date, None);
    assert_eq!(successor.amount, -100_00);

    let err = ledger
        .engine
        .resolve_movement(USER, series_id, Some(date(2025, 6, 15)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let july = ledger
        .engine
        .resolve_movement(USER, successor.id, Some(date(2025, 7, 1)))
        .await
        .unwrap();
    assert!(matches!(july.target, MovementTarget::Virtual { .. }));
    assert_eq!(july.movement().amount, -100_00);
}

#[tokio::test]
async fn update_one_moves_later_instances_to_successor() {
    let ledger = ledger().await;
    let first = ledger
        .engine
        .add(NewMovement::new(USER, "Gym", -30_00, date(2025, 1, 10), ledger.cash, ledger.home).recurrent())
        .await
        .unwrap();
    let series_id = first.recurrent_id.unwrap();
    let august = ledger
        .engine
        .add(
            NewMovement::new(USER, "Gym", -30_00, date(2025, 8, 10), ledger.cash, ledger.home)
                .recurrent_id(series_id),
        )
        .await
        .unwrap();

    ledger
        .engine
        .update_one(USER, series_id, Some(date(2025, 3, 10)), MovementPatch::new().description("Gym (promo)"))
        .await
        .unwrap();

    let series = ledger.engine.recurrent_movements(USER).await.unwrap();
    let successor = series.iter().find(|s| s.id != series_id).unwrap();
    let august = ledger.engine.movement(USER, august.id).await.unwrap();
    assert_eq!(august.recurrent_id, Some(successor.id));

    let january = ledger.engine.movement(USER, first.id).await.unwrap();
    assert_eq!(january.recurrent_id, Some(series_id));
}

#[tokio::test]
async fn update_all_next_uses_patch_as_new_template() {
    let ledger = ledger().await;
    let first = ledger
        .engine
        .add(NewMovement::new(USER, "Rent", -100_00, date(2025, 1, 15), ledger.cash, ledger.home).recurrent())
        .await
        .unwrap();
    let series_id = first.recurrent_id.unwrap();

    let june = ledger
        .engine
        .update_all_next(
            USER,
            series_id,
            MovementPatch::new()
                .amount(-120_00)
                .description("Rent 2025")
                .date(date(2025, 6, 15)),
        )
        .await
        .unwrap();

    let successor_id = june.recurrent_id.unwrap();
    assert!(june.is_recurrent);
    assert_ne!(successor_id, series_id);
    assert_eq!(june.amount, -120_00);

    let successor = ledger
        .engine
        .recurrent_movement(USER, successor_id)
        .await
        .unwrap();
    assert_eq!(successor.amount, -120_00);
    assert_eq!(successor.description, "Rent 2025");
    assert_eq!(successor.initial_date, date(2025, 7, 15));

    let ended = ledger
        .engine
        .recurrent_movement(USER, series_id)
        .await
        .unwrap();
    assert_eq!(ended.end_date, Some(date(2025, 5, 15)));
    assert_eq!(ended.amount, -100_00);
}

#[tokio::test]
async fn editing_the_cut_month_again_retemplates_the_successor() {
    let ledger = ledger().await;
    let first = ledger
        .engine
        .add(NewMovement::new(USER, "Rent", -100_00, date(2025, 1, 15), ledger.cash, ledger.home).recurrent())
        .await
        .unwrap();
    let series_id = first.recurrent_id.unwrap();
    let june = ledger
        .engine
        .update_all_next(
            USER,
            series_id,
            MovementPatch::new().amount(-150_00).date(date(2025, 6, 15)),
        )
        .await
        .unwrap();
    let successor_id = june.recurrent_id.unwrap();

    let june = ledger
        .engine
        .update_all_next(
            USER,
            june.id,
            MovementPatch::new().amount(-200_00).date(date(2025, 6, 15)),
        )
        .await
        .unwrap();

    assert_eq!(june.recurrent_id, Some(successor_id));
    assert_eq!(june.amount, -200_00);
    let series = ledger.engine.recurrent_movements(USER).await.unwrap();
    assert_eq!(series.len(), 2);
    let july = MonthYear::new(2025, 7);
    assert_eq!(series.iter().filter(|s| s.occurs_in(july)).count(), 1);

    let successor = ledger
        .engine
        .recurrent_movement(USER, successor_id)
        .await
        .unwrap();
    assert_eq!(successor.amount, -200_00);
    assert_eq!(successor.initial_date, date(2025, 7, 15));
    assert_eq!(successor.end_date, None);
    let ended = ledger
        .engine
        .recurrent_movement(USER, series_id)
        .await
        .unwrap();
    assert_eq!(ended.end_date, Some(date(2025, 5, 15)));

    let detached = ledger
        .engine
        .update_one(USER, june.id, None, MovementPatch::new().description("June only"))
        .await
        .unwrap();
    assert_eq!(detached.recurrent_id, None);
    assert_eq!(ledger.engine.recurrent_movements(USER).await.unwrap().len(), 2);
    let august = ledger
        .engine
        .resolve_movement(USER, successor_id, Some(date(2025, 8, 1)))
        .await
        .unwrap();
    assert_eq!(august.movement().amount, -200_00);
}

#[tokio::test]
async fn patch_cannot_turn_a_movement_into_a_transfer() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Dinner", -40_00, date(2025, 2, 3), ledger.cash, ledger.home))
        .await
        .unwrap();

    for payment_type in [PaymentType::InternalTransfer, PaymentType::InvoicePayment] {
        let err = ledger
            .engine
            .update_one(USER, movement.id, None, MovementPatch::new().payment_type(payment_type))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedMovementType(_)));

        let err = ledger
            .engine
            .update_all_next(
                USER,
                movement.id,
                MovementPatch::new().payment_type(payment_type).date(date(2025, 2, 3)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedMovementType(_)));
    }

    let stored = ledger.engine.movement(USER, movement.id).await.unwrap();
    assert_eq!(stored.payment_type, movement.payment_type);
}

#[tokio::test]
async fn update_all_next_requires_date() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Rent", -100_00, date(2025, 1, 15), ledger.cash, ledger.home).recurrent())
        .await
        .unwrap();
    let err = ledger
        .engine
        .update_all_next(USER, movement.id, MovementPatch::new().amount(-1_00))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DateRequired(_)));
}

#[tokio::test]
async fn update_reconciles_wallets() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Dinner", -100_00, date(2025, 2, 3), ledger.cash, ledger.home).paid())
        .await
        .unwrap();
    assert_eq!(balance(&ledger, ledger.cash).await, 900_00);

    ledger
        .engine
        .update_one(USER, movement.id, None, MovementPatch::new().amount(-300_00))
        .await
        .unwrap();
    assert_eq!(balance(&ledger, ledger.cash).await, 700_00);

    let err = ledger
        .engine
        .update_one(USER, movement.id, None, MovementPatch::new().wallet_id(ledger.bank))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::WalletInsufficient(_)));
    assert_eq!(balance(&ledger, ledger.cash).await, 700_00);

    ledger
        .engine
        .update_one(USER, movement.id, None, MovementPatch::new().paid(false))
        .await
        .unwrap();
    assert_eq!(balance(&ledger, ledger.cash).await, 1000_00);

    ledger
        .engine
        .update_all_next(
            USER,
            movement.id,
            MovementPatch::new().paid(true).amount(-50_00).date(date(2025, 2, 4)),
        )
        .await
        .unwrap();
    assert_eq!(balance(&ledger, ledger.cash).await, 950_00);
    let stored = ledger.engine.movement(USER, movement.id).await.unwrap();
    assert_eq!(stored.amount, -50_00);
    assert_eq!(stored.date, date(2025, 2, 4));
    assert!(stored.is_paid);
    assert_no_drift(&ledger, ledger.cash).await;
    assert_no_drift(&ledger, ledger.bank).await;
}

#[tokio::test]
async fn patch_can_clear_description() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Dinner", -10_00, date(2025, 2, 3), ledger.cash, ledger.home))
        .await
        .unwrap();
    let updated = ledger
        .engine
        .update_one(USER, movement.id, None, MovementPatch::new().description(""))
        .await
        .unwrap();
    assert_eq!(updated.description, "");
    assert_eq!(updated.amount, -10_00);
}

#[tokio::test]
async fn delete_requires_credit_card_movement() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Dinner", -10_00, date(2025, 2, 3), ledger.cash, ledger.home))
        .await
        .unwrap();
    let err = ledger.engine.delete_one(USER, movement.id).await.unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedMovementType(_)));
    let err = ledger
        .engine
        .delete_all_next(USER, movement.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedMovementType(_)));
    assert_eq!(count(&ledger.db, "movements").await, 1);
}

#[tokio::test]
async fn other_users_cannot_see_movements() {
    let ledger = ledger().await;
    let movement = ledger
        .engine
        .add(NewMovement::new(USER, "Dinner", -10_00, date(2025, 2, 3), ledger.cash, ledger.home))
        .await
        .unwrap();
    let err = ledger.engine.movement("bob", movement.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = ledger
        .engine
        .add(NewMovement::new("bob", "Dinner", -10_00, date(2025, 2, 3), ledger.cash, ledger.home))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}
