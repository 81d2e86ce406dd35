//! Initial schema migration - creates all tables from scratch.
//!
//! - `wallets`: places where money is kept, with their running balance
//! - `categories` / `sub_categories`: movement classification
//! - `credit_cards`: cards with their available limit and billing days
//! - `recurrent_movements`: monthly movement templates
//! - `invoices`: one per card and billing cycle
//! - `movements`: every ledger entry

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    UserId,
    Name,
    Balance,
    InitialBalance,
    InitialDate,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    Name,
    SystemKind,
}

#[derive(Iden)]
enum SubCategories {
    Table,
    Id,
    UserId,
    CategoryId,
    Name,
}

#[derive(Iden)]
enum CreditCards {
    Table,
    Id,
    UserId,
    Name,
    CreditLimit,
    ClosingDay,
    DueDay,
    DefaultWalletId,
}

#[derive(Iden)]
enum RecurrentMovements {
    Table,
    Id,
    UserId,
    Description,
    Amount,
    InitialDate,
    EndDate,
    WalletId,
    CategoryId,
    SubCategoryId,
    PaymentType,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    UserId,
    CreditCardId,
    PeriodStart,
    PeriodEnd,
    DueDate,
    PaymentDate,
    Amount,
    IsPaid,
    WalletId,
    MonthIndex,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    UserId,
    Description,
    Amount,
    Date,
    IsPaid,
    IsRecurrent,
    RecurrentId,
    WalletId,
    PaymentType,
    CategoryId,
    SubCategoryId,
    CreditCardId,
    InvoiceId,
    InstallmentNumber,
    TotalInstallments,
    InstallmentGroupId,
    PairId,
    RemainderOfInvoiceId,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Wallets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Wallets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Wallets::UserId).string().not_null())
                    .col(ColumnDef::new(Wallets::Name).string().not_null())
                    .col(ColumnDef::new(Wallets::Balance).big_integer().not_null())
                    .col(ColumnDef::new(Wallets::InitialBalance).big_integer().not_null())
                    .col(ColumnDef::new(Wallets::InitialDate).date().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-user_id-name-unique")
                    .table(Wallets::Table)
                    .col(Wallets::UserId)
                    .col(Wallets::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Categories::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Categories::UserId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::SystemKind).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-user_id-system_kind-unique")
                    .table(Categories::Table)
                    .col(Categories::UserId)
                    .col(Categories::SystemKind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Sub-categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SubCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubCategories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubCategories::UserId).string().not_null())
                    .col(ColumnDef::new(SubCategories::CategoryId).string().not_null())
                    .col(ColumnDef::new(SubCategories::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sub_categories-category_id")
                            .from(SubCategories::Table, SubCategories::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sub_categories-category_id")
                    .table(SubCategories::Table)
                    .col(SubCategories::CategoryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Credit cards
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CreditCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditCards::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditCards::UserId).string().not_null())
                    .col(ColumnDef::new(CreditCards::Name).string().not_null())
                    .col(ColumnDef::new(CreditCards::CreditLimit).big_integer().not_null())
                    .col(ColumnDef::new(CreditCards::ClosingDay).integer().not_null())
                    .col(ColumnDef::new(CreditCards::DueDay).integer().not_null())
                    .col(ColumnDef::new(CreditCards::DefaultWalletId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_cards-default_wallet_id")
                            .from(CreditCards::Table, CreditCards::DefaultWalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Recurrent movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RecurrentMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecurrentMovements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RecurrentMovements::UserId).string().not_null())
                    .col(
                        ColumnDef::new(RecurrentMovements::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecurrentMovements::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurrentMovements::InitialDate).date().not_null())
                    .col(ColumnDef::new(RecurrentMovements::EndDate).date())
                    .col(ColumnDef::new(RecurrentMovements::WalletId).string().not_null())
                    .col(ColumnDef::new(RecurrentMovements::CategoryId).string().not_null())
                    .col(ColumnDef::new(RecurrentMovements::SubCategoryId).string())
                    .col(
                        ColumnDef::new(RecurrentMovements::PaymentType)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurrent_movements-wallet_id")
                            .from(RecurrentMovements::Table, RecurrentMovements::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Invoices
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Invoices::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Invoices::UserId).string().not_null())
                    .col(ColumnDef::new(Invoices::CreditCardId).string().not_null())
                    .col(ColumnDef::new(Invoices::PeriodStart).date().not_null())
                    .col(ColumnDef::new(Invoices::PeriodEnd).date().not_null())
                    .col(ColumnDef::new(Invoices::DueDate).date().not_null())
                    .col(ColumnDef::new(Invoices::PaymentDate).date())
                    .col(ColumnDef::new(Invoices::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::IsPaid).boolean().not_null())
                    .col(ColumnDef::new(Invoices::WalletId).string())
                    .col(ColumnDef::new(Invoices::MonthIndex).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoices-credit_card_id")
                            .from(Invoices::Table, Invoices::CreditCardId)
                            .to(CreditCards::Table, CreditCards::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-invoices-wallet_id")
                            .from(Invoices::Table, Invoices::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-invoices-credit_card_id-month_index-unique")
                    .table(Invoices::Table)
                    .col(Invoices::CreditCardId)
                    .col(Invoices::MonthIndex)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Movements::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Movements::UserId).string().not_null())
                    .col(ColumnDef::new(Movements::Description).string().not_null())
                    .col(ColumnDef::new(Movements::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Movements::Date).date().not_null())
                    .col(ColumnDef::new(Movements::IsPaid).boolean().not_null())
                    .col(ColumnDef::new(Movements::IsRecurrent).boolean().not_null())
                    .col(ColumnDef::new(Movements::RecurrentId).string())
                    .col(ColumnDef::new(Movements::WalletId).string().not_null())
                    .col(ColumnDef::new(Movements::PaymentType).string().not_null())
                    .col(ColumnDef::new(Movements::CategoryId).string().not_null())
                    .col(ColumnDef::new(Movements::SubCategoryId).string())
                    .col(ColumnDef::new(Movements::CreditCardId).string())
                    .col(ColumnDef::new(Movements::InvoiceId).string())
                    .col(ColumnDef::new(Movements::InstallmentNumber).integer())
                    .col(ColumnDef::new(Movements::TotalInstallments).integer())
                    .col(ColumnDef::new(Movements::InstallmentGroupId).string())
                    .col(ColumnDef::new(Movements::PairId).string())
                    .col(ColumnDef::new(Movements::RemainderOfInvoiceId).string())
                    .col(
                        ColumnDef::new(Movements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Movements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-wallet_id")
                            .from(Movements::Table, Movements::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-category_id")
                            .from(Movements::Table, Movements::CategoryId)
                            .to(Categories::Table, Categories::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-recurrent_id")
                            .from(Movements::Table, Movements::RecurrentId)
                            .to(RecurrentMovements::Table, RecurrentMovements::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-invoice_id")
                            .from(Movements::Table, Movements::InvoiceId)
                            .to(Invoices::Table, Invoices::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-user_id-date")
                    .table(Movements::Table)
                    .col(Movements::UserId)
                    .col(Movements::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-invoice_id")
                    .table(Movements::Table)
                    .col(Movements::InvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-pair_id")
                    .table(Movements::Table)
                    .col(Movements::PairId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-installment_group")
                    .table(Movements::Table)
                    .col(Movements::InstallmentGroupId)
                    .col(Movements::InstallmentNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-recurrent_id-date")
                    .table(Movements::Table)
                    .col(Movements::RecurrentId)
                    .col(Movements::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-remainder_of_invoice_id")
                    .table(Movements::Table)
                    .col(Movements::RemainderOfInvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-wallet_id-is_paid")
                    .table(Movements::Table)
                    .col(Movements::WalletId)
                    .col(Movements::IsPaid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecurrentMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditCards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        Ok(())
    }
}
