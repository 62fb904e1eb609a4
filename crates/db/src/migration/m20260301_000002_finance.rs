//! Fees, gateway payments and manual transactions.

use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000001_tenancy::{Schools, Sections, Students, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Fees::Table)
                    .if_not_exists()
                    .col(pk_uuid(Fees::Id))
                    .col(uuid(Fees::SchoolId))
                    .col(uuid(Fees::SectionId))
                    .col(uuid(Fees::SessionId))
                    .col(uuid(Fees::TermId))
                    .col(uuid_null(Fees::ClassId))
                    .col(uuid_null(Fees::StudentId))
                    .col(string(Fees::FeeName))
                    .col(decimal_len(Fees::Amount, 12, 2))
                    .col(string_len(Fees::FeeScope, 20))
                    .col(text_null(Fees::Description))
                    .col(boolean(Fees::IsActive).default(true))
                    .col(timestamp_with_time_zone(Fees::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Fees::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fees_school")
                            .from(Fees::Table, Fees::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fees_section")
                            .from(Fees::Table, Fees::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fees_student")
                            .from(Fees::Table, Fees::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_fees_school_period")
                    .table(Fees::Table)
                    .col(Fees::SchoolId)
                    .col(Fees::SessionId)
                    .col(Fees::TermId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_uuid(Payments::Id))
                    .col(uuid(Payments::StudentId))
                    .col(uuid(Payments::FeeId))
                    .col(decimal_len(Payments::Amount, 12, 2))
                    .col(string_len(Payments::PaymentMethod, 30).default("card"))
                    .col(string_len_uniq(Payments::Reference, 64))
                    .col(string_len(Payments::Status, 20).default("pending"))
                    .col(json_binary_null(Payments::GatewayResponse))
                    .col(timestamp_with_time_zone_null(Payments::PaidAt))
                    .col(timestamp_with_time_zone(Payments::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Payments::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_student")
                            .from(Payments::Table, Payments::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_fee")
                            .from(Payments::Table, Payments::FeeId)
                            .to(Fees::Table, Fees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_student_status")
                    .table(Payments::Table)
                    .col(Payments::StudentId)
                    .col(Payments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_uuid(Transactions::Id))
                    .col(uuid(Transactions::SchoolId))
                    .col(uuid(Transactions::SectionId))
                    .col(uuid_null(Transactions::SessionId))
                    .col(uuid_null(Transactions::TermId))
                    .col(uuid_null(Transactions::StudentId))
                    .col(string_len(Transactions::TransactionType, 20))
                    .col(decimal_len(Transactions::Amount, 12, 2))
                    .col(string_len(Transactions::PaymentMethod, 20))
                    .col(string_null(Transactions::Category))
                    .col(text_null(Transactions::Description))
                    .col(string_len_null(Transactions::ReferenceNumber, 100))
                    .col(date(Transactions::TransactionDate))
                    .col(uuid(Transactions::RecordedBy))
                    .col(uuid_null(Transactions::PaymentId).unique_key())
                    .col(timestamp_with_time_zone(Transactions::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Transactions::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_school")
                            .from(Transactions::Table, Transactions::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_student")
                            .from(Transactions::Table, Transactions::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_recorded_by")
                            .from(Transactions::Table, Transactions::RecordedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_payment")
                            .from(Transactions::Table, Transactions::PaymentId)
                            .to(Payments::Table, Payments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_transactions_school_date", Transactions::TransactionDate),
            ("idx_transactions_student", Transactions::StudentId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Transactions::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Fees::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Fees {
    Table,
    Id,
    SchoolId,
    SectionId,
    SessionId,
    TermId,
    ClassId,
    StudentId,
    FeeName,
    Amount,
    FeeScope,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    StudentId,
    FeeId,
    Amount,
    PaymentMethod,
    Reference,
    Status,
    GatewayResponse,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    SchoolId,
    SectionId,
    SessionId,
    TermId,
    StudentId,
    TransactionType,
    Amount,
    PaymentMethod,
    Category,
    Description,
    ReferenceNumber,
    TransactionDate,
    RecordedBy,
    PaymentId,
    CreatedAt,
    UpdatedAt,
}
