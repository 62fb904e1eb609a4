//! Exams, exam results and attendance.

use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000001_tenancy::{Classes, Schools, Students, Subjects};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Exams::Table)
                    .if_not_exists()
                    .col(pk_uuid(Exams::Id))
                    .col(uuid(Exams::SchoolId))
                    .col(uuid(Exams::ClassId))
                    .col(uuid(Exams::SubjectId))
                    .col(uuid(Exams::SessionId))
                    .col(uuid(Exams::TermId))
                    .col(string(Exams::Title))
                    .col(decimal_len(Exams::MaxScore, 5, 2).default(100))
                    .col(date_null(Exams::ExamDate))
                    .col(uuid_null(Exams::CreatedBy))
                    .col(timestamp_with_time_zone(Exams::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Exams::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exams_school")
                            .from(Exams::Table, Exams::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exams_class")
                            .from(Exams::Table, Exams::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exams_subject")
                            .from(Exams::Table, Exams::SubjectId)
                            .to(Subjects::Table, Subjects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExamResults::Table)
                    .if_not_exists()
                    .col(pk_uuid(ExamResults::Id))
                    .col(uuid(ExamResults::ExamId))
                    .col(uuid(ExamResults::StudentId))
                    .col(decimal_len(ExamResults::Score, 5, 2))
                    .col(string_len(ExamResults::Grade, 2))
                    .col(text_null(ExamResults::Remark))
                    .col(uuid_null(ExamResults::GradedBy))
                    .col(timestamp_with_time_zone(ExamResults::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(ExamResults::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_results_exam")
                            .from(ExamResults::Table, ExamResults::ExamId)
                            .to(Exams::Table, Exams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_exam_results_student")
                            .from(ExamResults::Table, ExamResults::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_exam_results_exam_student")
                    .table(ExamResults::Table)
                    .col(ExamResults::ExamId)
                    .col(ExamResults::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attendances::Table)
                    .if_not_exists()
                    .col(pk_uuid(Attendances::Id))
                    .col(uuid(Attendances::SchoolId))
                    .col(uuid(Attendances::ClassId))
                    .col(uuid(Attendances::StudentId))
                    .col(date(Attendances::Date))
                    .col(string_len(Attendances::Status, 20))
                    .col(text_null(Attendances::Remark))
                    .col(uuid_null(Attendances::RecordedBy))
                    .col(timestamp_with_time_zone(Attendances::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Attendances::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendances_student")
                            .from(Attendances::Table, Attendances::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attendances_class")
                            .from(Attendances::Table, Attendances::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_attendances_student_date")
                    .table(Attendances::Table)
                    .col(Attendances::StudentId)
                    .col(Attendances::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_attendances_class_date")
                    .table(Attendances::Table)
                    .col(Attendances::ClassId)
                    .col(Attendances::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attendances::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExamResults::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Exams::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Exams {
    Table,
    Id,
    SchoolId,
    ClassId,
    SubjectId,
    SessionId,
    TermId,
    Title,
    MaxScore,
    ExamDate,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExamResults {
    Table,
    Id,
    ExamId,
    StudentId,
    Score,
    Grade,
    Remark,
    GradedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Attendances {
    Table,
    Id,
    SchoolId,
    ClassId,
    StudentId,
    Date,
    Status,
    Remark,
    RecordedBy,
    CreatedAt,
    UpdatedAt,
}
