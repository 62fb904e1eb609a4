//! Lesson plans, syllabus topics, timetables and homework.

use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000001_tenancy::{Classes, Schools, Sections, Subjects, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

fn cascade(
    name: &str,
    from: (impl IntoIden + 'static, impl IntoIden),
    to: (impl IntoIden + 'static, impl IntoIden),
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(from.0, from.1)
        .to(to.0, to.1)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LessonPlans::Table)
                    .if_not_exists()
                    .col(pk_uuid(LessonPlans::Id))
                    .col(uuid(LessonPlans::SchoolId))
                    .col(uuid(LessonPlans::SectionId))
                    .col(uuid(LessonPlans::ClassId))
                    .col(uuid(LessonPlans::SubjectId))
                    .col(uuid(LessonPlans::TeacherId))
                    .col(string(LessonPlans::Title))
                    .col(text(LessonPlans::Content))
                    .col(integer(LessonPlans::WeekNumber))
                    .col(string_len(LessonPlans::Status, 20).default("draft"))
                    .col(text_null(LessonPlans::Remarks))
                    .col(uuid_null(LessonPlans::ReviewedBy))
                    .col(timestamp_with_time_zone(LessonPlans::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(LessonPlans::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(&mut cascade(
                        "fk_lesson_plans_school",
                        (LessonPlans::Table, LessonPlans::SchoolId),
                        (Schools::Table, Schools::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_lesson_plans_section",
                        (LessonPlans::Table, LessonPlans::SectionId),
                        (Sections::Table, Sections::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_lesson_plans_class",
                        (LessonPlans::Table, LessonPlans::ClassId),
                        (Classes::Table, Classes::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_lesson_plans_subject",
                        (LessonPlans::Table, LessonPlans::SubjectId),
                        (Subjects::Table, Subjects::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_lesson_plans_teacher",
                        (LessonPlans::Table, LessonPlans::TeacherId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Syllabuses::Table)
                    .if_not_exists()
                    .col(pk_uuid(Syllabuses::Id))
                    .col(uuid(Syllabuses::SchoolId))
                    .col(uuid(Syllabuses::SectionId))
                    .col(uuid(Syllabuses::ClassId))
                    .col(uuid(Syllabuses::SubjectId))
                    .col(string(Syllabuses::Topic))
                    .col(text_null(Syllabuses::Description))
                    .col(string_len(Syllabuses::Status, 20).default("pending"))
                    .col(date_null(Syllabuses::CompletionDate))
                    .col(timestamp_with_time_zone(Syllabuses::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Syllabuses::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(&mut cascade(
                        "fk_syllabuses_school",
                        (Syllabuses::Table, Syllabuses::SchoolId),
                        (Schools::Table, Schools::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_syllabuses_class",
                        (Syllabuses::Table, Syllabuses::ClassId),
                        (Classes::Table, Classes::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_syllabuses_subject",
                        (Syllabuses::Table, Syllabuses::SubjectId),
                        (Subjects::Table, Subjects::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Timetables::Table)
                    .if_not_exists()
                    .col(pk_uuid(Timetables::Id))
                    .col(uuid(Timetables::SchoolId))
                    .col(uuid(Timetables::SectionId))
                    .col(uuid(Timetables::ClassId))
                    .col(uuid(Timetables::SubjectId))
                    .col(uuid(Timetables::TeacherId))
                    .col(string_len(Timetables::DayOfWeek, 10))
                    .col(time(Timetables::StartTime))
                    .col(time(Timetables::EndTime))
                    .col(timestamp_with_time_zone(Timetables::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Timetables::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(&mut cascade(
                        "fk_timetables_school",
                        (Timetables::Table, Timetables::SchoolId),
                        (Schools::Table, Schools::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_timetables_class",
                        (Timetables::Table, Timetables::ClassId),
                        (Classes::Table, Classes::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_timetables_subject",
                        (Timetables::Table, Timetables::SubjectId),
                        (Subjects::Table, Subjects::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_timetables_teacher",
                        (Timetables::Table, Timetables::TeacherId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_timetables_school_day")
                    .table(Timetables::Table)
                    .col(Timetables::SchoolId)
                    .col(Timetables::DayOfWeek)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Homeworks::Table)
                    .if_not_exists()
                    .col(pk_uuid(Homeworks::Id))
                    .col(uuid(Homeworks::SchoolId))
                    .col(uuid(Homeworks::ClassId))
                    .col(uuid(Homeworks::SubjectId))
                    .col(uuid(Homeworks::TeacherId))
                    .col(string(Homeworks::Title))
                    .col(text_null(Homeworks::Description))
                    .col(date(Homeworks::AssignedOn))
                    .col(date(Homeworks::DueDate))
                    .col(timestamp_with_time_zone(Homeworks::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Homeworks::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(&mut cascade(
                        "fk_homeworks_school",
                        (Homeworks::Table, Homeworks::SchoolId),
                        (Schools::Table, Schools::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_homeworks_class",
                        (Homeworks::Table, Homeworks::ClassId),
                        (Classes::Table, Classes::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "fk_homeworks_subject",
                        (Homeworks::Table, Homeworks::SubjectId),
                        (Subjects::Table, Subjects::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Homeworks::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Timetables::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Syllabuses::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LessonPlans::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum LessonPlans {
    Table,
    Id,
    SchoolId,
    SectionId,
    ClassId,
    SubjectId,
    TeacherId,
    Title,
    Content,
    WeekNumber,
    Status,
    Remarks,
    ReviewedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Syllabuses {
    Table,
    Id,
    SchoolId,
    SectionId,
    ClassId,
    SubjectId,
    Topic,
    Description,
    Status,
    CompletionDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Timetables {
    Table,
    Id,
    SchoolId,
    SectionId,
    ClassId,
    SubjectId,
    TeacherId,
    DayOfWeek,
    StartTime,
    EndTime,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Homeworks {
    Table,
    Id,
    SchoolId,
    ClassId,
    SubjectId,
    TeacherId,
    Title,
    Description,
    AssignedOn,
    DueDate,
    CreatedAt,
    UpdatedAt,
}
