//! Schools, users and the academic structure of a school.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Schools::Table)
                    .if_not_exists()
                    .col(pk_uuid(Schools::Id))
                    .col(string(Schools::Name))
                    .col(string_len_uniq(Schools::ShortCode, 10))
                    .col(string_null(Schools::Address))
                    .col(string_null(Schools::Phone))
                    .col(string_null(Schools::Email))
                    .col(string_null(Schools::LogoUrl))
                    .col(boolean(Schools::IsActive).default(true))
                    .col(string_null(Schools::PaystackSubaccountCode))
                    .col(decimal_len_null(Schools::PlatformFeePercentage, 5, 2))
                    .col(string_null(Schools::SettlementBank))
                    .col(string_null(Schools::AccountNumber))
                    .col(timestamp_with_time_zone(Schools::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Schools::UpdatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_uuid(Users::Id))
                    .col(uuid(Users::SchoolId))
                    .col(string_uniq(Users::Email))
                    .col(string(Users::PasswordHash))
                    .col(string(Users::FullName))
                    .col(string_null(Users::Phone))
                    .col(string_len(Users::Role, 20))
                    .col(string_len_null(Users::RegistrationId, 40).unique_key())
                    .col(boolean(Users::IsActive).default(true))
                    .col(timestamp_with_time_zone(Users::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Users::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_school")
                            .from(Users::Table, Users::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_school_role")
                    .table(Users::Table)
                    .col(Users::SchoolId)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sections::Table)
                    .if_not_exists()
                    .col(pk_uuid(Sections::Id))
                    .col(uuid(Sections::SchoolId))
                    .col(string(Sections::SectionName))
                    .col(text_null(Sections::Description))
                    .col(boolean(Sections::IsActive).default(true))
                    .col(timestamp_with_time_zone(Sections::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Sections::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sections_school")
                            .from(Sections::Table, Sections::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AcademicSessions::Table)
                    .if_not_exists()
                    .col(pk_uuid(AcademicSessions::Id))
                    .col(uuid(AcademicSessions::SchoolId))
                    .col(uuid(AcademicSessions::SectionId))
                    .col(string(AcademicSessions::SessionName))
                    .col(date(AcademicSessions::StartDate))
                    .col(date(AcademicSessions::EndDate))
                    .col(boolean(AcademicSessions::IsActive).default(false))
                    .col(timestamp_with_time_zone(AcademicSessions::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(AcademicSessions::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_academic_sessions_section")
                            .from(AcademicSessions::Table, AcademicSessions::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Terms::Table)
                    .if_not_exists()
                    .col(pk_uuid(Terms::Id))
                    .col(uuid(Terms::SchoolId))
                    .col(uuid(Terms::SectionId))
                    .col(uuid(Terms::SessionId))
                    .col(string(Terms::TermName))
                    .col(date(Terms::StartDate))
                    .col(date(Terms::EndDate))
                    .col(boolean(Terms::IsActive).default(false))
                    .col(timestamp_with_time_zone(Terms::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Terms::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_terms_session")
                            .from(Terms::Table, Terms::SessionId)
                            .to(AcademicSessions::Table, AcademicSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Classes::Table)
                    .if_not_exists()
                    .col(pk_uuid(Classes::Id))
                    .col(uuid(Classes::SchoolId))
                    .col(uuid(Classes::SectionId))
                    .col(string(Classes::ClassName))
                    .col(text_null(Classes::Description))
                    .col(uuid_null(Classes::FormTeacherId))
                    .col(integer_null(Classes::Capacity))
                    .col(boolean(Classes::IsActive).default(true))
                    .col(timestamp_with_time_zone(Classes::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Classes::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classes_section")
                            .from(Classes::Table, Classes::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_classes_form_teacher")
                            .from(Classes::Table, Classes::FormTeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subjects::Table)
                    .if_not_exists()
                    .col(pk_uuid(Subjects::Id))
                    .col(uuid(Subjects::SchoolId))
                    .col(uuid(Subjects::SectionId))
                    .col(uuid_null(Subjects::ClassId))
                    .col(string(Subjects::Name))
                    .col(string_len_null(Subjects::Code, 20))
                    .col(timestamp_with_time_zone(Subjects::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Subjects::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subjects_section")
                            .from(Subjects::Table, Subjects::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(pk_uuid(Students::Id))
                    .col(uuid(Students::SchoolId))
                    .col(uuid_null(Students::ClassId))
                    .col(uuid_null(Students::ParentId))
                    .col(string(Students::StudentName))
                    .col(string_len_uniq(Students::AdmissionNumber, 40))
                    .col(date_null(Students::DateOfBirth))
                    .col(string_len_null(Students::Gender, 10))
                    .col(text_null(Students::Address))
                    .col(string_null(Students::ParentName))
                    .col(string_null(Students::ParentPhone))
                    .col(string_null(Students::ParentEmail))
                    .col(string_null(Students::PhotoUrl))
                    .col(boolean(Students::IsActive).default(true))
                    .col(timestamp_with_time_zone(Students::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Students::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_school")
                            .from(Students::Table, Students::SchoolId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_class")
                            .from(Students::Table, Students::ClassId)
                            .to(Classes::Table, Classes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_parent")
                            .from(Students::Table, Students::ParentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_students_school_active")
                    .table(Students::Table)
                    .col(Students::SchoolId)
                    .col(Students::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SectionStudents::Table)
                    .if_not_exists()
                    .col(uuid(SectionStudents::SectionId))
                    .col(uuid(SectionStudents::StudentId))
                    .col(timestamp_with_time_zone(SectionStudents::CreatedAt).default(Expr::current_timestamp()))
                    .primary_key(
                        Index::create()
                            .col(SectionStudents::SectionId)
                            .col(SectionStudents::StudentId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_section_students_section")
                            .from(SectionStudents::Table, SectionStudents::SectionId)
                            .to(Sections::Table, Sections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_section_students_student")
                            .from(SectionStudents::Table, SectionStudents::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            SectionStudents::Table.into_iden(),
            Students::Table.into_iden(),
            Subjects::Table.into_iden(),
            Classes::Table.into_iden(),
            Terms::Table.into_iden(),
            AcademicSessions::Table.into_iden(),
            Sections::Table.into_iden(),
            Users::Table.into_iden(),
            Schools::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Schools {
    Table,
    Id,
    Name,
    ShortCode,
    Address,
    Phone,
    Email,
    LogoUrl,
    IsActive,
    PaystackSubaccountCode,
    PlatformFeePercentage,
    SettlementBank,
    AccountNumber,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    SchoolId,
    Email,
    PasswordHash,
    FullName,
    Phone,
    Role,
    RegistrationId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Sections {
    Table,
    Id,
    SchoolId,
    SectionName,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum AcademicSessions {
    Table,
    Id,
    SchoolId,
    SectionId,
    SessionName,
    StartDate,
    EndDate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Terms {
    Table,
    Id,
    SchoolId,
    SectionId,
    SessionId,
    TermName,
    StartDate,
    EndDate,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Classes {
    Table,
    Id,
    SchoolId,
    SectionId,
    ClassName,
    Description,
    FormTeacherId,
    Capacity,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Subjects {
    Table,
    Id,
    SchoolId,
    SectionId,
    ClassId,
    Name,
    Code,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Students {
    Table,
    Id,
    SchoolId,
    ClassId,
    ParentId,
    StudentName,
    AdmissionNumber,
    DateOfBirth,
    Gender,
    Address,
    ParentName,
    ParentPhone,
    ParentEmail,
    PhotoUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum SectionStudents {
    Table,
    SectionId,
    StudentId,
    CreatedAt,
}
