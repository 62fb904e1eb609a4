//! Shared fixtures for repository integration tests.
//!
//! Each test gets its own in-memory SQLite database with all migrations
//! applied. The pool holds a single connection so the database lives as
//! long as the pool.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use scholaris_core::fees::FeeScopeKind;
use scholaris_db::entities::{schools, sea_orm_active_enums::UserRole, users};
use scholaris_db::migration::Migrator;
use scholaris_db::{
    AcademicRepository, ClassInput, ClassRepository, CreateStudentInput, CreateUserInput,
    FeeInput, FeeRepository, OnboardSchoolInput, SchoolRepository, SectionInput,
    SectionRepository, SessionInput, StudentRepository, StudentWithSections, TermInput,
    UserRepository,
};

pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// A school with one section, an active session and term, and one class.
pub struct SchoolFixture {
    pub school: schools::Model,
    pub owner: users::Model,
    pub section_id: Uuid,
    pub session_id: Uuid,
    pub term_id: Uuid,
    pub class_id: Uuid,
}

pub async fn onboard(db: &DatabaseConnection, short_code: &str) -> SchoolFixture {
    let (school, owner) = SchoolRepository::new(db.clone())
        .onboard(OnboardSchoolInput {
            name: format!("{short_code} Academy"),
            short_code: short_code.to_string(),
            address: None,
            phone: None,
            email: None,
            owner_name: "Ada Owner".to_string(),
            owner_email: format!("owner-{}@example.com", Uuid::new_v4()),
            owner_password_hash: "$argon2id$test_hash".to_string(),
        })
        .await
        .expect("Failed to onboard school");

    let section = SectionRepository::new(db.clone())
        .create(
            school.id,
            SectionInput {
                section_name: "Primary".to_string(),
                description: None,
                is_active: true,
            },
        )
        .await
        .expect("Failed to create section");

    let academic = AcademicRepository::new(db.clone());
    let session = academic
        .create_session(
            school.id,
            SessionInput {
                section_id: section.id,
                session_name: "2025/2026".to_string(),
                start_date: date(2025, 9, 1),
                end_date: date(2026, 7, 31),
                is_active: true,
            },
        )
        .await
        .expect("Failed to create session");
    let term = academic
        .create_term(
            school.id,
            TermInput {
                session_id: session.id,
                term_name: "First Term".to_string(),
                start_date: date(2025, 9, 1),
                end_date: date(2025, 12, 15),
                is_active: true,
            },
        )
        .await
        .expect("Failed to create term");

    let class = ClassRepository::new(db.clone())
        .create(
            school.id,
            ClassInput {
                section_id: section.id,
                class_name: "Primary 5".to_string(),
                description: None,
                form_teacher_id: None,
                capacity: Some(40),
                is_active: true,
            },
        )
        .await
        .expect("Failed to create class");

    SchoolFixture {
        school,
        owner,
        section_id: section.id,
        session_id: session.id,
        term_id: term.id,
        class_id: class.id,
    }
}

pub async fn enrol(
    db: &DatabaseConnection,
    fixture: &SchoolFixture,
    name: &str,
    class_id: Option<Uuid>,
    section_ids: Vec<Uuid>,
) -> StudentWithSections {
    StudentRepository::new(db.clone())
        .create(
            fixture.school.id,
            CreateStudentInput {
                class_id,
                student_name: name.to_string(),
                parent_name: Some(format!("Parent of {name}")),
                parent_phone: Some("08000000000".to_string()),
                section_ids,
                ..CreateStudentInput::default()
            },
        )
        .await
        .expect("Failed to enrol student")
}

pub async fn add_user(
    db: &DatabaseConnection,
    fixture: &SchoolFixture,
    role: UserRole,
) -> users::Model {
    UserRepository::new(db.clone())
        .create(CreateUserInput {
            school_id: fixture.school.id,
            email: format!("user-{}@example.com", Uuid::new_v4()),
            password_hash: "$argon2id$test_hash".to_string(),
            full_name: "Staff Member".to_string(),
            phone: None,
            role,
        })
        .await
        .expect("Failed to create user")
}

pub fn fee_input(fixture: &SchoolFixture, scope: FeeScopeKind, amount: i64) -> FeeInput {
    FeeInput {
        section_id: fixture.section_id,
        session_id: fixture.session_id,
        term_id: fixture.term_id,
        fee_scope: scope,
        class_id: None,
        student_id: None,
        fee_name: format!("{scope} fee"),
        amount: Decimal::from(amount),
        description: None,
        is_active: true,
    }
}

pub async fn add_fee(db: &DatabaseConnection, fixture: &SchoolFixture, input: FeeInput) -> Uuid {
    FeeRepository::new(db.clone())
        .create(fixture.school.id, input)
        .await
        .expect("Failed to create fee")
        .id
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
