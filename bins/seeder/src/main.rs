//! Database seeder for Scholaris development and testing.
//!
//! Seeds a demo school (`AIA`) with staff, a parent, classes, an active
//! session and term, students, subjects and fees.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use scholaris_core::auth::hash_password;
use scholaris_core::fees::FeeScopeKind;
use scholaris_db::entities::sea_orm_active_enums::UserRole;
use scholaris_db::{
    AcademicRepository, ClassInput, ClassRepository, CreateStudentInput, CreateUserInput,
    FeeInput, FeeRepository, OnboardSchoolInput, SchoolRepository, SectionInput,
    SectionRepository, SessionInput, StudentRepository, SubjectInput, SubjectRepository,
    TermInput, UserRepository,
};

/// Short code of the demo school.
const DEMO_SHORT_CODE: &str = "AIA";
/// Password of every seeded account.
const DEMO_PASSWORD: &str = "password123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SCHOLARIS__DATABASE__URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .context("DATABASE_URL must be set")?;
    let db = scholaris_db::connect(&database_url).await?;

    println!("Seeding database...");

    if SchoolRepository::new(db.clone())
        .find_by_short_code(DEMO_SHORT_CODE)
        .await?
        .is_some()
    {
        println!("  School {DEMO_SHORT_CODE} already exists, nothing to do");
        return Ok(());
    }

    seed_demo_school(&db).await?;

    println!("Seeding complete!");
    println!();
    println!("Demo credentials (password: {DEMO_PASSWORD}):");
    println!("  Proprietor: owner@aia.test");
    println!("  Bursar:     bursar@aia.test");
    println!("  Teacher:    teacher@aia.test");
    println!("  Parent:     parent@aia.test");

    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid seed date")
}

async fn seed_demo_school(db: &DatabaseConnection) -> anyhow::Result<()> {
    let password_hash = hash_password(DEMO_PASSWORD)?;

    let (school, owner) = SchoolRepository::new(db.clone())
        .onboard(OnboardSchoolInput {
            name: "Al-Iman Academy".to_string(),
            short_code: DEMO_SHORT_CODE.to_string(),
            address: Some("12 School Road, Ibadan".to_string()),
            phone: Some("08012345678".to_string()),
            email: Some("info@aia.test".to_string()),
            owner_name: "Amina Bello".to_string(),
            owner_email: "owner@aia.test".to_string(),
            owner_password_hash: password_hash.clone(),
        })
        .await?;
    println!(
        "  Created school {} ({})",
        school.name,
        owner.registration_id.as_deref().unwrap_or("-")
    );

    let users = UserRepository::new(db.clone());
    let mut parent_id = None;
    for (email, name, role) in [
        ("bursar@aia.test", "Kunle Bursar", UserRole::Bursar),
        ("teacher@aia.test", "Grace Teacher", UserRole::Teacher),
        ("parent@aia.test", "Musa Parent", UserRole::Parent),
    ] {
        let user = users
            .create(CreateUserInput {
                school_id: school.id,
                email: email.to_string(),
                password_hash: password_hash.clone(),
                full_name: name.to_string(),
                phone: None,
                role,
            })
            .await?;
        println!("  Created user {}", user.registration_id.as_deref().unwrap_or(email));
        if role == UserRole::Parent {
            parent_id = Some(user.id);
        }
    }

    let sections = SectionRepository::new(db.clone());
    let primary = sections
        .create(
            school.id,
            SectionInput {
                section_name: "Primary".to_string(),
                description: Some("Primary 1 to 6".to_string()),
                is_active: true,
            },
        )
        .await?;
    let secondary = sections
        .create(
            school.id,
            SectionInput {
                section_name: "Secondary".to_string(),
                description: Some("JSS 1 to SSS 3".to_string()),
                is_active: true,
            },
        )
        .await?;
    println!("  Created 2 sections");

    let academic = AcademicRepository::new(db.clone());
    let session = academic
        .create_session(
            school.id,
            SessionInput {
                section_id: primary.id,
                session_name: "2025/2026".to_string(),
                start_date: date(2025, 9, 8)?,
                end_date: date(2026, 7, 24)?,
                is_active: true,
            },
        )
        .await?;
    let term = academic
        .create_term(
            school.id,
            TermInput {
                session_id: session.id,
                term_name: "First Term".to_string(),
                start_date: date(2025, 9, 8)?,
                end_date: date(2025, 12, 12)?,
                is_active: true,
            },
        )
        .await?;
    println!("  Created session {} / {}", session.session_name, term.term_name);

    let classes = ClassRepository::new(db.clone());
    let primary_five = classes
        .create(
            school.id,
            ClassInput {
                section_id: primary.id,
                class_name: "Primary 5".to_string(),
                description: None,
                form_teacher_id: None,
                capacity: Some(35),
                is_active: true,
            },
        )
        .await?;
    let jss_one = classes
        .create(
            school.id,
            ClassInput {
                section_id: secondary.id,
                class_name: "JSS 1".to_string(),
                description: None,
                form_teacher_id: None,
                capacity: Some(40),
                is_active: true,
            },
        )
        .await?;
    println!("  Created 2 classes");

    let subjects = SubjectRepository::new(db.clone());
    for (name, code) in [("Mathematics", "MTH"), ("English Language", "ENG"), ("Basic Science", "BSC")] {
        subjects
            .create(
                school.id,
                SubjectInput {
                    section_id: primary.id,
                    class_id: None,
                    name: name.to_string(),
                    code: Some(code.to_string()),
                },
            )
            .await?;
    }
    println!("  Created 3 subjects");

    let students = StudentRepository::new(db.clone());
    let roster: [(&str, Uuid, Uuid, Option<Uuid>); 3] = [
        ("Zainab Musa", primary_five.id, primary.id, parent_id),
        ("Ibrahim Musa", jss_one.id, secondary.id, parent_id),
        ("Chidi Okafor", primary_five.id, primary.id, None),
    ];
    for (name, class_id, section_id, parent) in roster {
        let created = students
            .create(
                school.id,
                CreateStudentInput {
                    class_id: Some(class_id),
                    parent_id: parent,
                    student_name: name.to_string(),
                    parent_name: parent.map(|_| "Musa Parent".to_string()),
                    section_ids: vec![section_id],
                    ..CreateStudentInput::default()
                },
            )
            .await?;
        println!(
            "  Enrolled {} ({})",
            created.student.student_name, created.student.admission_number
        );
    }

    let fees = FeeRepository::new(db.clone());
    let fee_rows = [
        ("Development Levy", FeeScopeKind::School, None, Decimal::new(10_000, 0)),
        ("Primary 5 Tuition", FeeScopeKind::Class, Some(primary_five.id), Decimal::new(50_000, 0)),
    ];
    for (name, scope, class_id, amount) in fee_rows {
        fees.create(
            school.id,
            FeeInput {
                section_id: primary.id,
                session_id: session.id,
                term_id: term.id,
                fee_scope: scope,
                class_id,
                student_id: None,
                fee_name: name.to_string(),
                amount,
                description: None,
                is_active: true,
            },
        )
        .await?;
    }
    println!("  Created 2 fees");

    Ok(())
}
