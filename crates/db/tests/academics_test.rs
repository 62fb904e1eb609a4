//! Integration tests for exam results, notifications and attendance.

mod common;

use common::{SchoolFixture, add_user, date, enrol, onboard, setup_db};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use scholaris_db::entities::{exams, sea_orm_active_enums::{AttendanceStatus, UserRole}};
use scholaris_db::{
    AttendanceError, AttendanceMark, AttendanceRepository, CreateStudentInput, ExamError,
    ExamInput, ExamRepository, NotificationRepository, ResultInput, StudentRepository,
    SubjectInput, SubjectRepository,
};
use scholaris_shared::types::PageRequest;

async fn create_exam(db: &DatabaseConnection, fixture: &SchoolFixture) -> exams::Model {
    let subject = SubjectRepository::new(db.clone())
        .create(
            fixture.school.id,
            SubjectInput {
                section_id: fixture.section_id,
                class_id: Some(fixture.class_id),
                name: "Mathematics".to_string(),
                code: Some("MTH".to_string()),
            },
        )
        .await
        .expect("Failed to create subject");

    ExamRepository::new(db.clone())
        .create(
            fixture.school.id,
            fixture.owner.id,
            ExamInput {
                class_id: fixture.class_id,
                subject_id: subject.id,
                session_id: fixture.session_id,
                term_id: fixture.term_id,
                title: "Mid-term Test".to_string(),
                max_score: Decimal::from(100),
                exam_date: Some(date(2025, 10, 20)),
            },
        )
        .await
        .expect("Failed to create exam")
}

fn score(student_id: Uuid, value: i64) -> ResultInput {
    ResultInput {
        student_id,
        score: Decimal::from(value),
        remark: None,
    }
}

#[tokio::test]
async fn test_saving_results_twice_keeps_one_row_per_student() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let pupil = enrol(&db, &fixture, "Chidi", Some(fixture.class_id), vec![]).await;
    let exam = create_exam(&db, &fixture).await;
    let repo = ExamRepository::new(db.clone());

    repo.save_results(fixture.school.id, exam.id, fixture.owner.id, vec![score(pupil.student.id, 72)])
        .await
        .unwrap();
    let second = repo
        .save_results(fixture.school.id, exam.id, fixture.owner.id, vec![score(pupil.student.id, 55)])
        .await
        .unwrap();

    let stored = repo.results(exam.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, second[0].id);
    assert_eq!(stored[0].score, Decimal::from(55));
    assert_eq!(stored[0].grade, "C");
}

#[tokio::test]
async fn test_out_of_range_score_rejects_batch() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let a = enrol(&db, &fixture, "A", Some(fixture.class_id), vec![]).await;
    let b = enrol(&db, &fixture, "B", Some(fixture.class_id), vec![]).await;
    let exam = create_exam(&db, &fixture).await;
    let repo = ExamRepository::new(db.clone());

    let result = repo
        .save_results(
            fixture.school.id,
            exam.id,
            fixture.owner.id,
            vec![score(a.student.id, 80), score(b.student.id, 101)],
        )
        .await;

    assert!(matches!(result, Err(ExamError::InvalidScore { student_id, .. }) if student_id == b.student.id));
    assert!(repo.results(exam.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_parents_are_notified_of_results() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let parent = add_user(&db, &fixture, UserRole::Parent).await;
    let child = StudentRepository::new(db.clone())
        .create(
            fixture.school.id,
            CreateStudentInput {
                class_id: Some(fixture.class_id),
                parent_id: Some(parent.id),
                student_name: "Chidi".to_string(),
                ..CreateStudentInput::default()
            },
        )
        .await
        .unwrap();
    let orphan = enrol(&db, &fixture, "No Parent", Some(fixture.class_id), vec![]).await;
    let exam = create_exam(&db, &fixture).await;

    ExamRepository::new(db.clone())
        .save_results(
            fixture.school.id,
            exam.id,
            fixture.owner.id,
            vec![score(child.student.id, 90), score(orphan.student.id, 30)],
        )
        .await
        .unwrap();

    let notifications = NotificationRepository::new(db.clone());
    let page = notifications
        .list(parent.id, false, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let note = &page.items[0];
    assert_eq!(note.kind, "exam_result_published");
    assert_eq!(note.title, "New Exam Result Published");
    assert_eq!(
        note.message,
        "Exam result for 'Chidi' in 'Mathematics' has been published."
    );
    assert_eq!(notifications.unread_count(parent.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_repeated_student_in_batch_notifies_parent_once() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let parent = add_user(&db, &fixture, UserRole::Parent).await;
    let child = StudentRepository::new(db.clone())
        .create(
            fixture.school.id,
            CreateStudentInput {
                class_id: Some(fixture.class_id),
                parent_id: Some(parent.id),
                student_name: "Zainab".to_string(),
                ..CreateStudentInput::default()
            },
        )
        .await
        .unwrap();
    let exam = create_exam(&db, &fixture).await;
    let repo = ExamRepository::new(db.clone());

    let saved = repo
        .save_results(
            fixture.school.id,
            exam.id,
            fixture.owner.id,
            vec![score(child.student.id, 48), score(child.student.id, 74)],
        )
        .await
        .unwrap();

    assert_eq!(saved.len(), 1);
    let stored = repo.results(exam.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].score, Decimal::from(74));
    assert_eq!(stored[0].grade, "A");
    let page = NotificationRepository::new(db.clone())
        .list(parent.id, false, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_attendance_upserts_per_student_and_day() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let a = enrol(&db, &fixture, "A", Some(fixture.class_id), vec![fixture.section_id]).await;
    let b = enrol(&db, &fixture, "B", Some(fixture.class_id), vec![fixture.section_id]).await;
    let repo = AttendanceRepository::new(db.clone());
    let day = date(2025, 10, 6);

    let mark = |student_id, status| AttendanceMark {
        student_id,
        status,
        remark: None,
    };

    repo.mark(
        fixture.school.id,
        fixture.class_id,
        day,
        fixture.owner.id,
        vec![mark(a.student.id, AttendanceStatus::Absent), mark(b.student.id, AttendanceStatus::Present)],
    )
    .await
    .unwrap();
    repo.mark(
        fixture.school.id,
        fixture.class_id,
        day,
        fixture.owner.id,
        vec![mark(a.student.id, AttendanceStatus::Late)],
    )
    .await
    .unwrap();

    let register = repo.for_class(fixture.school.id, fixture.class_id, day).await.unwrap();
    assert_eq!(register.len(), 2);

    let summary = repo
        .section_summary(fixture.school.id, fixture.section_id, day)
        .await
        .unwrap();
    assert_eq!(summary.total_students, 2);
    assert_eq!(summary.present_count, 1);
    assert_eq!(summary.late_count, 1);
    assert_eq!(summary.absent_count, 0);
    assert_eq!(summary.recorded_count, 2);
    assert_eq!(summary.percentage_present, Decimal::from(50));
}

#[tokio::test]
async fn test_attendance_rejects_students_outside_class() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let outsider = enrol(&db, &fixture, "Outsider", None, vec![]).await;

    let result = AttendanceRepository::new(db.clone())
        .mark(
            fixture.school.id,
            fixture.class_id,
            date(2025, 10, 6),
            fixture.owner.id,
            vec![AttendanceMark {
                student_id: outsider.student.id,
                status: AttendanceStatus::Present,
                remark: None,
            }],
        )
        .await;

    assert!(matches!(result, Err(AttendanceError::StudentNotInClass(_))));
}
