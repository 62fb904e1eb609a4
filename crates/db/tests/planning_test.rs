//! Integration tests for lesson plans, syllabus coverage, timetables and homework.

mod common;

use chrono::{Duration, NaiveTime, Utc};
use common::{SchoolFixture, add_user, date, onboard, setup_db};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use scholaris_core::planning::{LessonPlanStatus, PlanningError, SyllabusStatus, Weekday};
use scholaris_db::entities::sea_orm_active_enums::{self, UserRole};
use scholaris_db::{
    ClassInput, ClassRepository, HomeworkError, HomeworkInput, HomeworkRepository,
    LessonPlanError, LessonPlanFilter, LessonPlanInput, LessonPlanRepository, LessonPlanReview,
    SubjectInput, SubjectRepository, SyllabusInput, SyllabusRepository, TimetableError,
    TimetableFilter, TimetableInput, TimetableRepository,
};
use scholaris_shared::types::PageRequest;

async fn add_subject(
    db: &DatabaseConnection,
    fixture: &SchoolFixture,
    class_id: Option<Uuid>,
) -> Uuid {
    SubjectRepository::new(db.clone())
        .create(
            fixture.school.id,
            SubjectInput {
                section_id: fixture.section_id,
                class_id,
                name: "Basic Science".to_string(),
                code: None,
            },
        )
        .await
        .expect("Failed to create subject")
        .id
}

async fn add_class(db: &DatabaseConnection, fixture: &SchoolFixture, name: &str) -> Uuid {
    ClassRepository::new(db.clone())
        .create(
            fixture.school.id,
            ClassInput {
                section_id: fixture.section_id,
                class_name: name.to_string(),
                description: None,
                form_teacher_id: None,
                capacity: None,
                is_active: true,
            },
        )
        .await
        .expect("Failed to create class")
        .id
}

fn plan(fixture: &SchoolFixture, subject_id: Uuid, status: LessonPlanStatus) -> LessonPlanInput {
    LessonPlanInput {
        class_id: fixture.class_id,
        subject_id,
        title: "Photosynthesis".to_string(),
        content: "Leaves, light and chlorophyll.".to_string(),
        week_number: 3,
        status,
    }
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

fn lesson(
    class_id: Uuid,
    subject_id: Uuid,
    teacher_id: Uuid,
    day: Weekday,
    start: (u32, u32),
    end: (u32, u32),
) -> TimetableInput {
    TimetableInput {
        class_id,
        subject_id,
        teacher_id,
        day,
        start_time: at(start.0, start.1),
        end_time: at(end.0, end.1),
    }
}

#[tokio::test]
async fn test_lesson_plan_review_workflow() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let teacher = add_user(&db, &fixture, UserRole::Teacher).await;
    let subject_id = add_subject(&db, &fixture, Some(fixture.class_id)).await;
    let repo = LessonPlanRepository::new(db.clone());
    let school_id = fixture.school.id;

    let created = repo
        .create(school_id, teacher.id, plan(&fixture, subject_id, LessonPlanStatus::Submitted))
        .await
        .unwrap();
    assert_eq!(created.status, sea_orm_active_enums::LessonPlanStatus::Submitted);
    assert_eq!(created.section_id, fixture.section_id);
    assert_eq!(created.teacher_id, teacher.id);

    let blank = repo
        .review(
            school_id,
            created.id,
            fixture.owner.id,
            LessonPlanReview {
                status: LessonPlanStatus::Rejected,
                remarks: Some("  ".to_string()),
            },
        )
        .await;
    assert!(matches!(
        blank,
        Err(LessonPlanError::Planning(PlanningError::RemarksRequired))
    ));

    let rejected = repo
        .review(
            school_id,
            created.id,
            fixture.owner.id,
            LessonPlanReview {
                status: LessonPlanStatus::Rejected,
                remarks: Some("Add a practical activity".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, sea_orm_active_enums::LessonPlanStatus::Rejected);
    assert_eq!(rejected.reviewed_by, Some(fixture.owner.id));

    repo.update(
        school_id,
        created.id,
        teacher.id,
        plan(&fixture, subject_id, LessonPlanStatus::Submitted),
    )
    .await
    .unwrap();
    let approved = repo
        .review(
            school_id,
            created.id,
            fixture.owner.id,
            LessonPlanReview {
                status: LessonPlanStatus::Approved,
                remarks: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(approved.status, sea_orm_active_enums::LessonPlanStatus::Approved);

    let edit = repo
        .update(
            school_id,
            created.id,
            teacher.id,
            plan(&fixture, subject_id, LessonPlanStatus::Draft),
        )
        .await;
    assert!(matches!(edit, Err(LessonPlanError::Planning(PlanningError::Locked))));

    let removal = repo.delete(school_id, created.id, teacher.id, false).await;
    assert!(matches!(removal, Err(LessonPlanError::Planning(PlanningError::Locked))));
    repo.delete(school_id, created.id, fixture.owner.id, true)
        .await
        .unwrap();
    assert!(repo.find(school_id, created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_lesson_plan_changes_are_limited_to_the_author() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let author = add_user(&db, &fixture, UserRole::Teacher).await;
    let colleague = add_user(&db, &fixture, UserRole::Teacher).await;
    let subject_id = add_subject(&db, &fixture, None).await;
    let repo = LessonPlanRepository::new(db.clone());

    let draft = repo
        .create(fixture.school.id, author.id, plan(&fixture, subject_id, LessonPlanStatus::Draft))
        .await
        .unwrap();

    let edit = repo
        .update(
            fixture.school.id,
            draft.id,
            colleague.id,
            plan(&fixture, subject_id, LessonPlanStatus::Submitted),
        )
        .await;
    assert!(matches!(edit, Err(LessonPlanError::NotAuthor)));

    // Reviewing a draft is not a step in the workflow.
    let review = repo
        .review(
            fixture.school.id,
            draft.id,
            fixture.owner.id,
            LessonPlanReview {
                status: LessonPlanStatus::Approved,
                remarks: None,
            },
        )
        .await;
    assert!(matches!(
        review,
        Err(LessonPlanError::Planning(PlanningError::InvalidTransition { .. }))
    ));

    let created_approved = repo
        .create(
            fixture.school.id,
            author.id,
            plan(&fixture, subject_id, LessonPlanStatus::Approved),
        )
        .await;
    assert!(matches!(created_approved, Err(LessonPlanError::Planning(_))));

    let mine = repo
        .list(
            fixture.school.id,
            &LessonPlanFilter {
                teacher_id: Some(author.id),
                ..LessonPlanFilter::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(mine.total, 1);
}

#[tokio::test]
async fn test_lesson_plan_rejects_subject_of_another_class() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let other_class = add_class(&db, &fixture, "Primary 6").await;
    let subject_id = add_subject(&db, &fixture, Some(other_class)).await;

    let result = LessonPlanRepository::new(db.clone())
        .create(
            fixture.school.id,
            fixture.owner.id,
            plan(&fixture, subject_id, LessonPlanStatus::Submitted),
        )
        .await;
    assert!(matches!(result, Err(LessonPlanError::InvalidReference(_))));
}

#[tokio::test]
async fn test_syllabus_completion_date_follows_status() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let subject_id = add_subject(&db, &fixture, Some(fixture.class_id)).await;
    let repo = SyllabusRepository::new(db.clone());
    let topic = |status, completion_date| SyllabusInput {
        class_id: fixture.class_id,
        subject_id,
        topic: "Fractions".to_string(),
        description: None,
        status,
        completion_date,
    };

    let pending = repo
        .create(fixture.school.id, topic(SyllabusStatus::Pending, Some(date(2025, 10, 1))))
        .await
        .unwrap();
    assert_eq!(pending.completion_date, None);
    assert_eq!(pending.section_id, fixture.section_id);

    let completed = repo
        .update(fixture.school.id, pending.id, topic(SyllabusStatus::Completed, None))
        .await
        .unwrap();
    assert_eq!(completed.completion_date, Some(Utc::now().date_naive()));

    let back = repo
        .update(fixture.school.id, pending.id, topic(SyllabusStatus::InProgress, None))
        .await
        .unwrap();
    assert_eq!(back.completion_date, None);

    let dated = repo
        .create(fixture.school.id, topic(SyllabusStatus::Completed, Some(date(2025, 11, 3))))
        .await
        .unwrap();
    assert_eq!(dated.completion_date, Some(date(2025, 11, 3)));
}

#[tokio::test]
async fn test_timetable_rejects_clashing_lessons() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let teacher = add_user(&db, &fixture, UserRole::Teacher).await;
    let colleague = add_user(&db, &fixture, UserRole::Teacher).await;
    let other_class = add_class(&db, &fixture, "Primary 6").await;
    let subject_id = add_subject(&db, &fixture, None).await;
    let repo = TimetableRepository::new(db.clone());
    let school_id = fixture.school.id;
    let class_id = fixture.class_id;

    let first = repo
        .create(school_id, lesson(class_id, subject_id, teacher.id, Weekday::Monday, (8, 0), (9, 0)))
        .await
        .unwrap();

    let teacher_busy = repo
        .create(
            school_id,
            lesson(other_class, subject_id, teacher.id, Weekday::Monday, (8, 30), (9, 30)),
        )
        .await;
    assert!(matches!(teacher_busy, Err(TimetableError::TeacherBusy(id)) if id == first.id));

    let class_busy = repo
        .create(
            school_id,
            lesson(class_id, subject_id, colleague.id, Weekday::Monday, (8, 45), (9, 15)),
        )
        .await;
    assert!(matches!(class_busy, Err(TimetableError::ClassBusy(id)) if id == first.id));

    repo.create(school_id, lesson(class_id, subject_id, teacher.id, Weekday::Monday, (9, 0), (10, 0)))
        .await
        .unwrap();
    repo.create(school_id, lesson(class_id, subject_id, teacher.id, Weekday::Tuesday, (8, 0), (9, 0)))
        .await
        .unwrap();

    // Moving an entry within its own period is not a clash with itself.
    repo.update(
        school_id,
        first.id,
        lesson(class_id, subject_id, teacher.id, Weekday::Monday, (8, 0), (8, 50)),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_timetable_validates_period_and_teacher() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let teacher = add_user(&db, &fixture, UserRole::Teacher).await;
    let parent = add_user(&db, &fixture, UserRole::Parent).await;
    let subject_id = add_subject(&db, &fixture, None).await;
    let repo = TimetableRepository::new(db.clone());

    let backwards = repo
        .create(
            fixture.school.id,
            lesson(fixture.class_id, subject_id, teacher.id, Weekday::Friday, (10, 0), (9, 0)),
        )
        .await;
    assert!(matches!(
        backwards,
        Err(TimetableError::Planning(PlanningError::EndBeforeStart))
    ));

    let not_a_teacher = repo
        .create(
            fixture.school.id,
            lesson(fixture.class_id, subject_id, parent.id, Weekday::Friday, (9, 0), (10, 0)),
        )
        .await;
    assert!(matches!(not_a_teacher, Err(TimetableError::InvalidReference(_))));
}

#[tokio::test]
async fn test_timetable_lists_by_day_then_start() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let teacher = add_user(&db, &fixture, UserRole::Teacher).await;
    let subject_id = add_subject(&db, &fixture, None).await;
    let repo = TimetableRepository::new(db.clone());
    let class_id = fixture.class_id;

    for (day, start) in [
        (Weekday::Wednesday, 8),
        (Weekday::Monday, 11),
        (Weekday::Monday, 9),
    ] {
        repo.create(
            fixture.school.id,
            lesson(class_id, subject_id, teacher.id, day, (start, 0), (start + 1, 0)),
        )
        .await
        .unwrap();
    }

    let entries = repo
        .list(
            fixture.school.id,
            &TimetableFilter {
                teacher_id: Some(teacher.id),
                ..TimetableFilter::default()
            },
        )
        .await
        .unwrap();
    let order: Vec<(Weekday, NaiveTime)> = entries
        .iter()
        .map(|e| (e.day_of_week.into(), e.start_time))
        .collect();
    assert_eq!(
        order,
        vec![
            (Weekday::Monday, at(9, 0)),
            (Weekday::Monday, at(11, 0)),
            (Weekday::Wednesday, at(8, 0)),
        ]
    );
}

#[tokio::test]
async fn test_homework_due_date_and_ownership() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let teacher = add_user(&db, &fixture, UserRole::Teacher).await;
    let colleague = add_user(&db, &fixture, UserRole::Teacher).await;
    let subject_id = add_subject(&db, &fixture, Some(fixture.class_id)).await;
    let repo = HomeworkRepository::new(db.clone());
    let today = Utc::now().date_naive();
    let work = |due_date| HomeworkInput {
        class_id: fixture.class_id,
        subject_id,
        title: "Read chapter 4".to_string(),
        description: None,
        due_date,
    };

    let overdue = repo
        .create(fixture.school.id, teacher.id, work(today - Duration::days(1)))
        .await;
    assert!(matches!(
        overdue,
        Err(HomeworkError::Planning(PlanningError::DueBeforeAssigned))
    ));

    let set = repo
        .create(fixture.school.id, teacher.id, work(today + Duration::days(7)))
        .await
        .unwrap();
    assert_eq!(set.assigned_on, today);

    let foreign = repo
        .update(fixture.school.id, set.id, colleague.id, false, work(today + Duration::days(3)))
        .await;
    assert!(matches!(foreign, Err(HomeworkError::NotAuthor)));

    let moved = repo
        .update(fixture.school.id, set.id, fixture.owner.id, true, work(today + Duration::days(3)))
        .await
        .unwrap();
    assert_eq!(moved.due_date, today + Duration::days(3));
    assert_eq!(moved.assigned_on, today);

    repo.delete(fixture.school.id, set.id, teacher.id, false)
        .await
        .unwrap();
}
