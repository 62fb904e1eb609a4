//! Unit tests for planning rules.

use chrono::{NaiveDate, NaiveTime};
use proptest::prelude::*;
use rstest::rstest;
use scholaris_shared::types::{ClassId, UserId};
use uuid::Uuid;

use super::*;

const AUTHOR: PlanActor = PlanActor {
    is_author: true,
    is_reviewer: false,
};
const REVIEWER: PlanActor = PlanActor {
    is_author: false,
    is_reviewer: true,
};

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn slot(start: (u32, u32), end: (u32, u32)) -> TimeSlot {
    TimeSlot::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
}

fn entry(class_id: ClassId, teacher_id: UserId, day: Weekday, period: TimeSlot) -> ScheduledSlot {
    ScheduledSlot {
        id: Uuid::now_v7(),
        class_id,
        teacher_id,
        day,
        slot: period,
    }
}

#[rstest]
#[case(LessonPlanStatus::Draft, LessonPlanStatus::Submitted, AUTHOR)]
#[case(LessonPlanStatus::Submitted, LessonPlanStatus::Draft, AUTHOR)]
#[case(LessonPlanStatus::Rejected, LessonPlanStatus::Submitted, AUTHOR)]
#[case(LessonPlanStatus::Rejected, LessonPlanStatus::Draft, AUTHOR)]
#[case(LessonPlanStatus::Submitted, LessonPlanStatus::Approved, REVIEWER)]
#[case(LessonPlanStatus::Submitted, LessonPlanStatus::Rejected, REVIEWER)]
#[case(LessonPlanStatus::Draft, LessonPlanStatus::Draft, REVIEWER)]
fn test_allowed_transitions(
    #[case] from: LessonPlanStatus,
    #[case] to: LessonPlanStatus,
    #[case] actor: PlanActor,
) {
    assert_eq!(from.transition(to, actor), Ok(to));
}

#[test]
fn test_author_cannot_approve_own_plan() {
    assert_eq!(
        LessonPlanStatus::Submitted.transition(LessonPlanStatus::Approved, AUTHOR),
        Err(PlanningError::NotPermitted("a reviewer"))
    );
}

#[test]
fn test_reviewer_cannot_withdraw_for_author() {
    assert_eq!(
        LessonPlanStatus::Submitted.transition(LessonPlanStatus::Draft, REVIEWER),
        Err(PlanningError::NotPermitted("the author"))
    );
}

#[test]
fn test_draft_cannot_skip_review() {
    let both = PlanActor {
        is_author: true,
        is_reviewer: true,
    };
    assert_eq!(
        LessonPlanStatus::Draft.transition(LessonPlanStatus::Approved, both),
        Err(PlanningError::InvalidTransition {
            from: LessonPlanStatus::Draft,
            to: LessonPlanStatus::Approved,
        })
    );
}

#[test]
fn test_approved_plan_is_final() {
    assert_eq!(
        LessonPlanStatus::Approved.transition(LessonPlanStatus::Approved, REVIEWER),
        Err(PlanningError::Locked)
    );
    assert_eq!(
        LessonPlanStatus::Approved.transition(LessonPlanStatus::Rejected, REVIEWER),
        Err(PlanningError::Locked)
    );
    assert!(!LessonPlanStatus::Approved.is_editable());
    assert!(LessonPlanStatus::Rejected.is_editable());
}

#[test]
fn test_rejection_needs_remarks() {
    assert_eq!(
        LessonPlanStatus::Rejected.check_remarks(Some("  ")),
        Err(PlanningError::RemarksRequired)
    );
    assert_eq!(
        LessonPlanStatus::Rejected.check_remarks(None),
        Err(PlanningError::RemarksRequired)
    );
    assert!(LessonPlanStatus::Rejected.check_remarks(Some("Add objectives")).is_ok());
    assert!(LessonPlanStatus::Approved.check_remarks(None).is_ok());
}

#[test]
fn test_completion_date_follows_status() {
    let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
    let earlier = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();

    assert_eq!(SyllabusStatus::Completed.completion_date(None, today), Some(today));
    assert_eq!(
        SyllabusStatus::Completed.completion_date(Some(earlier), today),
        Some(earlier)
    );
    assert_eq!(SyllabusStatus::InProgress.completion_date(Some(earlier), today), None);
    assert_eq!(SyllabusStatus::Pending.completion_date(None, today), None);
}

#[test]
fn test_slot_must_end_after_start() {
    assert_eq!(TimeSlot::new(at(9, 0), at(9, 0)), Err(PlanningError::EndBeforeStart));
    assert_eq!(TimeSlot::new(at(10, 0), at(9, 0)), Err(PlanningError::EndBeforeStart));
}

#[test]
fn test_back_to_back_slots_do_not_overlap() {
    assert!(!slot((8, 0), (8, 40)).overlaps(&slot((8, 40), (9, 20))));
    assert!(slot((8, 0), (8, 41)).overlaps(&slot((8, 40), (9, 20))));
}

#[test]
fn test_clash_detection() {
    let (jss1, jss2) = (ClassId::new(), ClassId::new());
    let (ada, bola) = (UserId::new(), UserId::new());
    let maths = entry(jss1, ada, Weekday::Monday, slot((8, 0), (8, 40)));
    let existing = [maths];

    let same_class = entry(jss1, bola, Weekday::Monday, slot((8, 20), (9, 0)));
    assert_eq!(same_class.find_clash(&existing), Some(Clash::Class(maths.id)));

    let same_teacher = entry(jss2, ada, Weekday::Monday, slot((8, 20), (9, 0)));
    assert_eq!(same_teacher.find_clash(&existing), Some(Clash::Teacher(maths.id)));

    let other_day = entry(jss1, ada, Weekday::Tuesday, slot((8, 0), (8, 40)));
    assert_eq!(other_day.find_clash(&existing), None);

    let unrelated = entry(jss2, bola, Weekday::Monday, slot((8, 0), (8, 40)));
    assert_eq!(unrelated.find_clash(&existing), None);

    let mut moved = maths;
    moved.slot = slot((8, 10), (8, 50));
    assert_eq!(moved.find_clash(&existing), None);
}

#[test]
fn test_due_date() {
    let set = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    assert!(check_due_date(set, set).is_ok());
    assert_eq!(
        check_due_date(set, set.pred_opt().unwrap()),
        Err(PlanningError::DueBeforeAssigned)
    );
}

proptest! {
    /// Overlap is symmetric and every slot overlaps itself.
    #[test]
    fn prop_overlap_symmetric(a in 0u32..1430, len_a in 1u32..10, b in 0u32..1430, len_b in 1u32..10) {
        let make = |start: u32, len: u32| {
            TimeSlot::new(
                NaiveTime::from_num_seconds_from_midnight_opt(start * 60, 0).unwrap(),
                NaiveTime::from_num_seconds_from_midnight_opt((start + len) * 60, 0).unwrap(),
            )
            .unwrap()
        };
        let (x, y) = (make(a, len_a), make(b, len_b));
        prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
        prop_assert!(x.overlaps(&x));
    }
}
