//! Integration tests for fee resolution, balances and debtor reports.

mod common;

use common::{SchoolFixture, add_fee, date, enrol, fee_input, onboard, setup_db};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use scholaris_core::fees::{FeeScopeKind, PeriodFilter};
use scholaris_db::entities::sea_orm_active_enums::{PaymentMethod, TransactionType};
use scholaris_db::{
    FeeInput, FeeRepoError, FeeRepository, NewPayment, PaymentRepository, ReportRepository,
    TransactionError, TransactionInput, TransactionRepository,
};

fn reports(db: &DatabaseConnection) -> ReportRepository {
    ReportRepository::new(db.clone(), "Fee")
}

fn income(fixture: &SchoolFixture, student_id: Uuid, amount: i64, category: &str) -> TransactionInput {
    TransactionInput {
        section_id: fixture.section_id,
        session_id: Some(fixture.session_id),
        term_id: Some(fixture.term_id),
        student_id: Some(student_id),
        transaction_type: TransactionType::Income,
        amount: Decimal::from(amount),
        payment_method: PaymentMethod::Cash,
        category: Some(category.to_string()),
        description: None,
        reference_number: None,
        transaction_date: date(2025, 10, 1),
        payment_id: None,
    }
}

async fn record(db: &DatabaseConnection, fixture: &SchoolFixture, input: TransactionInput) {
    TransactionRepository::new(db.clone())
        .create(fixture.school.id, fixture.owner.id, input)
        .await
        .expect("Failed to record transaction");
}

#[tokio::test]
async fn test_student_without_fees_owes_nothing() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let pupil = enrol(&db, &fixture, "Chidi", None, vec![]).await;

    let summary = reports(&db)
        .payment_summary(fixture.school.id, pupil.student.id, PeriodFilter::ALL)
        .await
        .expect("Failed to load summary");

    assert_eq!(summary.total_fees, Decimal::ZERO);
    assert_eq!(summary.total_paid, Decimal::ZERO);
    assert_eq!(summary.outstanding(), Decimal::ZERO);
}

#[tokio::test]
async fn test_class_and_school_fees_combine() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let pupil = enrol(&db, &fixture, "Chidi", Some(fixture.class_id), vec![]).await;

    add_fee(
        &db,
        &fixture,
        FeeInput {
            class_id: Some(fixture.class_id),
            ..fee_input(&fixture, FeeScopeKind::Class, 50_000)
        },
    )
    .await;
    add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::School, 10_000)).await;

    let summary = reports(&db)
        .payment_summary(fixture.school.id, pupil.student.id, PeriodFilter::ALL)
        .await
        .unwrap();

    assert_eq!(summary.total_fees, Decimal::from(60_000));
    assert_eq!(summary.balance, Decimal::from(60_000));
}

#[tokio::test]
async fn test_section_and_student_fees_apply_only_to_their_targets() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let member = enrol(&db, &fixture, "Member", None, vec![fixture.section_id]).await;
    let outsider = enrol(&db, &fixture, "Outsider", None, vec![]).await;

    add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::Section, 7_000)).await;
    add_fee(
        &db,
        &fixture,
        FeeInput {
            student_id: Some(outsider.student.id),
            ..fee_input(&fixture, FeeScopeKind::Student, 2_500)
        },
    )
    .await;

    let repo = reports(&db);
    let member_summary = repo
        .payment_summary(fixture.school.id, member.student.id, PeriodFilter::ALL)
        .await
        .unwrap();
    let outsider_summary = repo
        .payment_summary(fixture.school.id, outsider.student.id, PeriodFilter::ALL)
        .await
        .unwrap();

    assert_eq!(member_summary.total_fees, Decimal::from(7_000));
    assert_eq!(outsider_summary.total_fees, Decimal::from(2_500));
}

#[tokio::test]
async fn test_class_fee_requires_class() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;

    let result = FeeRepository::new(db.clone())
        .create(fixture.school.id, fee_input(&fixture, FeeScopeKind::Class, 1_000))
        .await;

    assert!(matches!(result, Err(FeeRepoError::Invalid(_))));
}

#[tokio::test]
async fn test_school_fee_counted_once_per_active_student() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    for name in ["A", "B", "C"] {
        enrol(&db, &fixture, name, None, vec![fixture.section_id]).await;
    }
    add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::School, 10_000)).await;

    let collection = reports(&db).fee_collection(fixture.school.id).await.unwrap();

    assert_eq!(collection.expected, Decimal::from(30_000));
    assert_eq!(collection.collected, Decimal::ZERO);
    assert_eq!(collection.outstanding, Decimal::from(30_000));
}

#[tokio::test]
async fn test_debtor_inclusion_depends_on_balance() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let partial = enrol(&db, &fixture, "Partial", Some(fixture.class_id), vec![fixture.section_id]).await;
    let settled = enrol(&db, &fixture, "Settled", Some(fixture.class_id), vec![fixture.section_id]).await;

    add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::School, 100_000)).await;
    record(&db, &fixture, income(&fixture, partial.student.id, 50_000, "School Fee")).await;
    record(&db, &fixture, income(&fixture, settled.student.id, 100_000, "Tuition fee")).await;

    let debtors = reports(&db).debtors(fixture.school.id, None).await.unwrap();

    assert_eq!(debtors.len(), 1);
    let row = &debtors[0];
    assert_eq!(row.student_id, partial.student.id);
    assert_eq!(row.balance, Decimal::from(50_000));
    assert_eq!(row.section_name, "Primary");
    assert_eq!(row.class_name, "Primary 5");
}

#[tokio::test]
async fn test_debtors_without_class_show_placeholder() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    enrol(&db, &fixture, "Floating", None, vec![]).await;
    add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::School, 5_000)).await;

    let debtors = reports(&db).debtors(fixture.school.id, None).await.unwrap();

    assert_eq!(debtors.len(), 1);
    assert_eq!(debtors[0].class_name, scholaris_db::NOT_ASSIGNED);
    assert_eq!(debtors[0].section_name, scholaris_db::NOT_ASSIGNED);
}

#[tokio::test]
async fn test_non_fee_income_is_not_counted_as_payment() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let pupil = enrol(&db, &fixture, "Chidi", None, vec![]).await;
    add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::School, 20_000)).await;
    record(&db, &fixture, income(&fixture, pupil.student.id, 5_000, "Donation")).await;

    let summary = reports(&db)
        .payment_summary(fixture.school.id, pupil.student.id, PeriodFilter::ALL)
        .await
        .unwrap();

    assert_eq!(summary.total_paid, Decimal::ZERO);
    assert_eq!(summary.balance, Decimal::from(20_000));
}

#[tokio::test]
async fn test_linked_transaction_is_not_double_counted() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let pupil = enrol(&db, &fixture, "Chidi", None, vec![]).await;
    let fee_id = add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::School, 20_000)).await;

    let payment = PaymentRepository::new(db.clone())
        .record_verified(
            NewPayment {
                student_id: pupil.student.id,
                fee_id,
                amount: Decimal::from(8_000),
                reference: "PAY_1_abcdefabcdef".to_string(),
                payment_method: None,
            },
            None,
            serde_json::json!({"status": "success"}),
        )
        .await
        .unwrap();

    record(
        &db,
        &fixture,
        TransactionInput {
            payment_id: Some(payment.id),
            ..income(&fixture, pupil.student.id, 8_000, "School Fee")
        },
    )
    .await;

    let summary = reports(&db)
        .payment_summary(fixture.school.id, pupil.student.id, PeriodFilter::ALL)
        .await
        .unwrap();

    assert_eq!(summary.total_paid, Decimal::from(8_000));
    assert_eq!(summary.balance, Decimal::from(12_000));
    assert_eq!(summary.payment_count, 1);
}

#[tokio::test]
async fn test_payment_link_must_match_student() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let payer = enrol(&db, &fixture, "Payer", None, vec![]).await;
    let other = enrol(&db, &fixture, "Other", None, vec![]).await;
    let fee_id = add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::School, 1_000)).await;

    let payment = PaymentRepository::new(db.clone())
        .record_verified(
            NewPayment {
                student_id: payer.student.id,
                fee_id,
                amount: Decimal::from(1_000),
                reference: "PAY_2_abcdefabcdef".to_string(),
                payment_method: None,
            },
            None,
            serde_json::json!({}),
        )
        .await
        .unwrap();

    let result = TransactionRepository::new(db.clone())
        .create(
            fixture.school.id,
            fixture.owner.id,
            TransactionInput {
                payment_id: Some(payment.id),
                ..income(&fixture, other.student.id, 1_000, "School Fee")
            },
        )
        .await;

    assert!(matches!(result, Err(TransactionError::InvalidPaymentLink { .. })));
}

#[tokio::test]
async fn test_period_filter_limits_fees() {
    let db = setup_db().await;
    let fixture = onboard(&db, "AIA").await;
    let pupil = enrol(&db, &fixture, "Chidi", None, vec![]).await;
    add_fee(&db, &fixture, fee_input(&fixture, FeeScopeKind::School, 4_000)).await;

    let other_term = PeriodFilter {
        session_id: None,
        term_id: Some(Uuid::now_v7().into()),
    };
    let summary = reports(&db)
        .payment_summary(fixture.school.id, pupil.student.id, other_term)
        .await
        .unwrap();

    assert_eq!(summary.total_fees, Decimal::ZERO);
}

#[tokio::test]
async fn test_reports_do_not_leak_across_schools() {
    let db = setup_db().await;
    let aia = onboard(&db, "AIA").await;
    let bhs = onboard(&db, "BHS").await;
    let pupil = enrol(&db, &aia, "Chidi", None, vec![]).await;
    add_fee(&db, &aia, fee_input(&aia, FeeScopeKind::School, 9_000)).await;

    let repo = reports(&db);
    assert!(repo.debtors(bhs.school.id, None).await.unwrap().is_empty());
    assert!(matches!(
        repo.payment_summary(bhs.school.id, pupil.student.id, PeriodFilter::ALL).await,
        Err(scholaris_db::ReportError::StudentNotFound(_))
    ));
}
