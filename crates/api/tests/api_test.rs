//! HTTP-level tests against an in-memory SQLite database and a fake gateway.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use scholaris_api::{ApiSettings, AppState, create_router};
use scholaris_core::fees::FeeScopeKind;
use scholaris_core::payment::{
    GatewayError, InitializeRequest, InitializeResponse, PaymentGateway, VerifyResponse,
};
use scholaris_db::migration::Migrator;
use scholaris_db::{
    AcademicRepository, ClassInput, ClassRepository, CreateStudentInput, FeeInput,
    FeeRepository, SectionInput, SectionRepository, SessionInput, StudentRepository,
    SubjectInput, SubjectRepository, TermInput,
};
use scholaris_shared::{JwtConfig, JwtService};

/// Gateway double that remembers initialized checkouts and settles them
/// with a fixed status.
struct FakeGateway {
    status: &'static str,
    checkouts: Mutex<HashMap<String, (i64, Value)>>,
}

impl FakeGateway {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            checkouts: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize(
        &self,
        request: InitializeRequest,
    ) -> Result<InitializeResponse, GatewayError> {
        self.checkouts.lock().unwrap().insert(
            request.reference.clone(),
            (request.amount_minor, request.metadata),
        );
        Ok(InitializeResponse {
            authorization_url: format!("https://checkout.test/{}", request.reference),
            access_code: "access-test".to_string(),
            reference: request.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifyResponse, GatewayError> {
        let (amount_minor, metadata) = self
            .checkouts
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected("Transaction reference not found".into()))?;
        Ok(VerifyResponse {
            status: self.status.to_string(),
            reference: reference.to_string(),
            amount_minor,
            channel: Some("card".to_string()),
            paid_at: None,
            message: Some(if self.status == "success" {
                "Approved".to_string()
            } else {
                "Transaction abandoned".to_string()
            }),
            metadata,
            raw: json!({ "status": self.status }),
        })
    }
}

struct TestApp {
    router: Router,
    db: DatabaseConnection,
}

async fn setup(gateway: FakeGateway) -> TestApp {
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

    let state = AppState {
        db: Arc::new(db.clone()),
        jwt_service: Arc::new(JwtService::new(JwtConfig {
            secret: "api-test-secret".to_string(),
            access_token_expires_minutes: 15,
        })),
        gateway: Arc::new(gateway),
        settings: Arc::new(ApiSettings::default()),
    };

    TestApp {
        router: create_router(state),
        db,
    }
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Onboards a school over HTTP and returns its id and the owner's token.
async fn onboard(app: &TestApp, short_code: &str) -> (Uuid, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/onboard-school",
        None,
        Some(json!({
            "school_name": format!("{short_code} Academy"),
            "short_code": short_code,
            "owner_name": "Ada Owner",
            "owner_email": format!("owner@{}.test", short_code.to_lowercase()),
            "password": "correct-horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "onboarding failed: {body}");

    let school_id = body["school"]["id"].as_str().unwrap().parse().unwrap();
    let token = body["access_token"].as_str().unwrap().to_string();
    (school_id, token)
}

fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Creates a section, session, term, one student and a school-wide fee.
async fn seed_billing(db: &DatabaseConnection, school_id: Uuid) -> (Uuid, Uuid) {
    let section = SectionRepository::new(db.clone())
        .create(
            school_id,
            SectionInput {
                section_name: "Primary".to_string(),
                description: None,
                is_active: true,
            },
        )
        .await
        .unwrap();
    let academic = AcademicRepository::new(db.clone());
    let session = academic
        .create_session(
            school_id,
            SessionInput {
                section_id: section.id,
                session_name: "2025/2026".to_string(),
                start_date: date(2025, 9, 1),
                end_date: date(2026, 7, 31),
                is_active: true,
            },
        )
        .await
        .unwrap();
    let term = academic
        .create_term(
            school_id,
            TermInput {
                session_id: session.id,
                term_name: "First Term".to_string(),
                start_date: date(2025, 9, 1),
                end_date: date(2025, 12, 15),
                is_active: true,
            },
        )
        .await
        .unwrap();

    let student = StudentRepository::new(db.clone())
        .create(
            school_id,
            CreateStudentInput {
                student_name: "Tolu Ade".to_string(),
                section_ids: vec![section.id],
                ..CreateStudentInput::default()
            },
        )
        .await
        .unwrap();

    let fee = FeeRepository::new(db.clone())
        .create(
            school_id,
            FeeInput {
                section_id: section.id,
                session_id: session.id,
                term_id: term.id,
                fee_scope: FeeScopeKind::School,
                class_id: None,
                student_id: None,
                fee_name: "Tuition".to_string(),
                amount: dec!(100000),
                description: None,
                is_active: true,
            },
        )
        .await
        .unwrap();

    (student.student.id, fee.id)
}

/// Creates a user with `role` and logs them in.
async fn staff_token(app: &TestApp, school_id: Uuid, owner_token: &str, role: &str) -> (Uuid, String) {
    let email = format!("{role}-{}@example.com", Uuid::new_v4());
    let (status, user) = send(
        app,
        Method::POST,
        &format!("/api/v1/schools/{school_id}/users"),
        Some(owner_token),
        Some(json!({
            "email": email,
            "password": "staff-password",
            "full_name": format!("Test {role}"),
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "user creation failed: {user}");

    let (status, login) = send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "staff-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {login}");
    let id = user["id"].as_str().unwrap().parse().unwrap();
    (id, login["access_token"].as_str().unwrap().to_string())
}

/// A section with an active session and term, one class and one subject.
struct Classroom {
    section_id: Uuid,
    session_id: Uuid,
    term_id: Uuid,
    class_id: Uuid,
    subject_id: Uuid,
}

async fn seed_classroom(db: &DatabaseConnection, school_id: Uuid) -> Classroom {
    let section = SectionRepository::new(db.clone())
        .create(
            school_id,
            SectionInput {
                section_name: "Junior Secondary".to_string(),
                description: None,
                is_active: true,
            },
        )
        .await
        .unwrap();
    let academic = AcademicRepository::new(db.clone());
    let session = academic
        .create_session(
            school_id,
            SessionInput {
                section_id: section.id,
                session_name: "2025/2026".to_string(),
                start_date: date(2025, 9, 1),
                end_date: date(2026, 7, 31),
                is_active: true,
            },
        )
        .await
        .unwrap();
    let term = academic
        .create_term(
            school_id,
            TermInput {
                session_id: session.id,
                term_name: "First Term".to_string(),
                start_date: date(2025, 9, 1),
                end_date: date(2025, 12, 15),
                is_active: true,
            },
        )
        .await
        .unwrap();
    let class = ClassRepository::new(db.clone())
        .create(
            school_id,
            ClassInput {
                section_id: section.id,
                class_name: "JSS 1".to_string(),
                description: None,
                form_teacher_id: None,
                capacity: None,
                is_active: true,
            },
        )
        .await
        .unwrap();
    let subject = SubjectRepository::new(db.clone())
        .create(
            school_id,
            SubjectInput {
                section_id: section.id,
                class_id: Some(class.id),
                name: "Mathematics".to_string(),
                code: Some("MTH".to_string()),
            },
        )
        .await
        .unwrap();

    Classroom {
        section_id: section.id,
        session_id: session.id,
        term_id: term.id,
        class_id: class.id,
        subject_id: subject.id,
    }
}

#[tokio::test]
async fn test_health_reports_database() {
    let app = setup(FakeGateway::new("success")).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = setup(FakeGateway::new("success")).await;
    let uri = format!("/api/v1/schools/{}/sections", Uuid::new_v4());

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, Method::GET, &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_onboard_then_login_and_me() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, _) = onboard(&app, "AIA").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "  OWNER@aia.test ", "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "proprietor");
    assert_eq!(body["user"]["registration_id"], "AIA-PROP-001");
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["school"]["id"], school_id.to_string());
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = setup(FakeGateway::new("success")).await;
    onboard(&app, "AIA").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "owner@aia.test", "password": "wrong-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_duplicate_short_code_conflicts() {
    let app = setup(FakeGateway::new("success")).await;
    onboard(&app, "AIA").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/onboard-school",
        None,
        Some(json!({
            "school_name": "Another Academy",
            "short_code": "aia",
            "owner_name": "Bola Owner",
            "owner_email": "owner@another.test",
            "password": "correct-horse",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cross_school_access_is_forbidden() {
    let app = setup(FakeGateway::new("success")).await;
    let (_, token_a) = onboard(&app, "AIA").await;
    let (school_b, _) = onboard(&app, "BHS").await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/schools/{school_b}/sections"),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/schools/{school_b}/students/{}", Uuid::new_v4()),
        Some(&token_a),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_body_returns_field_errors() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, token) = onboard(&app, "AIA").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/schools/{school_id}/sections"),
        Some(&token),
        Some(json!({ "section_name": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["section_name"].is_array());
}

#[tokio::test]
async fn test_section_crud_round() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, token) = onboard(&app, "AIA").await;
    let base = format!("/api/v1/schools/{school_id}/sections");

    let (status, created) = send(
        &app,
        Method::POST,
        &base,
        Some(&token),
        Some(json!({ "section_name": "Secondary" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap();

    let (status, list) = send(&app, Method::GET, &base, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{base}/{id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("{base}/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_twice_records_one_payment() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, token) = onboard(&app, "AIA").await;
    let (student_id, fee_id) = seed_billing(&app.db, school_id).await;

    let (status, checkout) = send(
        &app,
        Method::POST,
        "/api/v1/payments/initialize",
        Some(&token),
        Some(json!({
            "email": "payer@example.com",
            "amount": "50000",
            "student_id": student_id,
            "fee_id": fee_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "initialize failed: {checkout}");
    assert_eq!(checkout["payment"]["status"], "pending");
    let reference = checkout["reference"].as_str().unwrap().to_string();
    assert!(reference.starts_with("PAY_"));

    let mut ids = Vec::new();
    for _ in 0..2 {
        let (status, verified) = send(
            &app,
            Method::POST,
            "/api/v1/payments/verify",
            Some(&token),
            Some(json!({ "reference": reference })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "verify failed: {verified}");
        assert_eq!(verified["payment"]["status"], "success");
        ids.push(verified["payment"]["id"].clone());
    }
    assert_eq!(ids[0], ids[1]);

    let (status, payments) = send(&app, Method::GET, "/api/v1/payments", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payments["meta"]["total"], 1);

    let (status, summary) = send(
        &app,
        Method::GET,
        &format!("/api/v1/schools/{school_id}/students/{student_id}/payment-summary"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&summary["total_fees"]), dec!(100000));
    assert_eq!(decimal(&summary["total_paid"]), dec!(50000));
    assert_eq!(decimal(&summary["outstanding"]), dec!(50000));
    assert_eq!(summary["payment_count"], 1);
}

#[tokio::test]
async fn test_failed_verification_marks_payment_failed() {
    let app = setup(FakeGateway::new("abandoned")).await;
    let (school_id, token) = onboard(&app, "AIA").await;
    let (student_id, fee_id) = seed_billing(&app.db, school_id).await;

    let (_, checkout) = send(
        &app,
        Method::POST,
        "/api/v1/payments/initialize",
        Some(&token),
        Some(json!({
            "email": "payer@example.com",
            "amount": "2500.50",
            "student_id": student_id,
            "fee_id": fee_id,
        })),
    )
    .await;
    let reference = checkout["reference"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/payments/verify",
        Some(&token),
        Some(json!({ "reference": reference })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Transaction abandoned");

    let (_, payments) = send(
        &app,
        Method::GET,
        "/api/v1/payments?status=failed",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(payments["meta"]["total"], 1);
}

#[tokio::test]
async fn test_initialize_rejects_foreign_student() {
    let app = setup(FakeGateway::new("success")).await;
    let (_, token_a) = onboard(&app, "AIA").await;
    let (school_b, _) = onboard(&app, "BHS").await;
    let (student_b, fee_b) = seed_billing(&app.db, school_b).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/payments/initialize",
        Some(&token_a),
        Some(json!({
            "email": "payer@example.com",
            "amount": "1000",
            "student_id": student_b,
            "fee_id": fee_b,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_amount_beyond_gateway_range_is_rejected() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, token) = onboard(&app, "AIA").await;
    let (student_id, fee_id) = seed_billing(&app.db, school_id).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/payments/initialize",
        Some(&token),
        Some(json!({
            "email": "payer@example.com",
            "amount": Decimal::MAX.to_string(),
            "student_id": student_id,
            "fee_id": fee_id,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["amount"].is_array(), "unexpected body: {body}");
}

#[tokio::test]
async fn test_debtors_report_filters_by_section_and_requires_finance_role() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, token) = onboard(&app, "AIA").await;
    let (student_id, _) = seed_billing(&app.db, school_id).await;
    let classroom = seed_classroom(&app.db, school_id).await;
    let other = StudentRepository::new(app.db.clone())
        .create(
            school_id,
            CreateStudentInput {
                student_name: "Bisi Okon".to_string(),
                class_id: Some(classroom.class_id),
                section_ids: vec![classroom.section_id],
                ..CreateStudentInput::default()
            },
        )
        .await
        .unwrap();
    let base = format!("/api/v1/schools/{school_id}/reports/debtors");

    let (status, all) = send(&app, Method::GET, &base, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "debtors failed: {all}");
    assert_eq!(all.as_array().map(Vec::len), Some(2));

    let (status, filtered) = send(
        &app,
        Method::GET,
        &format!("{base}?section_id={}", classroom.section_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = filtered.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["student_id"], other.student.id.to_string());
    assert_eq!(row["student_name"], "Bisi Okon");
    assert_eq!(row["section_name"], "Junior Secondary");
    assert_eq!(row["class_name"], "JSS 1");
    assert!(row["admission_number"].as_str().is_some_and(|n| !n.is_empty()));
    assert_eq!(decimal(&row["total_fees"]), dec!(100000));
    assert_eq!(decimal(&row["total_paid"]), dec!(0));
    assert_eq!(decimal(&row["balance"]), dec!(100000));
    assert_ne!(row["student_id"], student_id.to_string());

    let (_, bursar) = staff_token(&app, school_id, &token, "bursar").await;
    let (status, _) = send(&app, Method::GET, &base, Some(&bursar), None).await;
    assert_eq!(status, StatusCode::OK);

    for role in ["teacher", "parent"] {
        let (_, denied) = staff_token(&app, school_id, &token, role).await;
        let (status, _) = send(&app, Method::GET, &base, Some(&denied), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role} should not see debtors");
    }
}

#[tokio::test]
async fn test_exam_results_validate_scores_and_upsert() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, token) = onboard(&app, "AIA").await;
    let classroom = seed_classroom(&app.db, school_id).await;
    let pupil = StudentRepository::new(app.db.clone())
        .create(
            school_id,
            CreateStudentInput {
                student_name: "Chidi Eze".to_string(),
                class_id: Some(classroom.class_id),
                section_ids: vec![classroom.section_id],
                ..CreateStudentInput::default()
            },
        )
        .await
        .unwrap();

    let (status, exam) = send(
        &app,
        Method::POST,
        &format!("/api/v1/schools/{school_id}/exams"),
        Some(&token),
        Some(json!({
            "class_id": classroom.class_id,
            "subject_id": classroom.subject_id,
            "session_id": classroom.session_id,
            "term_id": classroom.term_id,
            "title": "Mid-term Test",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "exam creation failed: {exam}");
    let results = format!(
        "/api/v1/schools/{school_id}/exams/{}/results",
        exam["id"].as_str().unwrap()
    );
    let batch = |score: &str| json!({ "results": [{ "student_id": pupil.student.id, "score": score }] });

    let (status, body) = send(&app, Method::POST, &results, Some(&token), Some(batch("120"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["results"].is_array(), "unexpected body: {body}");

    for _ in 0..2 {
        let (status, saved) = send(&app, Method::POST, &results, Some(&token), Some(batch("72"))).await;
        assert_eq!(status, StatusCode::OK, "save failed: {saved}");
    }
    let (status, stored) = send(&app, Method::GET, &results, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let stored = stored.as_array().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(decimal(&stored[0]["score"]), dec!(72));

    for role in ["bursar", "parent"] {
        let (_, denied) = staff_token(&app, school_id, &token, role).await;
        let (status, _) = send(&app, Method::POST, &results, Some(&denied), Some(batch("50"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role} should not grade");
    }
    let (_, teacher) = staff_token(&app, school_id, &token, "teacher").await;
    let (status, _) = send(&app, Method::POST, &results, Some(&teacher), Some(batch("64"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_timetable_clash_is_conflict() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, token) = onboard(&app, "AIA").await;
    let classroom = seed_classroom(&app.db, school_id).await;
    let (teacher_id, teacher) = staff_token(&app, school_id, &token, "teacher").await;
    let base = format!("/api/v1/schools/{school_id}/timetables");
    let lesson = |start: &str, end: &str| {
        json!({
            "class_id": classroom.class_id,
            "subject_id": classroom.subject_id,
            "teacher_id": teacher_id,
            "day": "monday",
            "start_time": start,
            "end_time": end,
        })
    };

    let (status, entry) = send(&app, Method::POST, &base, Some(&token), Some(lesson("08:00:00", "09:00:00"))).await;
    assert_eq!(status, StatusCode::CREATED, "scheduling failed: {entry}");

    let (status, _) = send(&app, Method::POST, &base, Some(&token), Some(lesson("08:30:00", "09:30:00"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::POST, &base, Some(&token), Some(lesson("11:00:00", "10:00:00"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["end_time"].is_array(), "unexpected body: {body}");

    let (status, _) = send(&app, Method::POST, &base, Some(&teacher), Some(lesson("10:00:00", "11:00:00"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, own) = send(&app, Method::GET, &base, Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own.as_array().map(Vec::len), Some(1));
    assert_eq!(own[0]["day_of_week"], "monday");
}

#[tokio::test]
async fn test_lesson_plan_review_requires_reviewer() {
    let app = setup(FakeGateway::new("success")).await;
    let (school_id, token) = onboard(&app, "AIA").await;
    let classroom = seed_classroom(&app.db, school_id).await;
    let (_, teacher) = staff_token(&app, school_id, &token, "teacher").await;
    let base = format!("/api/v1/schools/{school_id}/lesson-plans");
    let body = json!({
        "class_id": classroom.class_id,
        "subject_id": classroom.subject_id,
        "title": "Fractions",
        "content": "Halves, quarters and eighths.",
        "week_number": 2,
    });

    let (status, plan) = send(&app, Method::POST, &base, Some(&teacher), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "plan creation failed: {plan}");
    assert_eq!(plan["status"], "submitted");
    let plan_url = format!("{base}/{}", plan["id"].as_str().unwrap());
    let review_url = format!("{plan_url}/review");

    let (status, _) = send(&app, Method::POST, &review_url, Some(&teacher), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, rejected) = send(&app, Method::POST, &review_url, Some(&token), Some(json!({ "status": "rejected" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(rejected["fields"]["remarks"].is_array(), "unexpected body: {rejected}");

    let (status, approved) = send(&app, Method::POST, &review_url, Some(&token), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    let (status, _) = send(&app, Method::PUT, &plan_url, Some(&teacher), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
