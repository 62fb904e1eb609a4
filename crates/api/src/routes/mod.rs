//! API route definitions.

use axum::{Router, middleware};

use crate::{
    AppState,
    middleware::{auth::auth_middleware, school::school_access},
};

pub mod academic;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod exams;
pub mod fees;
pub mod health;
pub mod homework;
pub mod lesson_plans;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod reports;
pub mod schools;
pub mod sections;
pub mod students;
pub mod subjects;
pub mod syllabuses;
pub mod timetables;
pub mod transactions;
pub mod users;

/// Routes under `/schools/{school}`.
fn school_routes() -> Router<AppState> {
    Router::new()
        .merge(schools::routes())
        .merge(users::routes())
        .merge(sections::routes())
        .merge(classes::routes())
        .merge(academic::routes())
        .merge(subjects::routes())
        .merge(students::routes())
        .merge(fees::routes())
        .merge(transactions::routes())
        .merge(exams::routes())
        .merge(attendance::routes())
        .merge(lesson_plans::routes())
        .merge(syllabuses::routes())
        .merge(timetables::routes())
        .merge(homework::routes())
        .merge(reports::routes())
}

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // The school check reads the claims, so auth must run first: the layer
    // added last runs outermost.
    let scoped = school_routes().route_layer(middleware::from_fn(school_access));

    let protected_routes = Router::new()
        .merge(scoped)
        .merge(auth::protected_routes())
        .merge(payments::routes())
        .merge(notifications::routes())
        .merge(messages::routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
