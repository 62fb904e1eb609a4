//! Payment repository for gateway-originated payments.
//!
//! Payments carry no school column; they are scoped through their student.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
    prelude::Json,
    sea_query::{Expr, Query, SimpleExpr},
};
use scholaris_shared::types::PageRequest;
use uuid::Uuid;

use super::common::{Page, fetch_page, is_unique_violation, now};
use crate::entities::{payments, sea_orm_active_enums::PaymentStatus, students};

/// Default method recorded for gateway payments.
pub const DEFAULT_GATEWAY_METHOD: &str = "card";

/// Error types for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentRepoError {
    /// Payment not found.
    #[error("Payment not found: {0}")]
    NotFound(String),

    /// Reference already used.
    #[error("Payment reference '{0}' already exists")]
    DuplicateReference(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Paying student.
    pub student_id: Uuid,
    /// Fee being paid.
    pub fee_id: Uuid,
    /// Amount in major units.
    pub amount: Decimal,
    /// Gateway reference.
    pub reference: String,
    /// Channel reported by the gateway.
    pub payment_method: Option<String>,
}

/// Filter options for listing payments.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Paying student.
    pub student_id: Option<Uuid>,
    /// Fee.
    pub fee_id: Option<Uuid>,
    /// Status.
    pub status: Option<PaymentStatus>,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a payment by its gateway reference.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<payments::Model>, DbErr> {
        payments::Entity::find()
            .filter(payments::Column::Reference.eq(reference))
            .one(&self.db)
            .await
    }

    /// Finds a payment by reference if its student belongs to the school.
    pub async fn find_by_reference_in_school(
        &self,
        school_id: Uuid,
        reference: &str,
    ) -> Result<Option<payments::Model>, DbErr> {
        payments::Entity::find()
            .filter(payments::Column::Reference.eq(reference))
            .filter(student_of_school(school_id))
            .one(&self.db)
            .await
    }

    /// Lists a school's payments, newest first.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &PaymentFilter,
        page: &PageRequest,
    ) -> Result<Page<payments::Model>, DbErr> {
        let mut query = payments::Entity::find()
            .filter(student_of_school(school_id))
            .order_by_desc(payments::Column::CreatedAt);
        if let Some(id) = filter.student_id {
            query = query.filter(payments::Column::StudentId.eq(id));
        }
        if let Some(id) = filter.fee_id {
            query = query.filter(payments::Column::FeeId.eq(id));
        }
        if let Some(status) = filter.status {
            query = query.filter(payments::Column::Status.eq(status));
        }
        fetch_page(&self.db, query, page).await
    }

    /// Every payment of a school's students.
    pub async fn all_for_school(&self, school_id: Uuid) -> Result<Vec<payments::Model>, DbErr> {
        payments::Entity::find()
            .filter(student_of_school(school_id))
            .all(&self.db)
            .await
    }

    /// Inserts a pending payment after the gateway accepted initialization.
    pub async fn create_pending(&self, input: NewPayment) -> Result<payments::Model, PaymentRepoError> {
        let payment = self.insert(input, PaymentStatus::Pending, None, None).await?;
        tracing::info!(
            payment_id = %payment.id,
            reference = %payment.reference,
            amount = %payment.amount,
            "Payment initialized"
        );
        Ok(payment)
    }

    /// Inserts a payment the gateway already reported as successful.
    ///
    /// If another request recorded the same reference first, that row is
    /// returned instead.
    pub async fn record_verified(
        &self,
        input: NewPayment,
        paid_at: Option<DateTime<Utc>>,
        gateway_response: Json,
    ) -> Result<payments::Model, PaymentRepoError> {
        let reference = input.reference.clone();
        match self
            .insert(input, PaymentStatus::Success, paid_at, Some(gateway_response))
            .await
        {
            Ok(payment) => {
                tracing::info!(payment_id = %payment.id, reference = %reference, "Verified payment recorded");
                Ok(payment)
            }
            Err(PaymentRepoError::DuplicateReference(_)) => self
                .find_by_reference(&reference)
                .await?
                .ok_or(PaymentRepoError::NotFound(reference)),
            Err(e) => Err(e),
        }
    }

    /// Marks a payment successful unless it already is.
    ///
    /// Returns false when the row was already successful.
    pub async fn mark_success(
        &self,
        id: Uuid,
        paid_at: Option<DateTime<Utc>>,
        channel: Option<String>,
        gateway_response: Json,
    ) -> Result<bool, DbErr> {
        let mut update = payments::Entity::update_many()
            .col_expr(payments::Column::Status, Expr::value(PaymentStatus::Success))
            .col_expr(
                payments::Column::PaidAt,
                Expr::value(paid_at.unwrap_or_else(Utc::now).fixed_offset()),
            )
            .col_expr(payments::Column::GatewayResponse, Expr::value(gateway_response))
            .col_expr(payments::Column::UpdatedAt, Expr::value(now()));
        if let Some(channel) = channel {
            update = update.col_expr(payments::Column::PaymentMethod, Expr::value(channel));
        }

        let result = update
            .filter(payments::Column::Id.eq(id))
            .filter(payments::Column::Status.ne(PaymentStatus::Success))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(payment_id = %id, "Payment marked successful");
        }
        Ok(result.rows_affected > 0)
    }

    /// Marks a pending payment failed.
    pub async fn mark_failed(&self, id: Uuid, gateway_response: Json) -> Result<bool, DbErr> {
        let result = payments::Entity::update_many()
            .col_expr(payments::Column::Status, Expr::value(PaymentStatus::Failed))
            .col_expr(payments::Column::GatewayResponse, Expr::value(gateway_response))
            .col_expr(payments::Column::UpdatedAt, Expr::value(now()))
            .filter(payments::Column::Id.eq(id))
            .filter(payments::Column::Status.eq(PaymentStatus::Pending))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(payment_id = %id, "Payment marked failed");
        }
        Ok(result.rows_affected > 0)
    }

    async fn insert(
        &self,
        input: NewPayment,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
        gateway_response: Option<Json>,
    ) -> Result<payments::Model, PaymentRepoError> {
        let timestamp = now();
        let reference = input.reference;
        payments::ActiveModel {
            id: Set(Uuid::now_v7()),
            student_id: Set(input.student_id),
            fee_id: Set(input.fee_id),
            amount: Set(input.amount),
            payment_method: Set(input
                .payment_method
                .unwrap_or_else(|| DEFAULT_GATEWAY_METHOD.to_string())),
            reference: Set(reference.clone()),
            status: Set(status),
            gateway_response: Set(gateway_response),
            paid_at: Set(paid_at.map(|t| t.fixed_offset())),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PaymentRepoError::DuplicateReference(reference)
            } else {
                PaymentRepoError::Database(e)
            }
        })
    }
}

/// Restricts payments to students of one school.
fn student_of_school(school_id: Uuid) -> SimpleExpr {
    payments::Column::StudentId.in_subquery(
        Query::select()
            .column(students::Column::Id)
            .from(students::Entity)
            .and_where(students::Column::SchoolId.eq(school_id))
            .to_owned(),
    )
}
