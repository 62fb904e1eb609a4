//! Transaction repository for manually recorded income and expenses.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use scholaris_core::fees::MAX_AMOUNT;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use scholaris_shared::types::PageRequest;
use serde::Serialize;
use uuid::Uuid;

use super::common::{Page, fetch_page, now};
use crate::entities::{
    payments, sections, students, transactions,
    sea_orm_active_enums::{PaymentMethod, PaymentStatus, TransactionType},
};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found in this school.
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    /// Amount must be positive.
    #[error("Transaction amount must be greater than zero")]
    NonPositiveAmount,

    /// Amount does not fit a money column.
    #[error("Transaction amount must not exceed 9999999999.99")]
    AmountTooLarge,

    /// A referenced row is not part of this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The linked gateway payment cannot back this transaction.
    #[error("Payment {payment_id} cannot be linked: {reason}")]
    InvalidPaymentLink {
        /// Linked payment.
        payment_id: Uuid,
        /// Why the link was refused.
        reason: &'static str,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for recording or replacing a transaction.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    /// Section.
    pub section_id: Uuid,
    /// Academic session.
    pub session_id: Option<Uuid>,
    /// Term.
    pub term_id: Option<Uuid>,
    /// Student the money relates to.
    pub student_id: Option<Uuid>,
    /// Income or expense.
    pub transaction_type: TransactionType,
    /// Amount.
    pub amount: Decimal,
    /// Settlement method.
    pub payment_method: PaymentMethod,
    /// Category, e.g. "School Fee" or "Utilities".
    pub category: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// External reference such as a teller number.
    pub reference_number: Option<String>,
    /// Day the money moved.
    pub transaction_date: NaiveDate,
    /// Gateway payment this entry records, if any.
    pub payment_id: Option<Uuid>,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Section.
    pub section_id: Option<Uuid>,
    /// Academic session.
    pub session_id: Option<Uuid>,
    /// Term.
    pub term_id: Option<Uuid>,
    /// Student.
    pub student_id: Option<Uuid>,
    /// Income or expense.
    pub transaction_type: Option<TransactionType>,
    /// Settlement method.
    pub payment_method: Option<PaymentMethod>,
    /// Category contains.
    pub category: Option<String>,
    /// Earliest transaction date.
    pub from: Option<NaiveDate>,
    /// Latest transaction date.
    pub to: Option<NaiveDate>,
}

/// Income and expense totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionStats {
    /// Sum of income.
    pub total_income: Decimal,
    /// Sum of expenses.
    pub total_expense: Decimal,
    /// Income minus expenses.
    pub net_balance: Decimal,
    /// Number of income rows.
    pub income_count: u64,
    /// Number of expense rows.
    pub expense_count: u64,
}

impl TransactionStats {
    /// Totals of the given rows.
    #[must_use]
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a transactions::Model>,
    {
        let mut stats = Self::default();
        for row in rows {
            match row.transaction_type {
                TransactionType::Income => {
                    stats.total_income += row.amount;
                    stats.income_count += 1;
                }
                TransactionType::Expense => {
                    stats.total_expense += row.amount;
                    stats.expense_count += 1;
                }
            }
        }
        stats.net_balance = stats.total_income - stats.total_expense;
        stats
    }
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a transaction of the given school.
    pub async fn find(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(id)
            .filter(transactions::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Lists transactions, newest first.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<Page<transactions::Model>, DbErr> {
        let query = filtered(school_id, filter)
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::CreatedAt);
        fetch_page(&self.db, query, page).await
    }

    /// Income and expense totals for the filter.
    pub async fn stats(
        &self,
        school_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<TransactionStats, DbErr> {
        let rows = filtered(school_id, filter).all(&self.db).await?;
        Ok(TransactionStats::from_rows(&rows))
    }

    /// Records a transaction.
    pub async fn create(
        &self,
        school_id: Uuid,
        recorded_by: Uuid,
        input: TransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        self.validate(school_id, None, &input).await?;

        let timestamp = now();
        let transaction = transactions::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_id: Set(input.section_id),
            session_id: Set(input.session_id),
            term_id: Set(input.term_id),
            student_id: Set(input.student_id),
            transaction_type: Set(input.transaction_type),
            amount: Set(input.amount),
            payment_method: Set(input.payment_method),
            category: Set(input.category),
            description: Set(input.description),
            reference_number: Set(input.reference_number),
            transaction_date: Set(input.transaction_date),
            recorded_by: Set(recorded_by),
            payment_id: Set(input.payment_id),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            school_id = %school_id,
            transaction_id = %transaction.id,
            amount = %transaction.amount,
            kind = ?transaction.transaction_type,
            "Transaction recorded"
        );
        Ok(transaction)
    }

    /// Replaces a transaction.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: TransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        let transaction = self
            .find(school_id, id)
            .await?
            .ok_or(TransactionError::NotFound(id))?;
        self.validate(school_id, Some(id), &input).await?;

        let mut active = transaction.into_active_model();
        active.section_id = Set(input.section_id);
        active.session_id = Set(input.session_id);
        active.term_id = Set(input.term_id);
        active.student_id = Set(input.student_id);
        active.transaction_type = Set(input.transaction_type);
        active.amount = Set(input.amount);
        active.payment_method = Set(input.payment_method);
        active.category = Set(input.category);
        active.description = Set(input.description);
        active.reference_number = Set(input.reference_number);
        active.transaction_date = Set(input.transaction_date);
        active.payment_id = Set(input.payment_id);
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a transaction.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), TransactionError> {
        let result = transactions::Entity::delete_many()
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::SchoolId.eq(school_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(TransactionError::NotFound(id));
        }
        tracing::info!(school_id = %school_id, transaction_id = %id, "Transaction deleted");
        Ok(())
    }

    async fn validate(
        &self,
        school_id: Uuid,
        editing: Option<Uuid>,
        input: &TransactionInput,
    ) -> Result<(), TransactionError> {
        if input.amount <= Decimal::ZERO {
            return Err(TransactionError::NonPositiveAmount);
        }
        if input.amount > MAX_AMOUNT {
            return Err(TransactionError::AmountTooLarge);
        }

        let section = sections::Entity::find_by_id(input.section_id)
            .filter(sections::Column::SchoolId.eq(school_id))
            .count(&self.db)
            .await?;
        if section == 0 {
            return Err(TransactionError::InvalidReference(format!(
                "section {}",
                input.section_id
            )));
        }

        if let Some(student_id) = input.student_id {
            let student = students::Entity::find_by_id(student_id)
                .filter(students::Column::SchoolId.eq(school_id))
                .count(&self.db)
                .await?;
            if student == 0 {
                return Err(TransactionError::InvalidReference(format!("student {student_id}")));
            }
        }

        if let Some(payment_id) = input.payment_id {
            self.check_payment_link(payment_id, editing, input).await?;
        }
        Ok(())
    }

    /// A linked payment must be a successful gateway payment of the same
    /// student, and may back at most one transaction.
    async fn check_payment_link(
        &self,
        payment_id: Uuid,
        editing: Option<Uuid>,
        input: &TransactionInput,
    ) -> Result<(), TransactionError> {
        let refuse = |reason| TransactionError::InvalidPaymentLink { payment_id, reason };

        if input.transaction_type != TransactionType::Income {
            return Err(refuse("only income can be linked to a payment"));
        }
        let payment = payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| refuse("payment not found"))?;
        if Some(payment.student_id) != input.student_id {
            return Err(refuse("payment belongs to another student"));
        }
        if payment.status != PaymentStatus::Success {
            return Err(refuse("payment is not successful"));
        }

        let mut linked = transactions::Entity::find()
            .filter(transactions::Column::PaymentId.eq(payment_id));
        if let Some(id) = editing {
            linked = linked.filter(transactions::Column::Id.ne(id));
        }
        if linked.count(&self.db).await? > 0 {
            return Err(refuse("payment is already linked"));
        }
        Ok(())
    }
}

fn filtered(school_id: Uuid, filter: &TransactionFilter) -> sea_orm::Select<transactions::Entity> {
    let mut query =
        transactions::Entity::find().filter(transactions::Column::SchoolId.eq(school_id));
    if let Some(id) = filter.section_id {
        query = query.filter(transactions::Column::SectionId.eq(id));
    }
    if let Some(id) = filter.session_id {
        query = query.filter(transactions::Column::SessionId.eq(id));
    }
    if let Some(id) = filter.term_id {
        query = query.filter(transactions::Column::TermId.eq(id));
    }
    if let Some(id) = filter.student_id {
        query = query.filter(transactions::Column::StudentId.eq(id));
    }
    if let Some(kind) = filter.transaction_type {
        query = query.filter(transactions::Column::TransactionType.eq(kind));
    }
    if let Some(method) = filter.payment_method {
        query = query.filter(transactions::Column::PaymentMethod.eq(method));
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        query = query.filter(transactions::Column::Category.contains(category));
    }
    if let Some(from) = filter.from {
        query = query.filter(transactions::Column::TransactionDate.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(transactions::Column::TransactionDate.lte(to));
    }
    query
}
