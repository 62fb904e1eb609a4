//! Fee repository.

use rust_decimal::Decimal;
use scholaris_core::fees::{FeeError, FeeResolver, FeeScope as CoreFeeScope, FeeScopeKind};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use scholaris_shared::types::PageRequest;
use serde::Serialize;
use uuid::Uuid;

use super::common::{Page, fetch_page, now};
use crate::entities::{
    academic_sessions, classes, fees, sea_orm_active_enums::FeeScope, sections, students, terms,
};

/// Error types for fee operations.
#[derive(Debug, thiserror::Error)]
pub enum FeeRepoError {
    /// Fee not found in this school.
    #[error("Fee not found: {0}")]
    NotFound(Uuid),

    /// Fee definition is invalid.
    #[error(transparent)]
    Invalid(#[from] FeeError),

    /// A referenced row is not part of this school.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or replacing a fee.
#[derive(Debug, Clone)]
pub struct FeeInput {
    /// Section the fee belongs to.
    pub section_id: Uuid,
    /// Academic session.
    pub session_id: Uuid,
    /// Term.
    pub term_id: Uuid,
    /// Scope kind.
    pub fee_scope: FeeScopeKind,
    /// Class, for class-scoped fees.
    pub class_id: Option<Uuid>,
    /// Student, for student-scoped fees.
    pub student_id: Option<Uuid>,
    /// Display name.
    pub fee_name: String,
    /// Amount.
    pub amount: Decimal,
    /// Description.
    pub description: Option<String>,
    /// Active flag.
    pub is_active: bool,
}

/// Filter options for listing fees.
#[derive(Debug, Clone, Default)]
pub struct FeeFilter {
    /// Section.
    pub section_id: Option<Uuid>,
    /// Academic session.
    pub session_id: Option<Uuid>,
    /// Term.
    pub term_id: Option<Uuid>,
    /// Class.
    pub class_id: Option<Uuid>,
    /// Scope kind.
    pub fee_scope: Option<FeeScope>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Totals for one scope kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeTotal {
    /// Scope kind.
    pub fee_scope: FeeScopeKind,
    /// Number of fees.
    pub count: u64,
    /// Sum of amounts.
    pub amount: Decimal,
}

/// Fee totals of a school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeSummary {
    /// Number of matching fees.
    pub total_fees: u64,
    /// Sum of matching amounts.
    pub total_amount: Decimal,
    /// Number of active fees.
    pub active_fees: u64,
    /// Per-scope totals, in scope order.
    pub by_scope: Vec<ScopeTotal>,
}

/// Fee repository.
#[derive(Debug, Clone)]
pub struct FeeRepository {
    db: DatabaseConnection,
}

impl FeeRepository {
    /// Creates a new fee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a fee of the given school.
    pub async fn find(&self, school_id: Uuid, id: Uuid) -> Result<Option<fees::Model>, DbErr> {
        fees::Entity::find_by_id(id)
            .filter(fees::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Lists fees of a school.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &FeeFilter,
        page: &PageRequest,
    ) -> Result<Page<fees::Model>, DbErr> {
        let query = filtered(school_id, filter).order_by_asc(fees::Column::FeeName);
        fetch_page(&self.db, query, page).await
    }

    /// Counts and sums fees grouped by scope.
    pub async fn summary(&self, school_id: Uuid, filter: &FeeFilter) -> Result<FeeSummary, DbErr> {
        let rows = filtered(school_id, filter).all(&self.db).await?;

        let by_scope = FeeScopeKind::ALL
            .iter()
            .map(|&kind| {
                let scoped = rows.iter().filter(|f| FeeScopeKind::from(f.fee_scope) == kind);
                ScopeTotal {
                    fee_scope: kind,
                    count: scoped.clone().count() as u64,
                    amount: scoped.map(|f| f.amount).sum(),
                }
            })
            .collect();

        Ok(FeeSummary {
            total_fees: rows.len() as u64,
            total_amount: rows.iter().map(|f| f.amount).sum(),
            active_fees: rows.iter().filter(|f| f.is_active).count() as u64,
            by_scope,
        })
    }

    /// Creates a fee.
    pub async fn create(&self, school_id: Uuid, input: FeeInput) -> Result<fees::Model, FeeRepoError> {
        let (class_id, student_id) = self.validate(school_id, &input).await?;

        let timestamp = now();
        let fee = fees::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_id: Set(input.section_id),
            session_id: Set(input.session_id),
            term_id: Set(input.term_id),
            class_id: Set(class_id),
            student_id: Set(student_id),
            fee_name: Set(input.fee_name),
            amount: Set(input.amount),
            fee_scope: Set(input.fee_scope.into()),
            description: Set(input.description),
            is_active: Set(input.is_active),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            school_id = %school_id,
            fee_id = %fee.id,
            scope = %input.fee_scope,
            amount = %fee.amount,
            "Fee created"
        );
        Ok(fee)
    }

    /// Replaces a fee.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: FeeInput,
    ) -> Result<fees::Model, FeeRepoError> {
        let fee = self
            .find(school_id, id)
            .await?
            .ok_or(FeeRepoError::NotFound(id))?;
        let (class_id, student_id) = self.validate(school_id, &input).await?;

        let mut active = fee.into_active_model();
        active.section_id = Set(input.section_id);
        active.session_id = Set(input.session_id);
        active.term_id = Set(input.term_id);
        active.class_id = Set(class_id);
        active.student_id = Set(student_id);
        active.fee_name = Set(input.fee_name);
        active.amount = Set(input.amount);
        active.fee_scope = Set(input.fee_scope.into());
        active.description = Set(input.description);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a fee.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), FeeRepoError> {
        let result = fees::Entity::delete_many()
            .filter(fees::Column::Id.eq(id))
            .filter(fees::Column::SchoolId.eq(school_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(FeeRepoError::NotFound(id));
        }
        tracing::info!(school_id = %school_id, fee_id = %id, "Fee deleted");
        Ok(())
    }

    /// Checks the input and returns the class and student columns to store.
    async fn validate(
        &self,
        school_id: Uuid,
        input: &FeeInput,
    ) -> Result<(Option<Uuid>, Option<Uuid>), FeeRepoError> {
        FeeResolver::validate_amount(input.amount)?;
        let scope = FeeResolver::scope_for_input(
            input.fee_scope,
            input.section_id.into(),
            input.class_id.map(Into::into),
            input.student_id.map(Into::into),
        )?;

        let section = sections::Entity::find_by_id(input.section_id)
            .filter(sections::Column::SchoolId.eq(school_id))
            .count(&self.db)
            .await?;
        if section == 0 {
            return Err(FeeRepoError::InvalidReference(format!("section {}", input.section_id)));
        }

        let session = academic_sessions::Entity::find_by_id(input.session_id)
            .filter(academic_sessions::Column::SchoolId.eq(school_id))
            .count(&self.db)
            .await?;
        if session == 0 {
            return Err(FeeRepoError::InvalidReference(format!("session {}", input.session_id)));
        }

        let term = terms::Entity::find_by_id(input.term_id)
            .filter(terms::Column::SchoolId.eq(school_id))
            .filter(terms::Column::SessionId.eq(input.session_id))
            .count(&self.db)
            .await?;
        if term == 0 {
            return Err(FeeRepoError::InvalidReference(format!("term {}", input.term_id)));
        }

        match scope {
            CoreFeeScope::School | CoreFeeScope::Section(_) => Ok((None, None)),
            CoreFeeScope::Class(class_id) => {
                let class_id: Uuid = class_id.into();
                let found = classes::Entity::find_by_id(class_id)
                    .filter(classes::Column::SchoolId.eq(school_id))
                    .count(&self.db)
                    .await?;
                if found == 0 {
                    return Err(FeeRepoError::InvalidReference(format!("class {class_id}")));
                }
                Ok((Some(class_id), None))
            }
            CoreFeeScope::Student(student_id) => {
                let student_id: Uuid = student_id.into();
                let found = students::Entity::find_by_id(student_id)
                    .filter(students::Column::SchoolId.eq(school_id))
                    .count(&self.db)
                    .await?;
                if found == 0 {
                    return Err(FeeRepoError::InvalidReference(format!("student {student_id}")));
                }
                Ok((None, Some(student_id)))
            }
        }
    }
}

fn filtered(school_id: Uuid, filter: &FeeFilter) -> sea_orm::Select<fees::Entity> {
    let mut query = fees::Entity::find().filter(fees::Column::SchoolId.eq(school_id));
    if let Some(id) = filter.section_id {
        query = query.filter(fees::Column::SectionId.eq(id));
    }
    if let Some(id) = filter.session_id {
        query = query.filter(fees::Column::SessionId.eq(id));
    }
    if let Some(id) = filter.term_id {
        query = query.filter(fees::Column::TermId.eq(id));
    }
    if let Some(id) = filter.class_id {
        query = query.filter(fees::Column::ClassId.eq(id));
    }
    if let Some(scope) = filter.fee_scope {
        query = query.filter(fees::Column::FeeScope.eq(scope));
    }
    if let Some(is_active) = filter.is_active {
        query = query.filter(fees::Column::IsActive.eq(is_active));
    }
    query
}
