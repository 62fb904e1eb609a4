//! Academic sessions and terms.
//!
//! At most one session per section is active, and at most one term per
//! session. Activating a row deactivates its siblings in the same
//! transaction.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use super::common::now;
use crate::entities::{academic_sessions, sections, terms};

/// Error types for session and term operations.
#[derive(Debug, thiserror::Error)]
pub enum AcademicError {
    /// Session not found in this school.
    #[error("Academic session not found: {0}")]
    SessionNotFound(Uuid),

    /// Term not found in this school.
    #[error("Term not found: {0}")]
    TermNotFound(Uuid),

    /// Section not found in this school.
    #[error("Section not found: {0}")]
    SectionNotFound(Uuid),

    /// End date precedes start date.
    #[error("End date {end} is before start date {start}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Session still has terms.
    #[error("Academic session {0} still has terms")]
    HasTerms(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or replacing an academic session.
#[derive(Debug, Clone)]
pub struct SessionInput {
    /// Owning section.
    pub section_id: Uuid,
    /// Display name, e.g. "2025/2026".
    pub session_name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Whether this is the current session of its section.
    pub is_active: bool,
}

/// Input for creating or replacing a term.
#[derive(Debug, Clone)]
pub struct TermInput {
    /// Owning session. The term inherits its section.
    pub session_id: Uuid,
    /// Display name, e.g. "First Term".
    pub term_name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Whether this is the current term of its session.
    pub is_active: bool,
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), AcademicError> {
    if end < start {
        return Err(AcademicError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// Repository for academic sessions and terms.
#[derive(Debug, Clone)]
pub struct AcademicRepository {
    db: DatabaseConnection,
}

impl AcademicRepository {
    /// Creates a new academic repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists sessions of a school, optionally of one section.
    pub async fn list_sessions(
        &self,
        school_id: Uuid,
        section_id: Option<Uuid>,
    ) -> Result<Vec<academic_sessions::Model>, DbErr> {
        let mut query = academic_sessions::Entity::find()
            .filter(academic_sessions::Column::SchoolId.eq(school_id))
            .order_by_desc(academic_sessions::Column::StartDate);
        if let Some(section_id) = section_id {
            query = query.filter(academic_sessions::Column::SectionId.eq(section_id));
        }
        query.all(&self.db).await
    }

    /// Finds a session of the given school.
    pub async fn find_session(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<academic_sessions::Model>, DbErr> {
        academic_sessions::Entity::find_by_id(id)
            .filter(academic_sessions::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Creates a session.
    pub async fn create_session(
        &self,
        school_id: Uuid,
        input: SessionInput,
    ) -> Result<academic_sessions::Model, AcademicError> {
        check_range(input.start_date, input.end_date)?;
        self.require_section(school_id, input.section_id).await?;

        let txn = self.db.begin().await?;
        if input.is_active {
            deactivate_sessions(&txn, input.section_id).await?;
        }

        let timestamp = now();
        let session = academic_sessions::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_id: Set(input.section_id),
            session_name: Set(input.session_name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_active: Set(input.is_active),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        tracing::info!(school_id = %school_id, session_id = %session.id, "Academic session created");
        Ok(session)
    }

    /// Replaces the editable fields of a session.
    pub async fn update_session(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: SessionInput,
    ) -> Result<academic_sessions::Model, AcademicError> {
        check_range(input.start_date, input.end_date)?;
        let session = self
            .find_session(school_id, id)
            .await?
            .ok_or(AcademicError::SessionNotFound(id))?;
        self.require_section(school_id, input.section_id).await?;

        let txn = self.db.begin().await?;
        if input.is_active {
            deactivate_sessions(&txn, input.section_id).await?;
        }

        let mut active = session.into_active_model();
        active.section_id = Set(input.section_id);
        active.session_name = Set(input.session_name);
        active.start_date = Set(input.start_date);
        active.end_date = Set(input.end_date);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(now());
        let session = active.update(&txn).await?;
        txn.commit().await?;

        Ok(session)
    }

    /// Deletes a session with no terms.
    pub async fn delete_session(&self, school_id: Uuid, id: Uuid) -> Result<(), AcademicError> {
        self.find_session(school_id, id)
            .await?
            .ok_or(AcademicError::SessionNotFound(id))?;

        let term_count = terms::Entity::find()
            .filter(terms::Column::SessionId.eq(id))
            .count(&self.db)
            .await?;
        if term_count > 0 {
            return Err(AcademicError::HasTerms(id));
        }

        academic_sessions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Lists terms of a school, optionally of one session.
    pub async fn list_terms(
        &self,
        school_id: Uuid,
        session_id: Option<Uuid>,
    ) -> Result<Vec<terms::Model>, DbErr> {
        let mut query = terms::Entity::find()
            .filter(terms::Column::SchoolId.eq(school_id))
            .order_by_asc(terms::Column::StartDate);
        if let Some(session_id) = session_id {
            query = query.filter(terms::Column::SessionId.eq(session_id));
        }
        query.all(&self.db).await
    }

    /// Finds a term of the given school.
    pub async fn find_term(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<terms::Model>, DbErr> {
        terms::Entity::find_by_id(id)
            .filter(terms::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Creates a term inside a session.
    pub async fn create_term(
        &self,
        school_id: Uuid,
        input: TermInput,
    ) -> Result<terms::Model, AcademicError> {
        check_range(input.start_date, input.end_date)?;
        let session = self
            .find_session(school_id, input.session_id)
            .await?
            .ok_or(AcademicError::SessionNotFound(input.session_id))?;

        let txn = self.db.begin().await?;
        if input.is_active {
            deactivate_terms(&txn, session.id).await?;
        }

        let timestamp = now();
        let term = terms::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            section_id: Set(session.section_id),
            session_id: Set(session.id),
            term_name: Set(input.term_name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_active: Set(input.is_active),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        tracing::info!(school_id = %school_id, term_id = %term.id, "Term created");
        Ok(term)
    }

    /// Replaces the editable fields of a term.
    pub async fn update_term(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: TermInput,
    ) -> Result<terms::Model, AcademicError> {
        check_range(input.start_date, input.end_date)?;
        let term = self
            .find_term(school_id, id)
            .await?
            .ok_or(AcademicError::TermNotFound(id))?;
        let session = self
            .find_session(school_id, input.session_id)
            .await?
            .ok_or(AcademicError::SessionNotFound(input.session_id))?;

        let txn = self.db.begin().await?;
        if input.is_active {
            deactivate_terms(&txn, session.id).await?;
        }

        let mut active = term.into_active_model();
        active.section_id = Set(session.section_id);
        active.session_id = Set(session.id);
        active.term_name = Set(input.term_name);
        active.start_date = Set(input.start_date);
        active.end_date = Set(input.end_date);
        active.is_active = Set(input.is_active);
        active.updated_at = Set(now());
        let term = active.update(&txn).await?;
        txn.commit().await?;

        Ok(term)
    }

    /// Deletes a term.
    pub async fn delete_term(&self, school_id: Uuid, id: Uuid) -> Result<(), AcademicError> {
        let result = terms::Entity::delete_many()
            .filter(terms::Column::Id.eq(id))
            .filter(terms::Column::SchoolId.eq(school_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AcademicError::TermNotFound(id));
        }
        Ok(())
    }

    async fn require_section(&self, school_id: Uuid, section_id: Uuid) -> Result<(), AcademicError> {
        sections::Entity::find_by_id(section_id)
            .filter(sections::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or(AcademicError::SectionNotFound(section_id))
    }
}

async fn deactivate_sessions<C: ConnectionTrait>(conn: &C, section_id: Uuid) -> Result<(), DbErr> {
    academic_sessions::Entity::update_many()
        .col_expr(academic_sessions::Column::IsActive, Expr::value(false))
        .filter(academic_sessions::Column::SectionId.eq(section_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn deactivate_terms<C: ConnectionTrait>(conn: &C, session_id: Uuid) -> Result<(), DbErr> {
    terms::Entity::update_many()
        .col_expr(terms::Column::IsActive, Expr::value(false))
        .filter(terms::Column::SessionId.eq(session_id))
        .exec(conn)
        .await?;
    Ok(())
}
