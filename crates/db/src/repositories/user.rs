//! User repository for staff and parent accounts.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use scholaris_core::registration;
use scholaris_shared::types::PageRequest;
use uuid::Uuid;

use super::common::{MAX_ID_ATTEMPTS, Page, fetch_page, is_unique_violation, lock_school, now};
use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found in this school.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// School not found.
    #[error("School not found: {0}")]
    SchoolNotFound(Uuid),

    /// Email already registered.
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    /// Could not issue a unique registration ID.
    #[error("Could not allocate a registration ID after {0} attempts")]
    RegistrationIdExhausted(u32),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Owning school.
    pub school_id: Uuid,
    /// Login email.
    pub email: String,
    /// Argon2 hash.
    pub password_hash: String,
    /// Full name.
    pub full_name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Role.
    pub role: UserRole,
}

/// Input for updating a user. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// Full name.
    pub full_name: Option<String>,
    /// Phone number.
    pub phone: Option<Option<String>>,
    /// New password hash.
    pub password_hash: Option<String>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Filter options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Only users with this role.
    pub role: Option<UserRole>,
    /// Name, email or registration ID contains.
    pub search: Option<String>,
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a user of the given school.
    pub async fn find_in_school(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::SchoolId.eq(school_id))
            .one(&self.db)
            .await
    }

    /// Lists users of a school.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<Page<users::Model>, DbErr> {
        let mut query = users::Entity::find()
            .filter(users::Column::SchoolId.eq(school_id))
            .order_by_asc(users::Column::FullName);

        if let Some(role) = filter.role {
            query = query.filter(users::Column::Role.eq(role));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(users::Column::FullName.contains(search))
                    .add(users::Column::Email.contains(search))
                    .add(users::Column::RegistrationId.contains(search)),
            );
        }

        fetch_page(&self.db, query, page).await
    }

    /// IDs of the active users holding a role in a school.
    pub async fn ids_with_role(&self, school_id: Uuid, role: UserRole) -> Result<Vec<Uuid>, DbErr> {
        users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::SchoolId.eq(school_id))
            .filter(users::Column::Role.eq(role))
            .filter(users::Column::IsActive.eq(true))
            .into_tuple()
            .all(&self.db)
            .await
    }

    /// Counts users by role.
    pub async fn count_with_role(&self, school_id: Uuid, role: UserRole) -> Result<u64, DbErr> {
        users::Entity::find()
            .filter(users::Column::SchoolId.eq(school_id))
            .filter(users::Column::Role.eq(role))
            .count(&self.db)
            .await
    }

    /// Creates a user and issues their registration ID.
    ///
    /// The ID is generated while the school row is locked. A unique-index
    /// collision retries the whole insert up to [`MAX_ID_ATTEMPTS`] times.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        if self.find_by_email(&input.email).await?.is_some() {
            return Err(UserError::DuplicateEmail(input.email));
        }

        for attempt in 1..=MAX_ID_ATTEMPTS {
            match self.try_create(&input).await {
                Err(UserError::Database(e)) if is_unique_violation(&e) => {
                    if self.find_by_email(&input.email).await?.is_some() {
                        return Err(UserError::DuplicateEmail(input.email));
                    }
                    tracing::warn!(
                        school_id = %input.school_id,
                        attempt,
                        "Registration ID collision, retrying"
                    );
                }
                other => return other,
            }
        }

        Err(UserError::RegistrationIdExhausted(MAX_ID_ATTEMPTS))
    }

    async fn try_create(&self, input: &CreateUserInput) -> Result<users::Model, UserError> {
        let txn = self.db.begin().await?;

        let school = lock_school(&txn, input.school_id)
            .await?
            .ok_or(UserError::SchoolNotFound(input.school_id))?;

        let prefix = registration::role_prefix(input.role.into());
        let stem = registration::id_stem(&school.short_code, prefix);
        let issued: Vec<Option<String>> = users::Entity::find()
            .select_only()
            .column(users::Column::RegistrationId)
            .filter(users::Column::SchoolId.eq(school.id))
            .filter(users::Column::RegistrationId.starts_with(&stem))
            .into_tuple()
            .all(&txn)
            .await?;
        let registration_id = registration::next_id(
            &school.short_code,
            prefix,
            issued.iter().flatten().map(String::as_str),
        );

        let timestamp = now();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school.id),
            email: Set(input.email.clone()),
            password_hash: Set(input.password_hash.clone()),
            full_name: Set(input.full_name.clone()),
            phone: Set(input.phone.clone()),
            role: Set(input.role),
            registration_id: Set(Some(registration_id)),
            is_active: Set(true),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(
            school_id = %user.school_id,
            user_id = %user.id,
            registration_id = ?user.registration_id,
            "User created"
        );
        Ok(user)
    }

    /// Updates a user of the given school.
    pub async fn update(
        &self,
        school_id: Uuid,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let user = self
            .find_in_school(school_id, id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let mut active = user.into_active_model();
        if let Some(full_name) = input.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(hash) = input.password_hash {
            active.password_hash = Set(hash);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(now());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a user of the given school.
    pub async fn delete(&self, school_id: Uuid, id: Uuid) -> Result<(), UserError> {
        let result = users::Entity::delete_many()
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::SchoolId.eq(school_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }
}
