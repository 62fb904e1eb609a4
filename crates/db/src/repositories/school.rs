//! School repository: onboarding, settings and short-code renames.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set, TransactionTrait,
};
use scholaris_core::registration;
use uuid::Uuid;

use super::common::{is_unique_violation, lock_school, now};
use crate::entities::{
    schools, sea_orm_active_enums::UserRole, students, users,
};

/// Error types for school operations.
#[derive(Debug, thiserror::Error)]
pub enum SchoolError {
    /// School not found.
    #[error("School not found: {0}")]
    NotFound(Uuid),

    /// Short code already taken by another school.
    #[error("Short code '{0}' is already in use")]
    DuplicateShortCode(String),

    /// Email already registered.
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for onboarding a school together with its first user.
#[derive(Debug, Clone)]
pub struct OnboardSchoolInput {
    /// School name.
    pub name: String,
    /// Normalised short code.
    pub short_code: String,
    /// School address.
    pub address: Option<String>,
    /// School phone.
    pub phone: Option<String>,
    /// School email.
    pub email: Option<String>,
    /// Proprietor's full name.
    pub owner_name: String,
    /// Proprietor's login email.
    pub owner_email: String,
    /// Proprietor's hashed password.
    pub owner_password_hash: String,
}

/// Input for updating a school. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSchoolInput {
    /// School name.
    pub name: Option<String>,
    /// Normalised short code; a change renames every issued ID.
    pub short_code: Option<String>,
    /// School address.
    pub address: Option<Option<String>>,
    /// School phone.
    pub phone: Option<Option<String>>,
    /// School email.
    pub email: Option<Option<String>>,
    /// Logo URL.
    pub logo_url: Option<Option<String>>,
    /// Gateway subaccount for split settlement.
    pub paystack_subaccount_code: Option<Option<String>>,
    /// Platform fee percentage.
    pub platform_fee_percentage: Option<Option<Decimal>>,
    /// Settlement bank name.
    pub settlement_bank: Option<Option<String>>,
    /// Settlement account number.
    pub account_number: Option<Option<String>>,
}

/// Result of a school update.
#[derive(Debug, Clone)]
pub struct SchoolUpdate {
    /// The updated school.
    pub school: schools::Model,
    /// Registration IDs and admission numbers rewritten by a short-code change.
    pub renamed_ids: u64,
}

/// School repository.
#[derive(Debug, Clone)]
pub struct SchoolRepository {
    db: DatabaseConnection,
}

impl SchoolRepository {
    /// Creates a new school repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a school by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<schools::Model>, DbErr> {
        schools::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a school by short code.
    pub async fn find_by_short_code(&self, code: &str) -> Result<Option<schools::Model>, DbErr> {
        schools::Entity::find()
            .filter(schools::Column::ShortCode.eq(code))
            .one(&self.db)
            .await
    }

    /// Creates a school and its proprietor in one transaction.
    ///
    /// The proprietor receives the school's first `PROP` registration ID.
    pub async fn onboard(
        &self,
        input: OnboardSchoolInput,
    ) -> Result<(schools::Model, users::Model), SchoolError> {
        let txn = self.db.begin().await?;

        let taken = schools::Entity::find()
            .filter(schools::Column::ShortCode.eq(&input.short_code))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(SchoolError::DuplicateShortCode(input.short_code));
        }

        let email_taken = users::Entity::find()
            .filter(users::Column::Email.eq(&input.owner_email))
            .one(&txn)
            .await?;
        if email_taken.is_some() {
            return Err(SchoolError::DuplicateEmail(input.owner_email));
        }

        let timestamp = now();
        let school = schools::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            short_code: Set(input.short_code.clone()),
            address: Set(input.address),
            phone: Set(input.phone),
            email: Set(input.email),
            logo_url: Set(None),
            is_active: Set(true),
            paystack_subaccount_code: Set(None),
            platform_fee_percentage: Set(None),
            settlement_bank: Set(None),
            account_number: Set(None),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                SchoolError::DuplicateShortCode(input.short_code.clone())
            } else {
                SchoolError::Database(e)
            }
        })?;

        let prefix = registration::role_prefix(UserRole::Proprietor.into());
        let owner = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school.id),
            email: Set(input.owner_email),
            password_hash: Set(input.owner_password_hash),
            full_name: Set(input.owner_name),
            phone: Set(None),
            role: Set(UserRole::Proprietor),
            registration_id: Set(Some(registration::format_id(&school.short_code, prefix, 1))),
            is_active: Set(true),
            created_at: Set(timestamp),
            updated_at: Set(timestamp),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(school_id = %school.id, short_code = %school.short_code, "School onboarded");
        Ok((school, owner))
    }

    /// Updates a school.
    ///
    /// A short-code change rewrites the leading `OLD-` of every registration
    /// ID and admission number of the school, atomically with the update.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateSchoolInput,
    ) -> Result<SchoolUpdate, SchoolError> {
        let txn = self.db.begin().await?;

        let existing = lock_school(&txn, id)
            .await?
            .ok_or(SchoolError::NotFound(id))?;
        let old_code = existing.short_code.clone();

        let rename_to = match input.short_code {
            Some(code) if code != old_code => {
                let taken = schools::Entity::find()
                    .filter(schools::Column::ShortCode.eq(&code))
                    .filter(schools::Column::Id.ne(id))
                    .one(&txn)
                    .await?;
                if taken.is_some() {
                    return Err(SchoolError::DuplicateShortCode(code));
                }
                Some(code)
            }
            _ => None,
        };

        let mut school = existing.into_active_model();
        if let Some(name) = input.name {
            school.name = Set(name);
        }
        if let Some(code) = &rename_to {
            school.short_code = Set(code.clone());
        }
        if let Some(address) = input.address {
            school.address = Set(address);
        }
        if let Some(phone) = input.phone {
            school.phone = Set(phone);
        }
        if let Some(email) = input.email {
            school.email = Set(email);
        }
        if let Some(logo_url) = input.logo_url {
            school.logo_url = Set(logo_url);
        }
        if let Some(code) = input.paystack_subaccount_code {
            school.paystack_subaccount_code = Set(code);
        }
        if let Some(pct) = input.platform_fee_percentage {
            school.platform_fee_percentage = Set(pct);
        }
        if let Some(bank) = input.settlement_bank {
            school.settlement_bank = Set(bank);
        }
        if let Some(account) = input.account_number {
            school.account_number = Set(account);
        }
        school.updated_at = Set(now());
        let school = school.update(&txn).await?;

        let mut renamed_ids = 0;
        if let Some(new_code) = &rename_to {
            renamed_ids = rename_issued_ids(&txn, id, &old_code, new_code).await?;
        }

        txn.commit().await?;

        if rename_to.is_some() {
            tracing::info!(
                school_id = %id,
                old_code = %old_code,
                new_code = %school.short_code,
                renamed_ids,
                "School short code changed"
            );
        }

        Ok(SchoolUpdate {
            school,
            renamed_ids,
        })
    }
}

async fn rename_issued_ids(
    txn: &sea_orm::DatabaseTransaction,
    school_id: Uuid,
    old_code: &str,
    new_code: &str,
) -> Result<u64, DbErr> {
    let stem = format!("{old_code}-");
    let mut renamed = 0;

    let staff = users::Entity::find()
        .filter(users::Column::SchoolId.eq(school_id))
        .filter(users::Column::RegistrationId.starts_with(&stem))
        .all(txn)
        .await?;
    for user in staff {
        let Some(new_id) = user
            .registration_id
            .as_deref()
            .and_then(|rid| registration::rename_prefix(rid, old_code, new_code))
        else {
            continue;
        };
        let mut active = user.into_active_model();
        active.registration_id = Set(Some(new_id));
        active.update(txn).await?;
        renamed += 1;
    }

    let pupils = students::Entity::find()
        .filter(students::Column::SchoolId.eq(school_id))
        .filter(students::Column::AdmissionNumber.starts_with(&stem))
        .all(txn)
        .await?;
    for student in pupils {
        let Some(new_number) =
            registration::rename_prefix(&student.admission_number, old_code, new_code)
        else {
            continue;
        };
        let mut active = student.into_active_model();
        active.admission_number = Set(new_number);
        active.update(txn).await?;
        renamed += 1;
    }

    Ok(renamed)
}
