//! Helpers shared by the repositories.

use sea_orm::{
    ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QuerySelect, SelectorTrait, SqlErr,
    prelude::DateTimeWithTimeZone,
};
use scholaris_shared::types::{PageRequest, PageResponse};
use uuid::Uuid;

use crate::entities::{classes, schools, subjects};

/// How many times an insert that generates an ID is attempted.
pub const MAX_ID_ATTEMPTS: u32 = 3;

/// Current time as stored in timestamp columns.
pub(crate) fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

/// Returns true if the error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Loads the school row and locks it for the rest of the transaction.
///
/// Serialises ID generation within one school. SQLite ignores the lock.
pub(crate) async fn lock_school<C: ConnectionTrait>(
    conn: &C,
    school_id: Uuid,
) -> Result<Option<schools::Model>, DbErr> {
    schools::Entity::find_by_id(school_id)
        .lock_exclusive()
        .one(conn)
        .await
}

/// Section of a class, provided the subject is taught in that class.
///
/// The inner error names the reference that is missing from the school or
/// belongs to another class.
pub(crate) async fn class_section<C: ConnectionTrait>(
    conn: &C,
    school_id: Uuid,
    class_id: Uuid,
    subject_id: Uuid,
) -> Result<Result<Uuid, String>, DbErr> {
    let Some(class) = find_in_school::<classes::Entity, _, _>(conn, class_id, school_id, |c| {
        c.school_id
    })
    .await?
    else {
        return Ok(Err(format!("class {class_id}")));
    };
    let subject = find_in_school::<subjects::Entity, _, _>(conn, subject_id, school_id, |s| {
        s.school_id
    })
    .await?;
    let fits = subject.is_some_and(|s| {
        s.section_id == class.section_id && s.class_id.is_none_or(|id| id == class.id)
    });
    if !fits {
        return Ok(Err(format!("subject {subject_id}")));
    }
    Ok(Ok(class.section_id))
}

/// One page of rows plus the total row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Rows across all pages.
    pub total: u64,
    /// Page that was fetched (1-indexed).
    pub page: u32,
    /// Page size.
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Converts the rows, keeping the paging figures.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self::new(page.items, page.page, page.per_page, page.total)
    }
}

/// Fetches one page from a select.
pub(crate) async fn fetch_page<'db, C, S>(
    conn: &'db C,
    select: S,
    page: &PageRequest,
) -> Result<Page<<S::Selector as SelectorTrait>::Item>, DbErr>
where
    C: ConnectionTrait,
    S: PaginatorTrait<'db, C>,
{
    let page = page.normalized();
    let paginator = select.paginate(conn, u64::from(page.per_page));
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(u64::from(page.page - 1)).await?;

    Ok(Page {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    })
}

/// Returns the entity's model if it exists and belongs to the school.
pub(crate) async fn find_in_school<E, C, F>(
    conn: &C,
    id: Uuid,
    school_id: Uuid,
    school_of: F,
) -> Result<Option<E::Model>, DbErr>
where
    E: EntityTrait,
    E::PrimaryKey: sea_orm::PrimaryKeyTrait<ValueType = Uuid>,
    C: ConnectionTrait,
    F: Fn(&E::Model) -> Uuid,
{
    Ok(E::find_by_id(id)
        .one(conn)
        .await?
        .filter(|model| school_of(model) == school_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_detection_ignores_other_errors() {
        assert!(!is_unique_violation(&DbErr::RecordNotFound("x".into())));
        assert!(!is_unique_violation(&DbErr::Custom("boom".into())));
    }
}
