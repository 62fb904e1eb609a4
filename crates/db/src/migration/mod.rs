//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and written with its
//! schema builder so they run on PostgreSQL and SQLite alike.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_tenancy;
mod m20260301_000002_finance;
mod m20260301_000003_academics;
mod m20260301_000004_messaging;
mod m20260301_000005_planning;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_tenancy::Migration),
            Box::new(m20260301_000002_finance::Migration),
            Box::new(m20260301_000003_academics::Migration),
            Box::new(m20260301_000004_messaging::Migration),
            Box::new(m20260301_000005_planning::Migration),
        ]
    }
}
