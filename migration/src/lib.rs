pub use sea_orm_migration::prelude::*;

pub mod entities;
mod m20261001_000001_user_profiles;
mod m20261001_000002_deals;
mod m20261001_000003_deal_activity;
mod m20261005_000001_deal_view_marks;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_user_profiles::Migration),
            Box::new(m20261001_000002_deals::Migration),
            Box::new(m20261001_000003_deal_activity::Migration),
            Box::new(m20261005_000001_deal_view_marks::Migration),
        ]
    }
}
