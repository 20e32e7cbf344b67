//! Schema migrations for the Blogicum database.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_categories_and_locations;
mod m20250301_000003_create_posts;
mod m20250301_000004_create_comments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_categories_and_locations::Migration),
            Box::new(m20250301_000003_create_posts::Migration),
            Box::new(m20250301_000004_create_comments::Migration),
        ]
    }
}
