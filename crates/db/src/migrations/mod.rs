//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_account_table;
mod m20250101_000003_create_session_table;
mod m20250101_000004_create_poll_table;
mod m20250101_000005_create_choice_table;
mod m20250101_000006_create_example_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_account_table::Migration),
            Box::new(m20250101_000003_create_session_table::Migration),
            Box::new(m20250101_000004_create_poll_table::Migration),
            Box::new(m20250101_000005_create_choice_table::Migration),
            Box::new(m20250101_000006_create_example_table::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 6);
    }
}
