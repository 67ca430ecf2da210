use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202610160001_create_submissions::Migration),
            Box::new(migrations::m202610160002_create_grades::Migration),
            Box::new(migrations::m202610160003_create_similarity_records::Migration),
        ]
    }
}
