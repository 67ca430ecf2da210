use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202610160001_create_submissions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("submissions"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id"))
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key())
                    .col(ColumnDef::new(Alias::new("experiment_id"))
                        .big_integer()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("student_id"))
                        .string()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("path"))
                        .text()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("created_at"))
                        .timestamp()
                        .not_null()
                        .default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Alias::new("updated_at"))
                        .timestamp()
                        .not_null()
                        .default(Expr::cust("CURRENT_TIMESTAMP")))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_experiment")
                    .table(Alias::new("submissions"))
                    .col(Alias::new("experiment_id"))
                    .col(Alias::new("student_id"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("submissions"))
                    .to_owned(),
            )
            .await
    }
}
