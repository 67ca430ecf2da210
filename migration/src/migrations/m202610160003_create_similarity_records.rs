use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202610160003_create_similarity_records"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("similarity_records"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id"))
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key())
                    .col(ColumnDef::new(Alias::new("experiment_id"))
                        .big_integer()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("run_id"))
                        .string()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("rank"))
                        .big_integer()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("student_id"))
                        .string()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("matched_student_id"))
                        .string()
                        .null())
                    .col(ColumnDef::new(Alias::new("similarity"))
                        .double()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("risk"))
                        .string()
                        .not_null()
                        .default("low"))
                    .col(ColumnDef::new(Alias::new("created_at"))
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
                    .name("idx_similarity_records_experiment_run")
                    .table(Alias::new("similarity_records"))
                    .col(Alias::new("experiment_id"))
                    .col(Alias::new("run_id"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("similarity_records"))
                    .to_owned(),
            )
            .await
    }
}
