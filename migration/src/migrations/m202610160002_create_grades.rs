use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202610160002_create_grades"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("grades"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id"))
                        .big_integer()
                        .not_null()
                        .auto_increment()
                        .primary_key())
                    .col(ColumnDef::new(Alias::new("submission_id"))
                        .big_integer()
                        .not_null()
                        .unique_key())
                    .col(ColumnDef::new(Alias::new("experiment_id"))
                        .big_integer()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("student_id"))
                        .string()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("score"))
                        .double()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("status"))
                        .string()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("message"))
                        .text()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("comment"))
                        .text()
                        .null())
                    .col(ColumnDef::new(Alias::new("grader_id"))
                        .big_integer()
                        .not_null())
                    .col(ColumnDef::new(Alias::new("graded_at"))
                        .timestamp()
                        .not_null()
                        .default(Expr::cust("CURRENT_TIMESTAMP")))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_grades_submission")
                            .from(Alias::new("grades"), Alias::new("submission_id"))
                            .to(Alias::new("submissions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("grades"))
                    .to_owned(),
            )
            .await
    }
}
