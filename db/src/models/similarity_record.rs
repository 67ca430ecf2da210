//! Persisted results of weight-file similarity checks.
//!
//! Every check run writes a fresh batch of rows sharing one `run_id`, so earlier
//! runs stay available as an audit trail. Grades are never touched.

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryOrder, TransactionTrait};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "similarity_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub experiment_id: i64,
    pub run_id: String,
    /// 1-based position in the run's ranking.
    pub rank: i64,
    pub student_id: String,
    pub matched_student_id: Option<String>,
    pub similarity: f64,
    pub risk: Risk,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    sea_orm::strum::Display,
    sea_orm::strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Risk {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// One ranked row of a run, in ranking order.
#[derive(Debug, Clone)]
pub struct NewSimilarityRecord {
    pub student_id: String,
    pub matched_student_id: Option<String>,
    pub similarity: f64,
    pub risk: Risk,
}

impl Model {
    /// Stores `records` as a new run and returns the inserted rows in rank order.
    pub async fn insert_run(
        db: &DatabaseConnection,
        experiment_id: i64,
        records: Vec<NewSimilarityRecord>,
    ) -> Result<Vec<Model>, DbErr> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let txn = db.begin().await?;
        let mut inserted = Vec::with_capacity(records.len());
        for (idx, record) in records.into_iter().enumerate() {
            let active = ActiveModel {
                experiment_id: Set(experiment_id),
                run_id: Set(run_id.clone()),
                rank: Set(idx as i64 + 1),
                student_id: Set(record.student_id),
                matched_student_id: Set(record.matched_student_id),
                similarity: Set(record.similarity),
                risk: Set(record.risk),
                created_at: Set(now),
                ..Default::default()
            };
            inserted.push(active.insert(&txn).await?);
        }
        txn.commit().await?;

        tracing::debug!(experiment_id, run_id = %run_id, rows = inserted.len(), "stored similarity run");
        Ok(inserted)
    }

    /// Rows of the most recent run for an experiment, in rank order. Empty when
    /// no check has been run yet.
    pub async fn latest_run(
        db: &DatabaseConnection,
        experiment_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        let latest = Entity::find()
            .filter(Column::ExperimentId.eq(experiment_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .one(db)
            .await?;

        let Some(latest) = latest else {
            return Ok(Vec::new());
        };

        Entity::find()
            .filter(Column::ExperimentId.eq(experiment_id))
            .filter(Column::RunId.eq(latest.run_id))
            .order_by_asc(Column::Rank)
            .all(db)
            .await
    }
}
