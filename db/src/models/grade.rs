use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryOrder};

/// The authoritative score for one submission. At most one row per submission.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "grades")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub submission_id: i64,
    pub experiment_id: i64,
    pub student_id: String,
    /// Accuracy percentage, 0 for every failed evaluation.
    pub score: f64,
    /// Evaluation status, e.g. `scored` or `length_mismatch`.
    pub status: String,
    pub message: String,
    /// Free-form reviewer note. Never written by the grader.
    pub comment: Option<String>,
    pub grader_id: i64,
    pub graded_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::submission::Entity",
        from = "Column::SubmissionId",
        to = "super::submission::Column::Id",
        on_delete = "Cascade"
    )]
    Submission,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submission.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Values written by [`Model::record_grade`].
#[derive(Debug, Clone)]
pub struct NewGrade<'a> {
    pub submission_id: i64,
    pub experiment_id: i64,
    pub student_id: &'a str,
    pub score: f64,
    pub status: &'a str,
    pub message: &'a str,
    pub grader_id: i64,
}

impl Model {
    /// Inserts or replaces the grade for `grade.submission_id`.
    ///
    /// Re-grading overwrites score, status, message, grader and timestamp; a
    /// reviewer `comment` already on the row is kept.
    pub async fn record_grade(db: &DatabaseConnection, grade: NewGrade<'_>) -> Result<Model, DbErr> {
        let now = Utc::now();

        match Self::find_by_submission(db, grade.submission_id).await? {
            Some(existing) => {
                let mut active: ActiveModel = existing.into();
                active.experiment_id = Set(grade.experiment_id);
                active.student_id = Set(grade.student_id.to_owned());
                active.score = Set(grade.score);
                active.status = Set(grade.status.to_owned());
                active.message = Set(grade.message.to_owned());
                active.grader_id = Set(grade.grader_id);
                active.graded_at = Set(now);
                active.update(db).await
            }
            None => {
                let active = ActiveModel {
                    submission_id: Set(grade.submission_id),
                    experiment_id: Set(grade.experiment_id),
                    student_id: Set(grade.student_id.to_owned()),
                    score: Set(grade.score),
                    status: Set(grade.status.to_owned()),
                    message: Set(grade.message.to_owned()),
                    comment: Set(None),
                    grader_id: Set(grade.grader_id),
                    graded_at: Set(now),
                    ..Default::default()
                };
                active.insert(db).await
            }
        }
    }

    pub async fn find_by_submission(
        db: &DatabaseConnection,
        submission_id: i64,
    ) -> Result<Option<Model>, DbErr> {
        Entity::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .one(db)
            .await
    }

    /// Grades for an experiment, highest score first.
    pub async fn find_by_experiment(
        db: &DatabaseConnection,
        experiment_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExperimentId.eq(experiment_id))
            .order_by_desc(Column::Score)
            .order_by_asc(Column::StudentId)
            .all(db)
            .await
    }

    pub async fn set_comment(
        db: &DatabaseConnection,
        submission_id: i64,
        comment: Option<String>,
    ) -> Result<Model, DbErr> {
        let mut active: ActiveModel = Self::find_by_submission(db, submission_id)
            .await?
            .ok_or(DbErr::RecordNotFound("grade not found".to_string()))?
            .into();
        active.comment = Set(comment);
        active.update(db).await
    }
}
