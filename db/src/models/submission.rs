use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use sea_orm::{DatabaseConnection, QueryOrder};

/// A student's uploaded experiment submission.
///
/// `path` points at the submission location, either the entry script or the
/// directory holding it, relative to the experiment storage root unless absolute.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub experiment_id: i64,
    pub student_id: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
    /// Bumped when the student resubmits over an existing record.
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::grade::Entity")]
    Grade,
}

impl Related<super::grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Grade.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        experiment_id: i64,
        student_id: &str,
        path: &str,
    ) -> Result<Model, DbErr> {
        let now = Utc::now();
        let active = ActiveModel {
            experiment_id: Set(experiment_id),
            student_id: Set(student_id.to_owned()),
            path: Set(path.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        active.insert(db).await
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Model>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// All submissions for an experiment, most recently (re)submitted first.
    pub async fn find_by_experiment(
        db: &DatabaseConnection,
        experiment_id: i64,
    ) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ExperimentId.eq(experiment_id))
            .order_by_desc(Column::UpdatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    /// Points the student's latest submission at `path`, creating one if the
    /// student has not submitted to this experiment yet.
    pub async fn upsert_for_student(
        db: &DatabaseConnection,
        experiment_id: i64,
        student_id: &str,
        path: &str,
    ) -> Result<Model, DbErr> {
        let existing = Entity::find()
            .filter(Column::ExperimentId.eq(experiment_id))
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::UpdatedAt)
            .order_by_desc(Column::Id)
            .one(db)
            .await?;

        match existing {
            Some(model) => {
                let mut active: ActiveModel = model.into();
                active.path = Set(path.to_owned());
                active.updated_at = Set(Utc::now());
                active.update(db).await
            }
            None => Self::create(db, experiment_id, student_id, path).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn find_by_experiment_is_most_recent_first() {
        let db = setup_test_db().await;
        let first = Model::create(&db, 1, "u1", "testcode/u1").await.unwrap();
        let second = Model::create(&db, 1, "u2", "testcode/u2").await.unwrap();
        Model::create(&db, 2, "u3", "testcode/u3").await.unwrap();

        let found = Model::find_by_experiment(&db, 1).await.unwrap();
        let ids: Vec<i64> = found.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn upsert_updates_existing_submission() {
        let db = setup_test_db().await;
        let created = Model::upsert_for_student(&db, 1, "u1", "old.py").await.unwrap();
        Model::create(&db, 1, "u2", "other.py").await.unwrap();
        let updated = Model::upsert_for_student(&db, 1, "u1", "new.py").await.unwrap();

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.path, "new.py");
        assert!(updated.updated_at >= created.updated_at);

        let found = Model::find_by_experiment(&db, 1).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].student_id, "u1");
    }

    #[tokio::test]
    async fn submission_has_at_most_one_grade() {
        use crate::models::grade::{self, NewGrade};

        let db = setup_test_db().await;
        let sub = Model::create(&db, 1, "u1", "testcode/u1").await.unwrap();
        assert!(sub.find_related(grade::Entity).one(&db).await.unwrap().is_none());

        for score in [40.0, 90.0] {
            grade::Model::record_grade(
                &db,
                NewGrade {
                    submission_id: sub.id,
                    experiment_id: 1,
                    student_id: "u1",
                    score,
                    status: "scored",
                    message: "ok",
                    grader_id: 1,
                },
            )
            .await
            .unwrap();
        }

        let related = sub.find_related(grade::Entity).one(&db).await.unwrap().unwrap();
        assert_eq!(related.submission_id, sub.id);
        assert_eq!(related.score, 90.0);
    }

    #[tokio::test]
    async fn find_by_id_missing_is_none() {
        let db = setup_test_db().await;
        assert!(Model::find_by_id(&db, 42).await.unwrap().is_none());
    }
}
