//! Repository pattern for paper records
//!
//! `PaperStore` is the seam the HTTP layer talks to; `Repository` implements
//! it over a SeaORM connection. Multi-record reads come back in store order
//! (ascending insertion sequence) and singular lookups take the first match.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use crate::papers::NewPaper;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

/// Persistence operations on the paper collection
#[async_trait]
pub trait PaperStore: Send + Sync {
    /// Persist a new record; the store assigns its identifier
    async fn create(&self, paper: NewPaper) -> Result<Paper>;

    /// Every record, in store order
    async fn find_all(&self) -> Result<Vec<Paper>>;

    /// First record matching both fields exactly
    async fn find_one(&self, unit_code: &str, year_taken: &str) -> Result<Option<Paper>>;

    /// Every record with this unit code, in store order
    async fn find_by_unit_code(&self, unit_code: &str) -> Result<Vec<Paper>>;

    /// Write all business fields of an existing record
    async fn save(&self, paper: Paper) -> Result<Paper>;

    /// Remove a record; false if it was already gone
    async fn delete(&self, paper: &Paper) -> Result<bool>;

    /// Check the store is reachable
    async fn ping(&self) -> Result<()>;
}

/// SeaORM-backed paper store
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository over the given connection handle
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    /// Look a record up by its public identifier
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::Id.eq(id))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl PaperStore for Repository {
    async fn create(&self, paper: NewPaper) -> Result<Paper> {
        let model = PaperActiveModel {
            seq: ActiveValue::NotSet,
            id: ActiveValue::Set(Uuid::new_v4()),
            unit_code: ActiveValue::Set(paper.unit_code),
            year_taken: ActiveValue::Set(paper.year_taken),
            unit_title: ActiveValue::Set(paper.unit_title),
            file_location: ActiveValue::Set(paper.file_location),
            class_of_study: ActiveValue::Set(paper.class_of_study),
        };

        model.insert(self.conn()).await.map_err(Into::into)
    }

    async fn find_all(&self) -> Result<Vec<Paper>> {
        PaperEntity::find()
            .order_by_asc(PaperColumn::Seq)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn find_one(&self, unit_code: &str, year_taken: &str) -> Result<Option<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::UnitCode.eq(unit_code))
            .filter(PaperColumn::YearTaken.eq(year_taken))
            .order_by_asc(PaperColumn::Seq)
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn find_by_unit_code(&self, unit_code: &str) -> Result<Vec<Paper>> {
        PaperEntity::find()
            .filter(PaperColumn::UnitCode.eq(unit_code))
            .order_by_asc(PaperColumn::Seq)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }

    async fn save(&self, paper: Paper) -> Result<Paper> {
        let model = PaperActiveModel {
            seq: ActiveValue::Unchanged(paper.seq),
            id: ActiveValue::Unchanged(paper.id),
            unit_code: ActiveValue::Set(paper.unit_code),
            year_taken: ActiveValue::Set(paper.year_taken),
            unit_title: ActiveValue::Set(paper.unit_title),
            file_location: ActiveValue::Set(paper.file_location),
            class_of_study: ActiveValue::Set(paper.class_of_study),
        };

        model.update(self.conn()).await.map_err(Into::into)
    }

    async fn delete(&self, paper: &Paper) -> Result<bool> {
        let result = PaperEntity::delete_by_id(paper.seq)
            .exec(self.conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}
