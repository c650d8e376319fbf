//! SeaORM implementation of BaseRepository
//!
//! One instance serves one domain. Rows are hydrated through the factory
//! entry for that domain, so the repository never knows the concrete entity
//! type. Queries are built with SeaQuery against whichever backend the
//! connection points at.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::SubsecRound;
use sea_orm::sea_query::{Alias, Asterisk, Expr, Query, SimpleExpr};
use sea_orm::{ConnectionTrait, DatabaseConnection, Value};
use tracing::Instrument;

use crate::domain::entity::{self, COL_DELETED_AT, COL_EXTERNAL_ID, COL_ID, COL_UPDATED_AT};
use crate::domain::{
    Base, BaseRepository, DomainError, DomainFactory, DomainName, OpContext, SearchRepository,
};

/// Ids bound per `IN (...)` list, kept under the smallest backend bind limit
const ID_BATCH_SIZE: usize = 500;

/// SeaORM-based repository for a single registered domain
pub struct SeaOrmRepository {
    db: DatabaseConnection,
    factory: Arc<DomainFactory>,
    domain: DomainName,
}

impl SeaOrmRepository {
    pub fn new(
        db: DatabaseConnection,
        factory: Arc<DomainFactory>,
        domain: impl Into<DomainName>,
    ) -> Self {
        Self {
            db,
            factory,
            domain: domain.into(),
        }
    }

    /// Underlying connection, for domain-specific queries. Nothing done
    /// through it is covered by the repository's guarantees.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    /// Hard-delete rows by external id, soft-deleted ones included.
    /// Returns the number of rows removed.
    pub async fn purge(
        &self,
        ctx: &OpContext,
        external_ids: &[String],
    ) -> Result<u64, DomainError> {
        if external_ids.is_empty() {
            return Ok(0);
        }
        self.traced(ctx, "purge", async {
            let table = self.witness()?.table();
            let mut removed = 0;
            for batch in external_ids.chunks(ID_BATCH_SIZE) {
                let mut delete = Query::delete();
                delete
                    .from_table(Alias::new(table.as_str()))
                    .and_where(
                        Expr::col(Alias::new(COL_EXTERNAL_ID)).is_in(batch.iter().cloned()),
                    );

                let stmt = self.db.get_database_backend().build(&delete);
                removed += self.db.execute(stmt).await?.rows_affected();
            }
            tracing::info!("Purged {} {} rows", removed, table);
            Ok(removed)
        })
        .await
    }

    /// Zero value of the domain's entity, used as the hydration witness.
    fn witness(&self) -> Result<Box<dyn Base>, DomainError> {
        self.factory.create(self.domain.as_str())
    }

    fn span(&self, ctx: &OpContext, op: &'static str) -> tracing::Span {
        tracing::debug_span!(
            "repository",
            op = op,
            domain = %self.domain,
            request_id = ctx.request_id().unwrap_or_default()
        )
    }

    async fn traced<T, F>(
        &self,
        ctx: &OpContext,
        op: &'static str,
        operation: F,
    ) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>> + Send,
    {
        ctx.run(operation).instrument(self.span(ctx, op)).await
    }

    /// Live rows matching `condition`, hydrated through the witness.
    async fn select_where(
        &self,
        condition: SimpleExpr,
    ) -> Result<Vec<Box<dyn Base>>, DomainError> {
        let witness = self.witness()?;
        let mut select = Query::select();
        select
            .column(Asterisk)
            .from(Alias::new(witness.table().as_str()))
            .and_where(condition)
            .and_where(Expr::col(Alias::new(COL_DELETED_AT)).is_null());

        let stmt = self.db.get_database_backend().build(&select);
        let rows = self.db.query_all(stmt).await?;
        rows.iter().map(|row| witness.from_sql_row(row)).collect()
    }

    async fn select_one(
        &self,
        condition: SimpleExpr,
        key: String,
    ) -> Result<Box<dyn Base>, DomainError> {
        self.select_where(condition)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found(self.domain.as_str(), key))
    }

    async fn insert(&self, entity: &dyn Base) -> Result<u64, DomainError> {
        let table = entity.table();
        let (columns, values): (Vec<Alias>, Vec<SimpleExpr>) = entity
            .base()
            .sql_values()
            .into_iter()
            .chain(entity.sql_values())
            .map(|(column, value)| (Alias::new(column), SimpleExpr::from(value)))
            .unzip();

        let mut insert = Query::insert();
        insert
            .into_table(Alias::new(table.as_str()))
            .columns(columns)
            .values(values)
            .map_err(|e| DomainError::Serialization(e.to_string()))?;

        let backend = self.db.get_database_backend();
        if backend.support_returning() {
            insert.returning_col(Alias::new(COL_ID));
            let row = self
                .db
                .query_one(backend.build(&insert))
                .await?
                .ok_or_else(|| {
                    DomainError::Backend(format!("insert into {} returned no id", table))
                })?;
            let id: i64 = entity::column(&row, COL_ID)?;
            u64::try_from(id).map_err(|_| DomainError::Serialization(format!("negative id {}", id)))
        } else {
            Ok(self.db.execute(backend.build(&insert)).await?.last_insert_id())
        }
    }
}

#[async_trait]
impl BaseRepository for SeaOrmRepository {
    async fn get_by_id(&self, ctx: &OpContext, id: u64) -> Result<Box<dyn Base>, DomainError> {
        self.traced(ctx, "get_by_id", async {
            // Ids past i64::MAX can never have been assigned
            let Ok(raw) = i64::try_from(id) else {
                return Err(DomainError::not_found(self.domain.as_str(), id.to_string()));
            };
            self.select_one(Expr::col(Alias::new(COL_ID)).eq(raw), id.to_string())
                .await
        })
        .await
    }

    async fn get_by_external_id(
        &self,
        ctx: &OpContext,
        external_id: &str,
    ) -> Result<Box<dyn Base>, DomainError> {
        self.traced(ctx, "get_by_external_id", async {
            self.select_one(
                Expr::col(Alias::new(COL_EXTERNAL_ID)).eq(external_id),
                external_id.to_string(),
            )
            .await
        })
        .await
    }

    async fn multi_get_by_external_id(
        &self,
        ctx: &OpContext,
        external_ids: &[String],
    ) -> Result<Vec<Box<dyn Base>>, DomainError> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.traced(ctx, "multi_get_by_external_id", async {
            let mut found = Vec::new();
            for batch in external_ids.chunks(ID_BATCH_SIZE) {
                let rows = self
                    .select_where(
                        Expr::col(Alias::new(COL_EXTERNAL_ID)).is_in(batch.iter().cloned()),
                    )
                    .await?;
                found.extend(rows);
            }
            tracing::debug!("Found {} of {} requested", found.len(), external_ids.len());
            Ok(found)
        })
        .await
    }

    async fn create(
        &self,
        ctx: &OpContext,
        mut entity: Box<dyn Base>,
    ) -> Result<Box<dyn Base>, DomainError> {
        self.traced(ctx, "create", async move {
            if !self.factory.contains(self.domain.as_str()) {
                return Err(DomainError::Configuration(format!(
                    "no entity registered for domain '{}'",
                    self.domain
                )));
            }
            let now = entity::now();
            let base = entity.base_mut();
            if base.external_id.is_empty() {
                base.external_id = uuid::Uuid::new_v4().to_string();
            }
            base.created_at = Some(base.created_at.map_or(now, |t| t.trunc_subsecs(6)));
            base.updated_at = Some(base.updated_at.map_or(now, |t| t.trunc_subsecs(6)));
            base.deleted_at = base.deleted_at.map(|t| t.trunc_subsecs(6));

            let id = self.insert(entity.as_ref()).await?;
            entity.base_mut().id = id;
            tracing::debug!("Created {} {} (id {})", entity.table(), entity.external_id(), id);
            Ok(entity)
        })
        .await
    }

    async fn update(
        &self,
        ctx: &OpContext,
        external_id: &str,
        delta: &dyn Base,
    ) -> Result<Box<dyn Base>, DomainError> {
        self.traced(ctx, "update", async {
            let mut current = self
                .select_one(
                    Expr::col(Alias::new(COL_EXTERNAL_ID)).eq(external_id),
                    external_id.to_string(),
                )
                .await?;
            current.merge(delta)?;
            current.base_mut().updated_at = Some(entity::now());

            let values: Vec<(Alias, SimpleExpr)> = current
                .base()
                .sql_values()
                .into_iter()
                .chain(current.sql_values())
                .filter(|(column, _)| *column != COL_EXTERNAL_ID)
                .map(|(column, value)| (Alias::new(column), SimpleExpr::from(value)))
                .collect();

            let mut update = Query::update();
            update
                .table(Alias::new(current.table().as_str()))
                .values(values)
                .and_where(Expr::col(Alias::new(COL_EXTERNAL_ID)).eq(external_id))
                .and_where(Expr::col(Alias::new(COL_DELETED_AT)).is_null());

            let stmt = self.db.get_database_backend().build(&update);
            let result = self.db.execute(stmt).await?;
            if result.rows_affected() == 0 {
                // Purged or soft-deleted between the read and the write
                return Err(DomainError::not_found(self.domain.as_str(), external_id));
            }
            Ok(current)
        })
        .await
    }

    async fn soft_delete(&self, ctx: &OpContext, external_id: &str) -> Result<(), DomainError> {
        self.traced(ctx, "soft_delete", async {
            let table = self.witness()?.table();
            let now = Value::from(entity::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true));

            let mut update = Query::update();
            update
                .table(Alias::new(table.as_str()))
                .values([
                    (Alias::new(COL_DELETED_AT), SimpleExpr::from(now.clone())),
                    (Alias::new(COL_UPDATED_AT), SimpleExpr::from(now)),
                ])
                .and_where(Expr::col(Alias::new(COL_EXTERNAL_ID)).eq(external_id))
                .and_where(Expr::col(Alias::new(COL_DELETED_AT)).is_null());

            let stmt = self.db.get_database_backend().build(&update);
            if self.db.execute(stmt).await?.rows_affected() == 0 {
                return Err(DomainError::not_found(self.domain.as_str(), external_id));
            }
            tracing::debug!("Soft-deleted {} {}", table, external_id);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl SearchRepository for SeaOrmRepository {
    async fn exact_search(
        &self,
        ctx: &OpContext,
        column: &str,
        value: Value,
    ) -> Result<Vec<Box<dyn Base>>, DomainError> {
        self.traced(ctx, "exact_search", async {
            self.select_where(Expr::col(Alias::new(column)).eq(value))
                .await
        })
        .await
    }

    async fn range_search(
        &self,
        ctx: &OpContext,
        column: &str,
        start: Value,
        end: Value,
    ) -> Result<Vec<Box<dyn Base>>, DomainError> {
        self.traced(ctx, "range_search", async {
            self.select_where(Expr::col(Alias::new(column)).between(start, end))
                .await
        })
        .await
    }
}
