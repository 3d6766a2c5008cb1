use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, instrument};

use dispatch_domain::{
    Dispatch, DispatchError, DispatchFilter, DispatchRepository, DispatchResult,
};

const DISPATCH_COLUMNS: &str = "id, area, description, date, status, start_time, \
     complete_time, pod_image, notes, recipient_name, owner_id, created_at";

pub struct PostgresDispatchRepository {
    pool: PgPool,
}

impl PostgresDispatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_dispatch(row: &sqlx::postgres::PgRow) -> DispatchResult<Dispatch> {
        Ok(Dispatch {
            id: row.try_get("id")?,
            area: row.try_get("area")?,
            description: row.try_get("description")?,
            date: row.try_get("date")?,
            status: row.try_get("status")?,
            start_time: row.try_get("start_time")?,
            complete_time: row.try_get("complete_time")?,
            pod_image: row.try_get("pod_image")?,
            notes: row.try_get("notes")?,
            recipient_name: row.try_get("recipient_name")?,
            owner_id: row.try_get("owner_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn push_predicates(builder: &mut QueryBuilder<'_, Postgres>, filter: &DispatchFilter) {
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(date) = filter.date {
            builder.push(" AND date = ").push_bind(date);
        }
        if let Some(area) = &filter.area {
            builder.push(" AND area = ").push_bind(area.clone());
        }
        if let Some(owner_id) = filter.owner_id {
            builder.push(" AND owner_id = ").push_bind(owner_id);
        }
    }
}

#[async_trait]
impl DispatchRepository for PostgresDispatchRepository {
    #[instrument(skip(self, dispatch), fields(area = %dispatch.area))]
    async fn create(&self, dispatch: &Dispatch) -> DispatchResult<Dispatch> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO dispatches
                (area, description, date, status, start_time, complete_time,
                 pod_image, notes, recipient_name, owner_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {DISPATCH_COLUMNS}
            "#
        ))
        .bind(&dispatch.area)
        .bind(&dispatch.description)
        .bind(dispatch.date)
        .bind(dispatch.status)
        .bind(dispatch.start_time)
        .bind(dispatch.complete_time)
        .bind(&dispatch.pod_image)
        .bind(&dispatch.notes)
        .bind(&dispatch.recipient_name)
        .bind(dispatch.owner_id)
        .bind(dispatch.created_at)
        .fetch_one(&self.pool)
        .await?;

        let created = Self::row_to_dispatch(&row)?;
        debug!(dispatch_id = created.id, "dispatch row inserted");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> DispatchResult<Option<Dispatch>> {
        let row = sqlx::query(&format!(
            "SELECT {DISPATCH_COLUMNS} FROM dispatches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_dispatch).transpose()
    }

    #[instrument(skip(self, filter))]
    async fn list(&self, filter: &DispatchFilter) -> DispatchResult<Vec<Dispatch>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {DISPATCH_COLUMNS} FROM dispatches WHERE 1=1"
        ));
        Self::push_predicates(&mut builder, filter);
        // storage-natural order is insertion order
        builder.push(" ORDER BY id");
        if let Some(limit) = filter.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = filter.offset {
            builder.push(" OFFSET ").push_bind(offset);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_dispatch).collect()
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &DispatchFilter) -> DispatchResult<i64> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM dispatches WHERE 1=1");
        Self::push_predicates(&mut builder, filter);

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.try_get(0)?)
    }

    #[instrument(skip(self, dispatch), fields(dispatch_id = %dispatch.id))]
    async fn update(&self, dispatch: &Dispatch) -> DispatchResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE dispatches
            SET area = $2, description = $3, date = $4, status = $5,
                start_time = $6, complete_time = $7, pod_image = $8,
                notes = $9, recipient_name = $10, owner_id = $11
            WHERE id = $1
            "#,
        )
        .bind(dispatch.id)
        .bind(&dispatch.area)
        .bind(&dispatch.description)
        .bind(dispatch.date)
        .bind(dispatch.status)
        .bind(dispatch.start_time)
        .bind(dispatch.complete_time)
        .bind(&dispatch.pod_image)
        .bind(&dispatch.notes)
        .bind(&dispatch.recipient_name)
        .bind(dispatch.owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::dispatch_not_found(dispatch.id));
        }
        Ok(())
    }
}
