use crate::models::StoredWarningRow;
use sqlx::SqlitePool;

pub struct WarningRepository {
    pool: SqlitePool,
}

impl WarningRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Every stored row in table order, recognized or not
    pub async fn list(&self) -> Result<Vec<StoredWarningRow>, sqlx::Error> {
        sqlx::query_as::<_, StoredWarningRow>(
            "SELECT channel_name, channel_id, creator_name, last_user_name, elapsed_days,
                    listed_at, days_from_listed
             FROM archive_warning_channels
             ORDER BY position"
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Replace the whole table, keeping `rows` in the order given
    pub async fn replace_all(&self, rows: &[StoredWarningRow]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM archive_warning_channels")
            .execute(&mut *tx)
            .await?;

        for (position, row) in rows.iter().enumerate() {
            sqlx::query(
                "INSERT INTO archive_warning_channels (position, channel_name, channel_id, creator_name,
                     last_user_name, elapsed_days, listed_at, days_from_listed)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
            )
            .bind(position as i64)
            .bind(&row.channel_name)
            .bind(&row.channel_id)
            .bind(&row.creator_name)
            .bind(&row.last_user_name)
            .bind(row.elapsed_days)
            .bind(&row.listed_at)
            .bind(row.days_from_listed)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
}
