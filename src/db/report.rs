use crate::models::ChannelReportRow;
use sqlx::SqlitePool;

pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the whole table, keeping `rows` in the order given
    pub async fn replace_all(&self, rows: &[ChannelReportRow]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM public_channels")
            .execute(&mut *tx)
            .await?;

        for (position, row) in rows.iter().enumerate() {
            sqlx::query(
                "INSERT INTO public_channels (position, channel_name, channel_id, creator_name, created_date,
                     member_count, is_shared, last_user_name, last_message_text, last_message_date,
                     elapsed_days, is_whitelist)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            )
            .bind(position as i64)
            .bind(&row.channel_name)
            .bind(&row.channel_id)
            .bind(&row.creator_name)
            .bind(&row.created_date)
            .bind(row.member_count)
            .bind(row.is_shared)
            .bind(&row.last_user_name)
            .bind(&row.last_message_text)
            .bind(&row.last_message_date)
            .bind(row.elapsed_days)
            .bind(row.is_whitelist)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    pub async fn list(&self) -> Result<Vec<ChannelReportRow>, sqlx::Error> {
        sqlx::query_as::<_, ChannelReportRow>(
            "SELECT channel_name, channel_id, creator_name, created_date, member_count, is_shared,
                    last_user_name, last_message_text, last_message_date, elapsed_days, is_whitelist
             FROM public_channels
             ORDER BY position"
        )
        .fetch_all(&self.pool)
        .await
    }
}
