use crate::model::{SwapRow, Table};
use sqlx::error::Error;

const SWAP_COLUMNS: &str = r#"
    s.uuid,
    s.maker_coin,
    s.taker_coin,
    CAST(s.maker_amount AS TEXT) AS maker_amount,
    CAST(s.taker_amount AS TEXT) AS taker_amount,
    s.started_at,
    s.finished_at,
    s.is_success
"#;

impl Table<SwapRow> {
    /// Successful swaps finished after `from`.
    pub async fn get_finished_after(
        &self,
        from: i64,
    ) -> Result<Vec<SwapRow>, Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM stats_swaps s
            WHERE s.is_success = 1 AND s.finished_at > ?
            ORDER BY s.finished_at ASC
            "#,
            SWAP_COLUMNS
        );

        sqlx::query_as(&query)
            .bind(from)
            .fetch_all(&self.pool)
            .await
    }

    /// Latest successful swap per traded direction (maker coin, taker coin).
    pub async fn get_last_traded(&self) -> Result<Vec<SwapRow>, Error> {
        let query = format!(
            r#"
            SELECT {}
            FROM stats_swaps s
            INNER JOIN (
                SELECT maker_coin, taker_coin, MAX(finished_at) AS last_finished_at
                FROM stats_swaps
                WHERE is_success = 1
                GROUP BY maker_coin, taker_coin
            ) l
            ON s.maker_coin = l.maker_coin
                AND s.taker_coin = l.taker_coin
                AND s.finished_at = l.last_finished_at
            WHERE s.is_success = 1
            "#,
            SWAP_COLUMNS
        );

        sqlx::query_as(&query).fetch_all(&self.pool).await
    }
}
