use anyhow::Result;
use futures::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::model::public_holiday::PublicHolidayDay;

type YearKey = (u64, i32);

/// Public holiday days per `(public_holiday_id, year)`.
#[derive(Clone)]
pub struct HolidayCache {
    days: Cache<YearKey, Arc<Vec<PublicHolidayDay>>>,
}

impl HolidayCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            days: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Cached days of one calendar, loading them on a miss.
    pub async fn year(
        &self,
        pool: &MySqlPool,
        public_holiday_id: u64,
        year: i32,
    ) -> Result<Arc<Vec<PublicHolidayDay>>, AppError> {
        self.days
            .try_get_with((public_holiday_id, year), async {
                let days = sqlx::query_as::<_, PublicHolidayDay>(
                    r#"
                    SELECT id, public_holiday_id, date, year, name, duration
                    FROM public_holiday_days
                    WHERE public_holiday_id = ? AND year = ?
                    ORDER BY date
                    "#,
                )
                .bind(public_holiday_id)
                .bind(year)
                .fetch_all(pool)
                .await?;
                Ok::<_, sqlx::Error>(Arc::new(days))
            })
            .await
            .map_err(|e| AppError::Internal(format!("holiday lookup failed: {e}")))
    }

    pub async fn invalidate(&self, public_holiday_id: u64, year: i32) {
        self.days.invalidate(&(public_holiday_id, year)).await;
    }

    async fn insert_batch(&self, batch: BTreeMap<YearKey, Vec<PublicHolidayDay>>) {
        let futures: Vec<_> = batch
            .into_iter()
            .map(|(key, days)| self.days.insert(key, Arc::new(days)))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Loads the given years of every calendar, streaming rows and
    /// inserting whole years once a batch fills up.
    pub async fn warmup(&self, pool: &MySqlPool, years: &[i32], batch_size: usize) -> Result<()> {
        let (Some(first), Some(last)) = (years.iter().min(), years.iter().max()) else {
            return Ok(());
        };

        let mut stream = sqlx::query_as::<_, PublicHolidayDay>(
            r#"
            SELECT id, public_holiday_id, date, year, name, duration
            FROM public_holiday_days
            WHERE year BETWEEN ? AND ?
            ORDER BY public_holiday_id, year, date
            "#,
        )
        .bind(first)
        .bind(last)
        .fetch(pool);

        let mut batch: BTreeMap<YearKey, Vec<PublicHolidayDay>> = BTreeMap::new();
        let mut pending = 0usize;
        let mut total = 0usize;
        let mut current: Option<YearKey> = None;

        while let Some(row) = stream.next().await {
            let day = row?;
            let key = (day.public_holiday_id, day.year);
            total += 1;

            // Only flush on a year boundary so no year is cached half-loaded.
            if pending >= batch_size && current != Some(key) {
                self.insert_batch(std::mem::take(&mut batch)).await;
                pending = 0;
            }
            current = Some(key);
            batch.entry(key).or_default().push(day);
            pending += 1;
        }

        if !batch.is_empty() {
            self.insert_batch(batch).await;
        }

        log::info!(
            "Holiday cache warmup complete: {} days for years {}..={}",
            total,
            first,
            last
        );

        Ok(())
    }

    #[cfg(test)]
    async fn cached(&self, public_holiday_id: u64, year: i32) -> Option<Arc<Vec<PublicHolidayDay>>> {
        self.days.get(&(public_holiday_id, year)).await
    }
}
