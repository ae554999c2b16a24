//! Insert-vs-update reconciliation against the deals store.
//!
//! Every multi-statement write runs inside one transaction: either the game
//! row, both snapshots and all tag links land together, or none do and the
//! error propagates to the caller unmodified.

use anyhow::Result;
use chrono::Utc;
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use crate::model::{Listing, Playstyle, UserActivity, UserProfile};
use crate::store::Db;

impl Db {
    pub async fn game_exists(&self, game_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM game WHERE game_id = ?1")
            .bind(game_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Insert or fully replace a listing: game row, rating snapshot, price
    /// snapshot and tag links, atomically. Snapshots are whole-row replaced,
    /// never field-patched. Re-running on an unchanged listing converges: no
    /// duplicate game, tag or join rows, only the scrape timestamps move.
    pub async fn upsert_listing(&self, listing: &Listing) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let exists = game_exists_tx(&mut tx, &listing.id).await?;

        if exists {
            sqlx::query(
                "UPDATE game SET title = ?2, description = ?3, developer = ?4,
                 publisher = ?5, url = ?6, image_url = ?7
                 WHERE game_id = ?1",
            )
            .bind(&listing.id)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(&listing.developer)
            .bind(&listing.publisher)
            .bind(&listing.url)
            .bind(&listing.image_url)
            .execute(&mut *tx)
            .await?;
        } else {
            // Conflict guard: two concurrent fetches of the same identifier
            // must converge on one row instead of failing the second batch.
            sqlx::query(
                "INSERT INTO game (game_id, title, description, developer, publisher, url, image_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(game_id) DO UPDATE SET
                     title = excluded.title, description = excluded.description,
                     developer = excluded.developer, publisher = excluded.publisher,
                     url = excluded.url, image_url = excluded.image_url",
            )
            .bind(&listing.id)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(&listing.developer)
            .bind(&listing.publisher)
            .bind(&listing.url)
            .bind(&listing.image_url)
            .execute(&mut *tx)
            .await?;
        }

        let scrape_date = Utc::now().date_naive();
        sqlx::query(
            "INSERT INTO game_rating (game_id, monthly_rating, all_rating, scrape_date)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(game_id) DO UPDATE SET
                 monthly_rating = excluded.monthly_rating,
                 all_rating = excluded.all_rating,
                 scrape_date = excluded.scrape_date",
        )
        .bind(&listing.id)
        .bind(listing.monthly_rating)
        .bind(listing.all_rating)
        .bind(scrape_date)
        .execute(&mut *tx)
        .await?;

        let price = listing.effective_price().map(|p| p.to_string());
        sqlx::query(
            "INSERT INTO game_price (game_id, price, currency, is_on_sale, end_date, scrape_date)
             VALUES (?1, ?2, 'USD', ?3, ?4, ?5)
             ON CONFLICT(game_id) DO UPDATE SET
                 price = excluded.price, currency = excluded.currency,
                 is_on_sale = excluded.is_on_sale, end_date = excluded.end_date,
                 scrape_date = excluded.scrape_date",
        )
        .bind(&listing.id)
        .bind(price)
        .bind(listing.is_on_sale)
        .bind(listing.sale_end_date)
        .bind(scrape_date)
        .execute(&mut *tx)
        .await?;

        link_tags(&mut tx, &listing.id, &listing.tags).await?;

        tx.commit().await?;
        info!(game_id = %listing.id, updated = exists, "listing reconciled");
        Ok(())
    }

    pub async fn tag_exists(&self, name: &str) -> Result<Option<i64>> {
        let id: Option<i64> =
            sqlx::query_scalar("SELECT tag_id FROM tag WHERE tag_name = ?1 COLLATE NOCASE")
                .bind(name.trim())
                .fetch_optional(&self.pool)
                .await?;
        Ok(id)
    }

    pub async fn user_exists(&self, discord_id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM user WHERE discord_id = ?1")
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn create_user(&self, profile: &UserProfile) -> Result<()> {
        sqlx::query("INSERT INTO user (discord_id, first_seen, last_online, playstyle) VALUES (?1, ?2, ?3, ?4)")
            .bind(profile.discord_id)
            .bind(profile.first_seen)
            .bind(profile.last_online)
            .bind(profile.playstyle.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_user(
        &self,
        discord_id: i64,
        last_online: chrono::NaiveDate,
        playstyle: Playstyle,
    ) -> Result<()> {
        sqlx::query("UPDATE user SET last_online = ?2, playstyle = ?3 WHERE discord_id = ?1")
            .bind(discord_id)
            .bind(last_online)
            .bind(playstyle.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn rating_exists(&self, discord_id: i64, game_id: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM user_activity WHERE discord_id = ?1 AND game_id = ?2",
        )
        .bind(discord_id)
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// One activity row per `(discord_id, game_id)`: a second submission
    /// updates in place, never duplicates. Range/type validation happened at
    /// `UserActivity` construction.
    pub async fn upsert_rating(&self, activity: &UserActivity) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM user_activity WHERE discord_id = ?1 AND game_id = ?2",
        )
        .bind(activity.discord_id)
        .bind(&activity.game_id)
        .fetch_optional(&mut *tx)
        .await?;
        let exists = found.is_some();

        if exists {
            sqlx::query(
                "UPDATE user_activity SET activity_type = ?3, rating = ?4, timestamp = ?5
                 WHERE discord_id = ?1 AND game_id = ?2",
            )
            .bind(activity.discord_id)
            .bind(&activity.game_id)
            .bind(activity.activity.to_string())
            .bind(activity.rating as i64)
            .bind(activity.recorded_on)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "INSERT INTO user_activity (discord_id, game_id, activity_type, rating, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(discord_id, game_id) DO UPDATE SET
                     activity_type = excluded.activity_type,
                     rating = excluded.rating,
                     timestamp = excluded.timestamp",
            )
            .bind(activity.discord_id)
            .bind(&activity.game_id)
            .bind(activity.activity.to_string())
            .bind(activity.rating as i64)
            .bind(activity.recorded_on)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            discord_id = activity.discord_id,
            game_id = %activity.game_id,
            updated = exists,
            "rating reconciled"
        );
        Ok(())
    }
}

async fn game_exists_tx(tx: &mut Transaction<'_, Sqlite>, game_id: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM game WHERE game_id = ?1")
        .bind(game_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(found.is_some())
}

/// Reconcile the listing's tag set: insert unseen tag names (case-insensitive
/// dedupe), then link each tag insert-if-absent so re-runs never create
/// duplicate join rows.
async fn link_tags(tx: &mut Transaction<'_, Sqlite>, game_id: &str, tags: &[String]) -> Result<()> {
    for name in tags {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let tag_id: Option<i64> =
            sqlx::query_scalar("SELECT tag_id FROM tag WHERE tag_name = ?1 COLLATE NOCASE")
                .bind(name)
                .fetch_optional(&mut **tx)
                .await?;
        let tag_id = match tag_id {
            Some(id) => id,
            None => {
                // NOCASE unique constraint absorbs a concurrent insert of a
                // differently-cased duplicate; re-select to get whichever won.
                sqlx::query("INSERT INTO tag (tag_name) VALUES (?1) ON CONFLICT(tag_name) DO NOTHING")
                    .bind(name)
                    .execute(&mut **tx)
                    .await?;
                sqlx::query_scalar("SELECT tag_id FROM tag WHERE tag_name = ?1 COLLATE NOCASE")
                    .bind(name)
                    .fetch_one(&mut **tx)
                    .await?
            }
        };

        sqlx::query(
            "INSERT INTO game_tag (game_id, tag_id) VALUES (?1, ?2)
             ON CONFLICT(game_id, tag_id) DO NOTHING",
        )
        .bind(game_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
