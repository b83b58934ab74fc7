#![deny(warnings)]

use persistence::migration::version_of;
use persistence::{default_sqlite_url, init_db, migrate, CURRENT_VERSION};
use sqlx::SqlitePool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Outcome of one pass over the stored sessions.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    upgraded: usize,
    skipped: usize,
}

/// Upgrade every stored session document below the current version. A row
/// that cannot be read or migrated is logged and left as it is.
async fn upgrade_sessions(pool: &SqlitePool) -> Result<Summary, sqlx::Error> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT key, value FROM kv WHERE key LIKE '%:session'")
            .fetch_all(pool)
            .await?;
    let mut summary = Summary::default();
    for (key, value) in rows {
        let doc: serde_json::Value = match serde_json::from_str(&value) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(%key, error = %e, "unreadable session, skipped");
                summary.skipped += 1;
                continue;
            }
        };
        let before = version_of(&doc);
        if before >= CURRENT_VERSION {
            continue;
        }
        let text = match migrate(doc).and_then(|d| Ok(serde_json::to_string(&d)?)) {
            Ok(text) => text,
            Err(e) => {
                warn!(%key, from = before, error = %e, "session cannot be migrated, skipped");
                summary.skipped += 1;
                continue;
            }
        };
        sqlx::query("UPDATE kv SET value = ?, updated_at = ? WHERE key = ?")
            .bind(text)
            .bind(chrono::Utc::now().timestamp_millis())
            .bind(&key)
            .execute(pool)
            .await?;
        info!(%key, from = before, to = CURRENT_VERSION, "session migrated");
        summary.upgraded += 1;
    }
    Ok(summary)
}

/// Create the save database, then upgrade every stored session document
/// to the current schema.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"));
    if let Some(path) = path {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let pool = init_db(&url).await?;
    let summary = upgrade_sessions(&pool).await?;
    println!(
        "DB migrated at {url} ({} saves upgraded, {} skipped)",
        summary.upgraded, summary.skipped
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn put(pool: &SqlitePool, key: &str, value: &str) {
        sqlx::query("INSERT INTO kv (key, value, updated_at) VALUES (?, ?, 0)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn broken_rows_do_not_stop_the_batch() {
        let pool = init_db("sqlite::memory:").await.unwrap();
        put(&pool, "a:session", "not json").await;
        put(&pool, "b:session", "[1, 2]").await;
        put(&pool, "c:session", r#"{"player": {"coins": 100}}"#).await;
        put(&pool, "c:research", r#"{"version": 1}"#).await;

        let summary = upgrade_sessions(&pool).await.unwrap();
        assert_eq!(summary, Summary { upgraded: 1, skipped: 2 });

        let value: String = sqlx::query_scalar("SELECT value FROM kv WHERE key = 'c:session'")
            .fetch_one(&pool)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_str(&value).unwrap();
        assert_eq!(version_of(&doc), CURRENT_VERSION);

        let again = upgrade_sessions(&pool).await.unwrap();
        assert_eq!(again, Summary { upgraded: 0, skipped: 2 });
    }
}
