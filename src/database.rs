/*!
Provides functionality to persist rabbit lists in the database.
Every list view is written as a whole snapshot under its own key.
!*/
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::entry::{Entry, ListKind};
use crate::error::Result;
use crate::list_manager::ListManager;
use crate::rules::{self, SortMode};

const UPSERT: &str = r#"
    insert into snapshot(key, body) values($1, $2)
    on conflict(key) do update set body = excluded.body
"#;

pub struct ListStore {
    pool: SqlitePool,
}

impl ListStore {
    /// Opens (creating if missing) the database file and runs migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_lazy_with(options);
        sqlx::migrate!().run(&pool).await?;
        debug!(path = %path.display(), "database ready");
        Ok(ListStore { pool })
    }

    /// Loads both snapshots of a list kind. The stored sort mode wins over
    /// `default_sort` when present and valid for the kind.
    pub async fn load_list<T: Entry>(&self, default_sort: SortMode) -> Result<ListManager<T>> {
        let sort = match self.load_sort(T::KIND).await? {
            Some(mode) if rules::supports(T::KIND, mode) => mode,
            Some(mode) => {
                warn!(kind = %T::KIND, %mode, "ignoring stored sort mode");
                default_sort
            }
            None => default_sort,
        };
        let active = self.load_snapshot::<T>(T::KIND.active_key()).await?;
        let history = self.load_snapshot::<T>(T::KIND.history_key()).await?;
        ListManager::from_snapshots(active, history, sort)
    }

    /// Overwrites the active, history and sort snapshots in one transaction.
    pub async fn save_list<T: Entry>(&self, list: &ListManager<T>) -> Result<()> {
        let kind = T::KIND;
        let writes = [
            (kind.active_key(), to_body(&list.active())?),
            (kind.history_key(), to_body(&list.history())?),
            (kind.sort_key(), to_body(&list.sort())?),
        ];

        let mut tx = self.pool.begin().await?;
        for (key, body) in writes {
            sqlx::query(UPSERT)
                .bind(key)
                .bind(body)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!(%kind, "list saved");
        Ok(())
    }

    pub async fn load_sort(&self, kind: ListKind) -> Result<Option<SortMode>> {
        match self.load_body(kind.sort_key()).await? {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    async fn load_snapshot<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.load_body(key).await? {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Ok(Vec::new()),
        }
    }

    async fn load_body(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("select body from snapshot where key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("body")?)),
            None => Ok(None),
        }
    }

    #[cfg(test)]
    async fn store_body(&self, key: &str, body: &str) -> Result<()> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn to_body<S: Serialize + ?Sized>(value: &S) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
