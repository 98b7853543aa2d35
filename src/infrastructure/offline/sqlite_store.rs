use crate::application::ports::offline_store::OfflineStore;
use crate::domain::entities::{
    DefectType, InspectionDraft, InspectionProcess, Machine, OfflineInspectionRecord, ProductModel,
    RecordStatusChange, RetryEffect, UserAccount,
};
use crate::domain::value_objects::{LocalId, RecordStatus};
use crate::infrastructure::offline::mappers;
use crate::infrastructure::offline::rows::{OfflineInspectionRow, ReferenceRow, UserRow};
use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::time::Duration;

/// SQLiteバックエンドのローカルストア実装。
///
/// 更新系はすべて単文またはトランザクションで完結し、復帰時点で
/// 永続化済みであることを保証する。
pub struct SqliteOfflineStore {
    pool: Pool<Sqlite>,
    retry_ceiling: u32,
}

impl SqliteOfflineStore {
    pub fn new(pool: Pool<Sqlite>, retry_ceiling: u32) -> Self {
        Self { pool, retry_ceiling }
    }

    /// 設定からプールを張り、マイグレーションを適用する。
    pub async fn connect(config: &DatabaseConfig, retry_ceiling: u32) -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool, retry_ceiling))
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn replace_code_table(
        &self,
        table: &str,
        rows: Vec<(String, String, String, bool, i64)>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;
        for (id, code, name, is_active, cached_at) in rows {
            sqlx::query(&format!(
                "INSERT INTO {table} (id, code, name, is_active, cached_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))
            .bind(id)
            .bind(code)
            .bind(name)
            .bind(is_active)
            .bind(cached_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_code_table(&self, table: &str) -> Result<Vec<ReferenceRow>, AppError> {
        let rows = sqlx::query_as::<_, ReferenceRow>(&format!(
            "SELECT id, code, name, is_active, cached_at FROM {table} ORDER BY code ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl OfflineStore for SqliteOfflineStore {
    async fn insert_pending(&self, draft: InspectionDraft) -> Result<LocalId, AppError> {
        let local_id = LocalId::generate();
        let created_at = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO offline_inspections (
                local_id, model_id, process_id, defect_type_id, machine_id,
                inspector_id, inspector_name, inspected_quantity, defect_quantity,
                photo_base64, notes, status, retry_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, ?13)
            "#,
        )
        .bind(local_id.as_str())
        .bind(&draft.model_id)
        .bind(&draft.process_id)
        .bind(&draft.defect_type_id)
        .bind(&draft.machine_id)
        .bind(&draft.inspector_id)
        .bind(&draft.inspector_name)
        .bind(i64::from(draft.inspected_quantity))
        .bind(i64::from(draft.defect_quantity))
        .bind(draft.photo.as_ref().map(|p| p.as_str().to_string()))
        .bind(&draft.notes)
        .bind(RecordStatus::Pending.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(local_id)
    }

    async fn list_pending(&self) -> Result<Vec<OfflineInspectionRecord>, AppError> {
        let rows = sqlx::query_as::<_, OfflineInspectionRow>(
            r#"
            SELECT * FROM offline_inspections
            WHERE status IN ('pending', 'error') AND retry_count < ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(i64::from(self.retry_ceiling))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(mappers::inspection_from_row).collect()
    }

    async fn update_status(
        &self,
        id: &LocalId,
        change: RecordStatusChange,
    ) -> Result<(), AppError> {
        let result = match change.status() {
            RecordStatus::Syncing => {
                sqlx::query("UPDATE offline_inspections SET status = ?1 WHERE local_id = ?2")
                    .bind(RecordStatus::Syncing.as_str())
                    .bind(id.as_str())
                    .execute(&self.pool)
                    .await?
            }
            RecordStatus::Synced => {
                let synced_at = change
                    .synced_at()
                    .map(|at| at.timestamp())
                    .ok_or_else(|| AppError::Internal("synced change without timestamp".into()))?;
                sqlx::query(
                    r#"
                    UPDATE offline_inspections
                    SET status = ?1, synced_at = ?2, error_message = NULL
                    WHERE local_id = ?3
                    "#,
                )
                .bind(RecordStatus::Synced.as_str())
                .bind(synced_at)
                .bind(id.as_str())
                .execute(&self.pool)
                .await?
            }
            RecordStatus::Error => {
                let message = change
                    .error_message()
                    .ok_or_else(|| AppError::Internal("error change without message".into()))?;
                match change.retry_effect() {
                    RetryEffect::Increment => {
                        sqlx::query(
                            r#"
                            UPDATE offline_inspections
                            SET status = ?1, error_message = ?2,
                                retry_count = retry_count + 1
                            WHERE local_id = ?3
                            "#,
                        )
                        .bind(RecordStatus::Error.as_str())
                        .bind(message)
                        .bind(id.as_str())
                        .execute(&self.pool)
                        .await?
                    }
                    RetryEffect::Exhaust => {
                        sqlx::query(
                            r#"
                            UPDATE offline_inspections
                            SET status = ?1, error_message = ?2,
                                retry_count = MAX(retry_count, ?3)
                            WHERE local_id = ?4
                            "#,
                        )
                        .bind(RecordStatus::Error.as_str())
                        .bind(message)
                        .bind(i64::from(self.retry_ceiling))
                        .bind(id.as_str())
                        .execute(&self.pool)
                        .await?
                    }
                    RetryEffect::Keep => {
                        sqlx::query(
                            r#"
                            UPDATE offline_inspections
                            SET status = ?1, error_message = ?2
                            WHERE local_id = ?3
                            "#,
                        )
                        .bind(RecordStatus::Error.as_str())
                        .bind(message)
                        .bind(id.as_str())
                        .execute(&self.pool)
                        .await?
                    }
                }
            }
            RecordStatus::Pending => {
                return Err(AppError::Internal(
                    "transition back to pending is not supported".into(),
                ));
            }
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("record {id} does not exist")));
        }
        Ok(())
    }

    async fn list_synced(&self, limit: u32) -> Result<Vec<OfflineInspectionRecord>, AppError> {
        let rows = sqlx::query_as::<_, OfflineInspectionRow>(
            r#"
            SELECT * FROM offline_inspections
            WHERE status = 'synced'
            ORDER BY synced_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(mappers::inspection_from_row).collect()
    }

    async fn purge_synced_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM offline_inspections
            WHERE status = 'synced' AND synced_at IS NOT NULL AND synced_at < ?1
            "#,
        )
        .bind(cutoff.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn pending_count(&self) -> Result<u64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM offline_inspections
            WHERE status IN ('pending', 'error') AND retry_count < ?1
            "#,
        )
        .bind(i64::from(self.retry_ceiling))
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn get(&self, id: &LocalId) -> Result<Option<OfflineInspectionRecord>, AppError> {
        let row = sqlx::query_as::<_, OfflineInspectionRow>(
            "SELECT * FROM offline_inspections WHERE local_id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(mappers::inspection_from_row).transpose()
    }

    async fn list_exhausted(&self) -> Result<Vec<OfflineInspectionRecord>, AppError> {
        let rows = sqlx::query_as::<_, OfflineInspectionRow>(
            r#"
            SELECT * FROM offline_inspections
            WHERE status = 'error' AND retry_count >= ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(i64::from(self.retry_ceiling))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(mappers::inspection_from_row).collect()
    }

    async fn replace_product_models(&self, rows: Vec<ProductModel>) -> Result<(), AppError> {
        let rows = rows
            .into_iter()
            .map(|m| (m.id, m.code, m.name, m.is_active, m.cached_at.timestamp()))
            .collect();
        self.replace_code_table("product_models", rows).await
    }

    async fn replace_inspection_processes(
        &self,
        rows: Vec<InspectionProcess>,
    ) -> Result<(), AppError> {
        let rows = rows
            .into_iter()
            .map(|p| (p.id, p.code, p.name, p.is_active, p.cached_at.timestamp()))
            .collect();
        self.replace_code_table("inspection_processes", rows).await
    }

    async fn replace_defect_types(&self, rows: Vec<DefectType>) -> Result<(), AppError> {
        let rows = rows
            .into_iter()
            .map(|d| (d.id, d.code, d.name, d.is_active, d.cached_at.timestamp()))
            .collect();
        self.replace_code_table("defect_types", rows).await
    }

    async fn replace_machines(&self, rows: Vec<Machine>) -> Result<(), AppError> {
        let rows = rows
            .into_iter()
            .map(|m| (m.id, m.code, m.name, m.is_active, m.cached_at.timestamp()))
            .collect();
        self.replace_code_table("machines", rows).await
    }

    async fn replace_users(&self, rows: Vec<UserAccount>) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM users").execute(&mut *tx).await?;
        for user in rows {
            sqlx::query(
                "INSERT INTO users (id, name, role, is_active, cached_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(user.id)
            .bind(user.name)
            .bind(user.role)
            .bind(user.is_active)
            .bind(user.cached_at.timestamp())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn cached_product_models(&self) -> Result<Vec<ProductModel>, AppError> {
        self.fetch_code_table("product_models")
            .await?
            .into_iter()
            .map(mappers::product_model_from_row)
            .collect()
    }

    async fn cached_inspection_processes(&self) -> Result<Vec<InspectionProcess>, AppError> {
        self.fetch_code_table("inspection_processes")
            .await?
            .into_iter()
            .map(mappers::inspection_process_from_row)
            .collect()
    }

    async fn cached_defect_types(&self) -> Result<Vec<DefectType>, AppError> {
        self.fetch_code_table("defect_types")
            .await?
            .into_iter()
            .map(mappers::defect_type_from_row)
            .collect()
    }

    async fn cached_machines(&self) -> Result<Vec<Machine>, AppError> {
        self.fetch_code_table("machines")
            .await?
            .into_iter()
            .map(mappers::machine_from_row)
            .collect()
    }

    async fn cached_users(&self) -> Result<Vec<UserAccount>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, role, is_active, cached_at FROM users ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(mappers::user_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::PhotoPayload;
    use chrono::Duration as ChronoDuration;

    async fn setup_store() -> SqliteOfflineStore {
        // メモリ内SQLiteデータベースを使用
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteOfflineStore::new(pool, 3)
    }

    fn draft(model: &str) -> InspectionDraft {
        InspectionDraft::new(
            model.to_string(),
            "process-1".into(),
            Some("defect-2".into()),
            Some("machine-5".into()),
            "inspector-9".into(),
            "鈴木".into(),
            100,
            3,
            Some(PhotoPayload::from_bytes(&[0xFF, 0xD8, 0xFF]).unwrap()),
            Some("表面傷".into()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let store = setup_store().await;
        let id = store.insert_pending(draft("model-a")).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.local_id, id);
        assert_eq!(record.model_id, "model-a");
        assert_eq!(record.status, RecordStatus::Pending);
        assert_eq!(record.retry_count, 0);
        assert!(record.synced_at.is_none());
        assert!(record.error_message.is_none());
        assert!(record.photo.is_some());
        assert_eq!(record.notes.as_deref(), Some("表面傷"));
    }

    #[tokio::test]
    async fn test_list_pending_is_oldest_first() {
        let store = setup_store().await;
        let first = store.insert_pending(draft("model-a")).await.unwrap();
        let second = store.insert_pending(draft("model-b")).await.unwrap();
        let third = store.insert_pending(draft("model-c")).await.unwrap();

        let pending = store.list_pending().await.unwrap();
        let ids: Vec<_> = pending.into_iter().map(|r| r.local_id).collect();
        assert_eq!(ids, vec![first, second, third]);
    }

    #[tokio::test]
    async fn test_list_pending_excludes_synced_and_exhausted() {
        let store = setup_store().await;
        let synced = store.insert_pending(draft("model-a")).await.unwrap();
        let exhausted = store.insert_pending(draft("model-b")).await.unwrap();
        let retryable = store.insert_pending(draft("model-c")).await.unwrap();

        store
            .update_status(&synced, RecordStatusChange::synced(Utc::now()))
            .await
            .unwrap();
        store
            .update_status(&exhausted, RecordStatusChange::rejected("bad".into()))
            .await
            .unwrap();
        store
            .update_status(&retryable, RecordStatusChange::failed("timeout".into()))
            .await
            .unwrap();

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].local_id, retryable);
        assert_eq!(store.pending_count().await.unwrap(), 1);

        let exhausted_rows = store.list_exhausted().await.unwrap();
        assert_eq!(exhausted_rows.len(), 1);
        assert_eq!(exhausted_rows[0].retry_count, 3);
        assert!(exhausted_rows[0].is_retry_exhausted(3));
    }

    #[tokio::test]
    async fn test_update_status_transitions() {
        let store = setup_store().await;
        let id = store.insert_pending(draft("model-a")).await.unwrap();

        store
            .update_status(&id, RecordStatusChange::syncing())
            .await
            .unwrap();
        assert_eq!(
            store.get(&id).await.unwrap().unwrap().status,
            RecordStatus::Syncing
        );

        store
            .update_status(&id, RecordStatusChange::failed("500".into()))
            .await
            .unwrap();
        let errored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(errored.status, RecordStatus::Error);
        assert_eq!(errored.retry_count, 1);
        assert_eq!(errored.error_message.as_deref(), Some("500"));

        let now = Utc::now();
        store
            .update_status(&id, RecordStatusChange::synced(now))
            .await
            .unwrap();
        let synced = store.get(&id).await.unwrap().unwrap();
        assert_eq!(synced.status, RecordStatus::Synced);
        assert_eq!(synced.synced_at.unwrap().timestamp(), now.timestamp());
        // synced でエラーメッセージはクリアされる
        assert!(synced.error_message.is_none());
    }

    #[tokio::test]
    async fn test_update_status_unknown_id() {
        let store = setup_store().await;
        let missing = LocalId::new("local-1-ffffffff".into()).unwrap();
        let result = store
            .update_status(&missing, RecordStatusChange::syncing())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_purge_only_touches_synced() {
        let store = setup_store().await;
        let old_synced = store.insert_pending(draft("model-a")).await.unwrap();
        let fresh_synced = store.insert_pending(draft("model-b")).await.unwrap();
        let pending = store.insert_pending(draft("model-c")).await.unwrap();
        let errored = store.insert_pending(draft("model-d")).await.unwrap();

        let long_ago = Utc::now() - ChronoDuration::days(30);
        store
            .update_status(&old_synced, RecordStatusChange::synced(long_ago))
            .await
            .unwrap();
        store
            .update_status(&fresh_synced, RecordStatusChange::synced(Utc::now()))
            .await
            .unwrap();
        store
            .update_status(&errored, RecordStatusChange::failed("x".into()))
            .await
            .unwrap();

        let cutoff = Utc::now() - ChronoDuration::days(7);
        let purged = store.purge_synced_older_than(cutoff).await.unwrap();
        assert_eq!(purged, 1);

        assert!(store.get(&old_synced).await.unwrap().is_none());
        assert!(store.get(&fresh_synced).await.unwrap().is_some());
        assert!(store.get(&pending).await.unwrap().is_some());
        assert!(store.get(&errored).await.unwrap().is_some());

        // 極端な cutoff でも synced 以外は消えない
        let far_future = Utc::now() + ChronoDuration::days(3650);
        store.purge_synced_older_than(far_future).await.unwrap();
        assert!(store.get(&pending).await.unwrap().is_some());
        assert!(store.get(&errored).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_synced_most_recent_first() {
        let store = setup_store().await;
        let older = store.insert_pending(draft("model-a")).await.unwrap();
        let newer = store.insert_pending(draft("model-b")).await.unwrap();

        let now = Utc::now();
        store
            .update_status(
                &older,
                RecordStatusChange::synced(now - ChronoDuration::hours(2)),
            )
            .await
            .unwrap();
        store
            .update_status(&newer, RecordStatusChange::synced(now))
            .await
            .unwrap();

        let synced = store.list_synced(10).await.unwrap();
        assert_eq!(synced.len(), 2);
        assert_eq!(synced[0].local_id, newer);
        assert_eq!(synced[1].local_id, older);

        let limited = store.list_synced(1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_reference_clears_previous_rows() {
        let store = setup_store().await;
        let now = Utc::now();
        let old = ProductModel {
            id: "m-old".into(),
            code: "OLD".into(),
            name: "旧型".into(),
            is_active: false,
            cached_at: now,
        };
        let new = ProductModel {
            id: "m-new".into(),
            code: "NEW".into(),
            name: "新型".into(),
            is_active: true,
            cached_at: now,
        };

        store.replace_product_models(vec![old]).await.unwrap();
        store.replace_product_models(vec![new]).await.unwrap();

        let cached = store.cached_product_models().await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "m-new");
        assert!(cached[0].is_active);
    }

    #[tokio::test]
    async fn test_connect_creates_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!(
                "sqlite://{}?mode=rwc",
                dir.path().join("kensa.db").display()
            ),
            max_connections: 1,
            connection_timeout: 5,
        };

        let store = SqliteOfflineStore::connect(&config, 3).await.unwrap();
        let id = store.insert_pending(draft("model-a")).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_users_mirror_roundtrip() {
        let store = setup_store().await;
        let user = UserAccount {
            id: "u-1".into(),
            name: "高橋".into(),
            role: "inspector".into(),
            is_active: true,
            cached_at: Utc::now(),
        };
        store.replace_users(vec![user]).await.unwrap();

        let cached = store.cached_users().await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].role, "inspector");
    }
}
