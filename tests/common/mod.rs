use async_trait::async_trait;
use chrono::Utc;
use kensa_offline::application::ports::{InspectionApi, NewInspection, RemoteError};
use kensa_offline::domain::entities::{
    DefectType, InspectionDraft, InspectionProcess, Machine, ProductModel, UserAccount,
};
use kensa_offline::SqliteOfflineStore;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 作成呼び出しの結果を台本どおりに返すAPIスタブ。
/// 台本が尽きたら受理する。
pub struct ScriptedApi {
    outcomes: Mutex<VecDeque<Result<String, RemoteError>>>,
    create_calls: AtomicU32,
    fetch_calls: AtomicU32,
    models: std::sync::Mutex<Vec<ProductModel>>,
}

impl ScriptedApi {
    pub fn accepting() -> Self {
        Self::with_outcomes(Vec::new())
    }

    pub fn with_outcomes(outcomes: Vec<Result<String, RemoteError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            create_calls: AtomicU32::new(0),
            fetch_calls: AtomicU32::new(0),
            models: std::sync::Mutex::new(vec![sample_model("srv-model-1", "AX-200")]),
        }
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InspectionApi for ScriptedApi {
    async fn create_inspection(&self, new: &NewInspection) -> Result<String, RemoteError> {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => Ok(format!("srv-{}-{}", call, new.client_reference)),
        }
    }

    async fn fetch_product_models(&self) -> Result<Vec<ProductModel>, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.models.lock().unwrap().clone())
    }

    async fn fetch_inspection_processes(&self) -> Result<Vec<InspectionProcess>, RemoteError> {
        Ok(Vec::new())
    }

    async fn fetch_defect_types(&self) -> Result<Vec<DefectType>, RemoteError> {
        Ok(Vec::new())
    }

    async fn fetch_machines(&self) -> Result<Vec<Machine>, RemoteError> {
        Ok(Vec::new())
    }

    async fn fetch_users(&self) -> Result<Vec<UserAccount>, RemoteError> {
        Ok(Vec::new())
    }
}

pub fn sample_model(id: &str, code: &str) -> ProductModel {
    ProductModel {
        id: id.to_string(),
        code: code.to_string(),
        name: format!("Model {code}"),
        is_active: true,
        cached_at: Utc::now(),
    }
}

pub async fn setup_store() -> Arc<SqliteOfflineStore> {
    // メモリ内SQLiteデータベースを使用
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    Arc::new(SqliteOfflineStore::new(pool, 3))
}

pub fn sample_draft(index: u32) -> InspectionDraft {
    InspectionDraft::new(
        format!("model-{index}"),
        "process-1".into(),
        Some("defect-1".into()),
        Some("machine-3".into()),
        "inspector-1".into(),
        "中村".into(),
        20,
        1,
        None,
        None,
    )
    .expect("valid draft")
}
