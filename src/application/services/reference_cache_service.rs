use crate::application::ports::{InspectionApi, OfflineStore};
use crate::domain::entities::{
    DefectType, InspectionProcess, Machine, ProductModel, ReferenceRefreshReport, UserAccount,
};
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::{info, warn};

/// リファレンスデータ（マスタ）のローカルミラーを管理する。
///
/// リフレッシュはテーブル単位の全件入れ替え。フェッチに失敗した
/// テーブルは前回のミラーを残す（stale でも存在する方が良い）。
/// ローカルストアへの書き込み失敗だけは操作全体のエラーとする。
pub struct ReferenceCacheService {
    store: Arc<dyn OfflineStore>,
    api: Arc<dyn InspectionApi>,
}

impl ReferenceCacheService {
    pub fn new(store: Arc<dyn OfflineStore>, api: Arc<dyn InspectionApi>) -> Self {
        Self { store, api }
    }

    pub async fn refresh_all(&self) -> Result<ReferenceRefreshReport, AppError> {
        let mut report = ReferenceRefreshReport::default();

        match self.api.fetch_product_models().await {
            Ok(rows) => {
                self.store.replace_product_models(rows).await?;
                report.record_refreshed("product_models");
            }
            Err(err) => report.record_failed("product_models", err.to_string()),
        }

        match self.api.fetch_inspection_processes().await {
            Ok(rows) => {
                self.store.replace_inspection_processes(rows).await?;
                report.record_refreshed("inspection_processes");
            }
            Err(err) => report.record_failed("inspection_processes", err.to_string()),
        }

        match self.api.fetch_defect_types().await {
            Ok(rows) => {
                self.store.replace_defect_types(rows).await?;
                report.record_refreshed("defect_types");
            }
            Err(err) => report.record_failed("defect_types", err.to_string()),
        }

        match self.api.fetch_machines().await {
            Ok(rows) => {
                self.store.replace_machines(rows).await?;
                report.record_refreshed("machines");
            }
            Err(err) => report.record_failed("machines", err.to_string()),
        }

        match self.api.fetch_users().await {
            Ok(rows) => {
                self.store.replace_users(rows).await?;
                report.record_refreshed("users");
            }
            Err(err) => report.record_failed("users", err.to_string()),
        }

        if report.is_complete() {
            info!(
                target: "offline::reference",
                tables = report.refreshed.len(),
                "reference mirrors refreshed"
            );
        } else {
            for (table, error) in &report.failed {
                warn!(
                    target: "offline::reference",
                    table = %table,
                    error = %error,
                    "reference mirror kept stale copy"
                );
            }
        }

        Ok(report)
    }

    pub async fn product_models(&self) -> Result<Vec<ProductModel>, AppError> {
        self.store.cached_product_models().await
    }

    pub async fn inspection_processes(&self) -> Result<Vec<InspectionProcess>, AppError> {
        self.store.cached_inspection_processes().await
    }

    pub async fn defect_types(&self) -> Result<Vec<DefectType>, AppError> {
        self.store.cached_defect_types().await
    }

    pub async fn machines(&self) -> Result<Vec<Machine>, AppError> {
        self.store.cached_machines().await
    }

    pub async fn users(&self) -> Result<Vec<UserAccount>, AppError> {
        self.store.cached_users().await
    }
}
