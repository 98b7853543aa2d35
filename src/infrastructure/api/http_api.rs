use crate::application::ports::{InspectionApi, NewInspection, RemoteError};
use crate::domain::entities::{
    DefectType, InspectionProcess, Machine, ProductModel, UserAccount,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// バックエンドREST面に対する `InspectionApi` 実装。
///
/// 認証・RLS等はマネージドバックエンド側の責務で、ここでは
/// APIキーをヘッダに載せるだけ。タイムアウトはトランスポート層で
/// 切り、通常の失敗としてレコード単位のエラー経路に乗せる。
pub struct HttpInspectionApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ReferenceDto {
    id: String,
    code: String,
    name: String,
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    id: String,
    name: String,
    role: String,
    is_active: bool,
}

impl HttpInspectionApi {
    /// `base_url` は `https://backend.example.com`（末尾スラッシュなし）。
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.base_url)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key),
            None => request,
        }
    }

    async fn fetch_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, RemoteError> {
        let url = self.url(path);
        let resp = self
            .apply_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        resp.json()
            .await
            .map_err(|e| RemoteError::Network(format!("response decode failed: {e}")))
    }
}

/// 4xxの検証系だけを恒久エラーに分類する。残りは再試行対象。
fn classify_status(status: u16, body: String) -> RemoteError {
    match status {
        400 | 409 | 422 => RemoteError::Validation(body),
        _ => RemoteError::Server {
            status,
            message: body,
        },
    }
}

#[async_trait]
impl InspectionApi for HttpInspectionApi {
    async fn create_inspection(&self, new: &NewInspection) -> Result<String, RemoteError> {
        let url = self.url("inspections");
        let resp = self
            .apply_auth(self.client.post(&url))
            .json(new)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), body));
        }

        let created: CreatedResponse = resp
            .json()
            .await
            .map_err(|e| RemoteError::Network(format!("response decode failed: {e}")))?;
        info!(
            target: "offline::api",
            remote_id = %created.id,
            client_reference = %new.client_reference,
            "inspection created remotely"
        );
        Ok(created.id)
    }

    async fn fetch_product_models(&self) -> Result<Vec<ProductModel>, RemoteError> {
        let now = Utc::now();
        let rows: Vec<ReferenceDto> = self.fetch_list("product_models").await?;
        Ok(rows
            .into_iter()
            .map(|dto| ProductModel {
                id: dto.id,
                code: dto.code,
                name: dto.name,
                is_active: dto.is_active,
                cached_at: now,
            })
            .collect())
    }

    async fn fetch_inspection_processes(&self) -> Result<Vec<InspectionProcess>, RemoteError> {
        let now = Utc::now();
        let rows: Vec<ReferenceDto> = self.fetch_list("inspection_processes").await?;
        Ok(rows
            .into_iter()
            .map(|dto| InspectionProcess {
                id: dto.id,
                code: dto.code,
                name: dto.name,
                is_active: dto.is_active,
                cached_at: now,
            })
            .collect())
    }

    async fn fetch_defect_types(&self) -> Result<Vec<DefectType>, RemoteError> {
        let now = Utc::now();
        let rows: Vec<ReferenceDto> = self.fetch_list("defect_types").await?;
        Ok(rows
            .into_iter()
            .map(|dto| DefectType {
                id: dto.id,
                code: dto.code,
                name: dto.name,
                is_active: dto.is_active,
                cached_at: now,
            })
            .collect())
    }

    async fn fetch_machines(&self) -> Result<Vec<Machine>, RemoteError> {
        let now = Utc::now();
        let rows: Vec<ReferenceDto> = self.fetch_list("machines").await?;
        Ok(rows
            .into_iter()
            .map(|dto| Machine {
                id: dto.id,
                code: dto.code,
                name: dto.name,
                is_active: dto.is_active,
                cached_at: now,
            })
            .collect())
    }

    async fn fetch_users(&self) -> Result<Vec<UserAccount>, RemoteError> {
        let now = Utc::now();
        let rows: Vec<UserDto> = self.fetch_list("users").await?;
        Ok(rows
            .into_iter()
            .map(|dto| UserAccount {
                id: dto.id,
                name: dto.name,
                role: dto.role,
                is_active: dto.is_active,
                cached_at: now,
            })
            .collect())
    }
}
