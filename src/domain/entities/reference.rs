use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// サーバ側マスタデータのローカルミラー。リモートが唯一の真実で、
/// リフレッシュ時に全件入れ替える。

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductModel {
    pub id: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InspectionProcess {
    pub id: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefectType {
    pub id: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Machine {
    pub id: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub cached_at: DateTime<Utc>,
}

/// 検査員ピッカー用のユーザーミラー。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub cached_at: DateTime<Utc>,
}
