use serde::{Deserialize, Serialize};
use std::fmt;

/// サーバ側変更通知の監視対象コレクション。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchedCollection {
    Inspections,
    InspectionResults,
    Defects,
    Alerts,
    Users,
    Machines,
    ProductModels,
}

impl WatchedCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchedCollection::Inspections => "inspections",
            WatchedCollection::InspectionResults => "inspection_results",
            WatchedCollection::Defects => "defects",
            WatchedCollection::Alerts => "alerts",
            WatchedCollection::Users => "users",
            WatchedCollection::Machines => "machines",
            WatchedCollection::ProductModels => "product_models",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "inspections" => Ok(WatchedCollection::Inspections),
            "inspection_results" => Ok(WatchedCollection::InspectionResults),
            "defects" => Ok(WatchedCollection::Defects),
            "alerts" => Ok(WatchedCollection::Alerts),
            "users" => Ok(WatchedCollection::Users),
            "machines" => Ok(WatchedCollection::Machines),
            "product_models" => Ok(WatchedCollection::ProductModels),
            other => Err(format!("Unwatched collection '{other}'")),
        }
    }

    pub fn all() -> &'static [WatchedCollection] {
        &[
            WatchedCollection::Inspections,
            WatchedCollection::InspectionResults,
            WatchedCollection::Defects,
            WatchedCollection::Alerts,
            WatchedCollection::Users,
            WatchedCollection::Machines,
            WatchedCollection::ProductModels,
        ]
    }
}

impl fmt::Display for WatchedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeEventType {
    Insert,
    Update,
    Delete,
}

/// プッシュチャネルから届く変更通知。`{table, eventType}` に対応する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: WatchedCollection,
    pub event_type: ChangeEventType,
}

impl ChangeEvent {
    pub fn new(collection: WatchedCollection, event_type: ChangeEventType) -> Self {
        Self {
            collection,
            event_type,
        }
    }
}
