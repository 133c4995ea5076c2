//! Branch Model

use serde::{Deserialize, Serialize};

/// Branch entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Branch {
    pub branch_code: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    /// Receipt printer on the branch LAN
    #[serde(rename = "printerIP")]
    pub printer_ip: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create branch payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCreate {
    pub name: String,
    pub branch_code: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "printerIP")]
    pub printer_ip: Option<String>,
}

/// Update branch payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "printerIP")]
    pub printer_ip: Option<String>,
}
