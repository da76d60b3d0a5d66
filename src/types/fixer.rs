use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

#[derive(Debug, Clone, Deserialize)]
pub struct FixerResponse {
    #[serde(default)]
    pub success: bool,
    pub timestamp: Option<i64>,
    pub base: Option<String>,
    pub date: Option<String>,
    pub rates: Option<BTreeMap<String, Number>>,
    pub error: Option<FixerError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixerError {
    #[serde(default)]
    pub code: i64,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixerRates {
    pub timestamp: i64,
    pub date: String,
    pub base: String,
    pub rates: BTreeMap<String, String>,
}
