use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub question: String,
}

/// Outcome of one natural-language search, returned as-is to the client.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SearchResponse {
    pub success: bool,
    pub question: String,
    pub sql_v1: String,
    pub sql_v2: Option<String>,
    pub final_sql: String,
    pub data: Vec<serde_json::Value>,
    pub explanation: String,
    pub reflection: String,
    pub error: Option<String>,
}
