// src/agent/sql_agent.rs
//! Natural-language search: question → SQL → rows → explanation, with a
//! bounded number of self-correction rounds.

use super::executor::QueryRunner;
use super::prompts;
use super::sql_guard::{extract_sql, SqlGuard};
use crate::llm_client::ChatModel;
use crate::models::search::SearchResponse;
use serde_json::Value;
use std::sync::Arc;

const EMPTY_RESULT_PROBLEM: &str = "The query ran but returned no rows.";
const NO_MATCHES_EXPLANATION: &str = "No matching records were found.";
const FAILED_EXPLANATION: &str = "The search could not be completed.";

/// Outcome of guarding and running one candidate query.
enum Attempt {
    Rows { sql: String, rows: Vec<Value> },
    Failed { sql: String, problem: String },
}

impl Attempt {
    /// Why this attempt should be corrected, if it should.
    fn problem(&self) -> Option<String> {
        match self {
            Attempt::Rows { rows, .. } if rows.is_empty() => Some(EMPTY_RESULT_PROBLEM.to_string()),
            Attempt::Rows { .. } => None,
            Attempt::Failed { problem, .. } => Some(problem.clone()),
        }
    }
}

pub struct SqlAgent {
    model: Arc<dyn ChatModel>,
    runner: Arc<dyn QueryRunner>,
    guard: SqlGuard,
    max_corrections: u32,
}

impl SqlAgent {
    pub fn new(
        model: Arc<dyn ChatModel>,
        runner: Arc<dyn QueryRunner>,
        row_limit: u32,
        max_corrections: u32,
    ) -> Self {
        Self {
            model,
            runner,
            guard: SqlGuard::new(row_limit),
            max_corrections,
        }
    }

    /// Never fails: every problem ends up in the response's `error` field.
    pub async fn search(&self, question: &str) -> SearchResponse {
        let question = question.trim();
        let mut response = SearchResponse {
            question: question.to_string(),
            ..Default::default()
        };

        let row_limit = self.guard.row_limit();
        let first = match self.model.complete(&prompts::generation(question, row_limit)).await {
            Ok(reply) => extract_sql(&reply),
            Err(e) => {
                tracing::error!("SQL generation failed: {}", e);
                response.error = Some(format!("Failed to generate SQL: {}", e));
                response.explanation = FAILED_EXPLANATION.to_string();
                return response;
            }
        };
        tracing::info!("sql_v1: {}", first);
        response.sql_v1 = first.clone();

        let mut current = first;
        let mut attempt = self.attempt(&current).await;
        let mut reflections: Vec<String> = Vec::new();

        for round in 1..=self.max_corrections {
            let Some(problem) = attempt.problem() else {
                break;
            };
            tracing::info!("Correction round {}: {}", round, problem);

            let reflection = match self
                .model
                .complete(&prompts::reflection(question, &current, &problem))
                .await
            {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    tracing::warn!("Reflection failed, keeping the last attempt: {}", e);
                    break;
                }
            };

            let corrected = self
                .model
                .complete(&prompts::correction(question, &current, &problem, &reflection, row_limit))
                .await;
            reflections.push(reflection);
            let corrected = match corrected {
                Ok(reply) => extract_sql(&reply),
                Err(e) => {
                    tracing::warn!("Correction failed, keeping the last attempt: {}", e);
                    break;
                }
            };

            tracing::info!("sql_v2: {}", corrected);
            response.sql_v2 = Some(corrected.clone());
            current = corrected;
            attempt = self.attempt(&current).await;
        }
        response.reflection = reflections.join("\n");

        match attempt {
            Attempt::Rows { sql, rows } => {
                response.explanation = self.explain(question, &sql, &rows).await;
                response.final_sql = sql;
                response.data = rows;
                response.success = true;
            }
            Attempt::Failed { sql, problem } => {
                response.final_sql = sql;
                response.error = Some(problem);
                response.explanation = FAILED_EXPLANATION.to_string();
            }
        }
        response
    }

    async fn attempt(&self, sql: &str) -> Attempt {
        let checked = match self.guard.check(sql) {
            Ok(checked) => checked,
            Err(e) => {
                tracing::info!("Query rejected: {}", e);
                return Attempt::Failed {
                    sql: sql.to_string(),
                    problem: format!("Query rejected: {}", e),
                };
            }
        };

        match self.runner.run(&checked).await {
            Ok(rows) => Attempt::Rows { sql: checked, rows },
            Err(e) => Attempt::Failed {
                sql: checked,
                problem: format!("Query failed: {}", e),
            },
        }
    }

    async fn explain(&self, question: &str, sql: &str, rows: &[Value]) -> String {
        if rows.is_empty() {
            return NO_MATCHES_EXPLANATION.to_string();
        }
        match self.model.complete(&prompts::explanation(question, sql, rows)).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!("Explanation failed: {}", e);
                format!("Found {} matching records.", rows.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{ChatMessage, LlmError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies with a fixed script, one entry per call.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<&str, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }

    /// Fails any query containing `broken`, returns `rows` otherwise.
    struct FakeRunner {
        broken: &'static str,
        rows: Vec<Value>,
        executed: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn new(broken: &'static str, rows: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                broken,
                rows,
                executed: Mutex::new(Vec::new()),
            })
        }

        fn executed(&self) -> Vec<String> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueryRunner for FakeRunner {
        async fn run(&self, sql: &str) -> Result<Vec<Value>, sqlx::Error> {
            self.executed.lock().unwrap().push(sql.to_string());
            if sql.contains(self.broken) {
                return Err(sqlx::Error::Protocol("column \"nam\" does not exist".to_string()));
            }
            Ok(self.rows.clone())
        }
    }

    fn titles() -> Vec<Value> {
        vec![json!({ "vod_name": "A" }), json!({ "vod_name": "B" })]
    }

    #[tokio::test]
    async fn test_first_query_succeeds() {
        let model = ScriptedModel::new(vec![
            Ok("```sql\nSELECT vod_name FROM vod_details LIMIT 5;\n```"),
            Ok("Two titles match."),
        ]);
        let runner = FakeRunner::new("nothing-breaks", titles());
        let agent = SqlAgent::new(model, runner.clone(), 50, 1);

        let result = agent.search("  any two titles ").await;

        assert!(result.success);
        assert_eq!(result.question, "any two titles");
        assert_eq!(result.sql_v1, "SELECT vod_name FROM vod_details LIMIT 5");
        assert_eq!(result.sql_v2, None);
        assert_eq!(result.final_sql, "SELECT vod_name FROM vod_details LIMIT 5");
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.explanation, "Two titles match.");
        assert_eq!(result.reflection, "");
        assert_eq!(result.error, None);
        assert_eq!(runner.executed().len(), 1);
    }

    #[tokio::test]
    async fn test_execution_error_is_corrected() {
        let model = ScriptedModel::new(vec![
            Ok("SELECT nam FROM vod_details"),
            Ok("The column is called vod_name."),
            Ok("SELECT vod_name FROM vod_details"),
            Ok("Two titles."),
        ]);
        let runner = FakeRunner::new("SELECT nam ", titles());
        let agent = SqlAgent::new(model, runner.clone(), 50, 1);

        let result = agent.search("titles").await;

        assert!(result.success);
        assert_eq!(result.sql_v1, "SELECT nam FROM vod_details");
        assert_eq!(result.sql_v2.as_deref(), Some("SELECT vod_name FROM vod_details"));
        assert_eq!(result.final_sql, "SELECT vod_name FROM vod_details LIMIT 50");
        assert_eq!(result.reflection, "The column is called vod_name.");
        assert_eq!(result.error, None);
        assert_eq!(runner.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_query_never_reaches_database() {
        let model = ScriptedModel::new(vec![
            Ok("SELECT name FROM users"),
            Ok("users is not available."),
            Ok("SELECT id FROM videos"),
            Ok("Two videos."),
        ]);
        let runner = FakeRunner::new("nothing-breaks", titles());
        let agent = SqlAgent::new(model, runner.clone(), 50, 1);

        let result = agent.search("who signed up").await;

        assert!(result.success);
        assert_eq!(runner.executed(), vec!["SELECT id FROM videos LIMIT 50".to_string()]);
    }

    #[tokio::test]
    async fn test_exhausted_corrections_surface_error() {
        let model = ScriptedModel::new(vec![
            Ok("SELECT name FROM users"),
            Ok("Try again."),
            Ok("SELECT password_hash FROM users"),
        ]);
        let runner = FakeRunner::new("nothing-breaks", titles());
        let agent = SqlAgent::new(model, runner.clone(), 50, 1);

        let result = agent.search("passwords").await;

        assert!(!result.success);
        assert_eq!(result.final_sql, "SELECT password_hash FROM users");
        assert_eq!(
            result.error.as_deref(),
            Some("Query rejected: Table is not available: users")
        );
        assert!(result.data.is_empty());
        assert!(runner.executed().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_reported() {
        let model = ScriptedModel::new(vec![Err(LlmError::Api {
            status: 401,
            body: "bad key".to_string(),
        })]);
        let agent = SqlAgent::new(model, FakeRunner::new("x", vec![]), 50, 1);

        let result = agent.search("anything").await;

        assert!(!result.success);
        assert_eq!(result.sql_v1, "");
        assert!(result.error.unwrap().contains("401"));
    }

    #[tokio::test]
    async fn test_explanation_failure_falls_back() {
        let model = ScriptedModel::new(vec![Ok("SELECT vod_name FROM vod_details")]);
        let agent = SqlAgent::new(model, FakeRunner::new("nothing-breaks", titles()), 50, 0);

        let result = agent.search("titles").await;

        assert!(result.success);
        assert_eq!(result.explanation, "Found 2 matching records.");
    }

    #[tokio::test]
    async fn test_empty_results_are_retried_then_returned() {
        let model = ScriptedModel::new(vec![
            Ok("SELECT vod_name FROM vod_details WHERE type_name = 'x'"),
            Ok("Loosen the filter."),
            Ok("SELECT vod_name FROM vod_details WHERE type_name ILIKE '%x%'"),
        ]);
        let runner = FakeRunner::new("nothing-breaks", vec![]);
        let agent = SqlAgent::new(model, runner.clone(), 50, 1);

        let result = agent.search("x").await;

        assert!(result.success);
        assert!(result.data.is_empty());
        assert!(result.sql_v2.is_some());
        assert_eq!(result.explanation, NO_MATCHES_EXPLANATION);
        assert_eq!(runner.executed().len(), 2);
    }
}
