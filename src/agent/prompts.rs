// src/agent/prompts.rs
//! Prompt construction for the search agent. Every builder returns the full
//! message list for one model call.

use super::schema::SCHEMA_DESCRIPTION;
use crate::llm_client::ChatMessage;
use serde_json::Value;

/// Rows shown to the model when it writes the explanation.
const EXPLANATION_SAMPLE_ROWS: usize = 5;

fn sql_system_prompt(row_limit: u32) -> String {
    format!(
        "You translate questions about a video site into PostgreSQL queries.\n\n\
         Schema:\n{}\n\
         Rules:\n\
         - Write exactly one SELECT statement (a WITH prefix is allowed).\n\
         - Use only the tables and columns listed above.\n\
         - Never modify data and never use SQL comments.\n\
         - Use ILIKE for fuzzy text matching on names.\n\
         - Always end with LIMIT {} or less.\n\
         - Reply with the SQL only, optionally inside a ```sql block.",
        SCHEMA_DESCRIPTION, row_limit
    )
}

pub fn generation(question: &str, row_limit: u32) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(sql_system_prompt(row_limit)),
        ChatMessage::user(format!("Question: {}", question)),
    ]
}

/// Asks the model to diagnose why `sql` did not answer the question.
pub fn reflection(question: &str, sql: &str, problem: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You review PostgreSQL queries written for this schema:\n{}\n\
             Explain in two or three sentences what is wrong with the query and how to fix it. \
             Do not write the corrected SQL.",
            SCHEMA_DESCRIPTION
        )),
        ChatMessage::user(format!(
            "Question: {}\nQuery:\n{}\nProblem: {}",
            question, sql, problem
        )),
    ]
}

pub fn correction(
    question: &str,
    sql: &str,
    problem: &str,
    reflection: &str,
    row_limit: u32,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(sql_system_prompt(row_limit)),
        ChatMessage::user(format!(
            "Question: {}\nA previous attempt failed.\nQuery:\n{}\nProblem: {}\nReview: {}\n\
             Write a corrected query.",
            question, sql, problem, reflection
        )),
    ]
}

pub fn explanation(question: &str, sql: &str, rows: &[Value]) -> Vec<ChatMessage> {
    let sample: Vec<&Value> = rows.iter().take(EXPLANATION_SAMPLE_ROWS).collect();
    let sample = serde_json::to_string(&sample).unwrap_or_else(|_| "[]".to_string());
    vec![
        ChatMessage::system(
            "You explain search results to a user of a video site in one or two short sentences, \
             in the language of the question. Do not mention SQL.",
        ),
        ChatMessage::user(format!(
            "Question: {}\nQuery: {}\nRows returned: {}\nFirst rows: {}",
            question,
            sql,
            rows.len(),
            sample
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_prompt_carries_schema_and_limit() {
        let messages = generation("latest anime", 50);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("Table vod_details"));
        assert!(messages[0].content.contains("LIMIT 50"));
        assert_eq!(messages[1].content, "Question: latest anime");
    }

    #[test]
    fn test_explanation_prompt_samples_rows() {
        let rows: Vec<Value> = (0..8).map(|i| json!({ "id": i })).collect();
        let messages = explanation("q", "SELECT 1", &rows);
        assert!(messages[1].content.contains("Rows returned: 8"));
        assert!(messages[1].content.contains(r#"{"id":4}"#));
        assert!(!messages[1].content.contains(r#"{"id":5}"#));
    }
}
