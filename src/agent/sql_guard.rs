// src/agent/sql_guard.rs
//! Static checks applied to model-written SQL before it reaches the database.

use super::schema;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

lazy_static! {
    static ref SQL_FENCE: Regex = Regex::new(r"(?is)```(?:sql)?\s*(.*?)```").unwrap();
    static ref FORBIDDEN_KEYWORD: Regex = Regex::new(
        r"(?i)\b(insert|update|delete|merge|drop|alter|create|truncate|grant|revoke|copy|vacuum|call|do|set|reset|lock|into|execute|prepare|listen|notify|refresh|reindex|cluster)\b"
    )
    .unwrap();
    static ref FORBIDDEN_FUNCTION: Regex =
        Regex::new(r"(?i)\b(pg_\w+|lo_\w+|dblink\w*|current_setting|set_config|query_to_xml\w*)\s*\(").unwrap();
    static ref TRAILING_LIMIT: Regex = Regex::new(r"(?i)\blimit\s+(\d+|all)(\s+offset\s+\d+)?\s*$").unwrap();
}

/// Functions whose argument list uses `FROM` as a separator.
const FROM_ARG_FUNCTIONS: &[&str] = &["extract", "substring", "trim", "overlay"];

/// Words that end a table reference instead of aliasing it.
const CLAUSE_KEYWORDS: &[&str] = &[
    "where", "group", "order", "limit", "offset", "join", "left", "right", "inner", "outer",
    "full", "cross", "natural", "on", "using", "union", "intersect", "except", "having",
    "window", "fetch", "for", "select", "lateral", "tablesample",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    #[error("The query is empty")]
    Empty,
    #[error("Unterminated string literal")]
    UnterminatedString,
    #[error("SQL comments are not allowed")]
    Comment,
    #[error("Only a single statement is allowed")]
    MultipleStatements,
    #[error("Only SELECT queries are allowed")]
    NotSelect,
    #[error("Forbidden keyword: {0}")]
    ForbiddenKeyword(String),
    #[error("Forbidden function: {0}")]
    ForbiddenFunction(String),
    #[error("Table is not available: {0}")]
    UnknownTable(String),
}

/// Pulls the SQL out of a model reply: the first ```sql block when present,
/// then the first statement.
pub fn extract_sql(output: &str) -> String {
    let body = SQL_FENCE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(output);
    first_statement(body).trim().to_string()
}

fn first_statement(sql: &str) -> &str {
    let mut in_string = false;
    for (i, c) in sql.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            ';' if !in_string => return &sql[..i],
            _ => {}
        }
    }
    sql
}

/// Blanks out the contents of string literals so keyword scans only see code.
fn mask_literals(sql: &str) -> Result<String, GuardError> {
    let mut masked = String::with_capacity(sql.len());
    let mut in_string = false;
    for c in sql.chars() {
        if c == '\'' {
            // `''` inside a literal toggles twice and stays masked
            in_string = !in_string;
            masked.push(c);
        } else if in_string {
            masked.push(' ');
        } else {
            masked.push(c);
        }
    }
    if in_string {
        return Err(GuardError::UnterminatedString);
    }
    Ok(masked)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Open,
    Close,
    Comma,
    Other,
}

fn tokenize(masked: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if !word.is_empty() {
            tokens.push(Token::Word(word.to_lowercase()));
            word.clear();
        }
    };

    for c in masked.chars() {
        if c.is_alphanumeric() || matches!(c, '_' | '.' | '$') {
            word.push(c);
            continue;
        }
        if c == '"' {
            // quoted identifiers are compared without their quotes
            continue;
        }
        flush(&mut word, &mut tokens);
        match c {
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            ',' => tokens.push(Token::Comma),
            c if c.is_whitespace() => {}
            _ => tokens.push(Token::Other),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

fn is_word(token: Option<&Token>, expected: &str) -> bool {
    matches!(token, Some(Token::Word(w)) if w == expected)
}

fn is_clause_keyword(word: &str) -> bool {
    CLAUSE_KEYWORDS.contains(&word)
}

fn cte_names(tokens: &[Token]) -> HashSet<String> {
    let mut names = HashSet::new();
    for i in 1..tokens.len() {
        let Token::Word(name) = &tokens[i] else {
            continue;
        };
        let introduced = is_word(tokens.get(i - 1), "with")
            || is_word(tokens.get(i - 1), "recursive")
            || tokens[i - 1] == Token::Comma;
        if introduced && is_word(tokens.get(i + 1), "as") && tokens.get(i + 2) == Some(&Token::Open) {
            names.insert(name.clone());
        }
    }
    names
}

/// `public.x` is `x`; any other schema stays qualified so it never matches.
fn table_name(raw: &str) -> String {
    match raw.split_once('.') {
        Some(("public", table)) => table.to_string(),
        _ => raw.to_string(),
    }
}

/// Index just past the balanced group opening at `i`.
fn skip_group(tokens: &[Token], mut i: usize) -> usize {
    let mut depth = 0usize;
    while let Some(token) = tokens.get(i) {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i
}

/// Skips `[AS] alias [(col, …)]` after a FROM item.
fn skip_alias(tokens: &[Token], mut i: usize) -> usize {
    if is_word(tokens.get(i), "as") {
        i += 2;
    } else if matches!(tokens.get(i), Some(Token::Word(w)) if !is_clause_keyword(w)) {
        i += 1;
    } else {
        return i;
    }
    if tokens.get(i) == Some(&Token::Open) {
        i = skip_group(tokens, i);
    }
    i
}

/// Reads `table [AS alias [(cols)]] {, …}` from `i` and returns the index of
/// the first token it did not consume. Stops at the `(` of a subquery or a
/// function in FROM position; the caller walks it and resumes the list.
fn read_table_list(tokens: &[Token], mut i: usize, comma_list: bool, tables: &mut Vec<String>) -> usize {
    loop {
        while is_word(tokens.get(i), "lateral") || is_word(tokens.get(i), "only") {
            i += 1;
        }
        match tokens.get(i) {
            Some(Token::Word(name)) if !is_clause_keyword(name) => {
                tables.push(table_name(name));
                if tokens.get(i + 1) == Some(&Token::Open) {
                    return i + 1;
                }
                i = skip_alias(tokens, i + 1);
            }
            _ => return i,
        }

        if comma_list && tokens.get(i) == Some(&Token::Comma) {
            i += 1;
            continue;
        }
        return i;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Paren {
    Plain,
    /// Arguments of a FROM_ARG_FUNCTIONS call.
    FunctionArgs,
    /// Subquery or function standing as a FROM item.
    FromItem { comma_list: bool },
}

/// Reads a table list and notes whether it stopped at a FROM item's `(`.
fn read_list(
    tokens: &[Token],
    i: usize,
    comma_list: bool,
    tables: &mut Vec<String>,
    pending: &mut Option<bool>,
) -> usize {
    let next = read_table_list(tokens, i, comma_list, tables);
    *pending = (tokens.get(next) == Some(&Token::Open)).then_some(comma_list);
    next
}

fn referenced_tables(tokens: &[Token]) -> Vec<String> {
    let mut tables = Vec::new();
    let mut parens: Vec<Paren> = Vec::new();
    // set when a table list stopped at the `(` of a FROM item
    let mut pending_item: Option<bool> = None;
    let mut i = 0;

    while i < tokens.len() {
        let pending = pending_item.take();
        match &tokens[i] {
            Token::Open => {
                let paren = match pending {
                    Some(comma_list) => Paren::FromItem { comma_list },
                    None => {
                        let function_args = matches!(
                            i.checked_sub(1).and_then(|p| tokens.get(p)),
                            Some(Token::Word(w)) if FROM_ARG_FUNCTIONS.contains(&w.as_str())
                        );
                        if function_args {
                            Paren::FunctionArgs
                        } else {
                            Paren::Plain
                        }
                    }
                };
                parens.push(paren);
            }
            Token::Close => {
                if let Some(Paren::FromItem { comma_list }) = parens.pop() {
                    let next = skip_alias(tokens, i + 1);
                    if comma_list && tokens.get(next) == Some(&Token::Comma) {
                        i = read_list(tokens, next + 1, true, &mut tables, &mut pending_item);
                    } else {
                        i = next;
                    }
                    continue;
                }
            }
            Token::Word(w) if w == "join" || w == "table" => {
                i = read_list(tokens, i + 1, false, &mut tables, &mut pending_item);
                continue;
            }
            Token::Word(w) if w == "from" => {
                let in_function = parens.last() == Some(&Paren::FunctionArgs);
                let distinct_from = i > 0 && is_word(tokens.get(i - 1), "distinct");
                if !in_function && !distinct_from {
                    i = read_list(tokens, i + 1, true, &mut tables, &mut pending_item);
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    tables
}

#[derive(Debug, Clone)]
pub struct SqlGuard {
    row_limit: u32,
}

impl SqlGuard {
    pub fn new(row_limit: u32) -> Self {
        Self { row_limit: row_limit.max(1) }
    }

    pub fn row_limit(&self) -> u32 {
        self.row_limit
    }

    /// Validates `sql` and returns the statement that will actually run.
    pub fn check(&self, sql: &str) -> Result<String, GuardError> {
        let mut sql = sql.trim();
        while let Some(rest) = sql.strip_suffix(';') {
            sql = rest.trim_end();
        }
        if sql.is_empty() {
            return Err(GuardError::Empty);
        }

        let masked = mask_literals(sql)?;
        if masked.contains("--") || masked.contains("/*") {
            return Err(GuardError::Comment);
        }
        if masked.contains(';') {
            return Err(GuardError::MultipleStatements);
        }

        let tokens = tokenize(&masked);
        if !(is_word(tokens.first(), "select") || is_word(tokens.first(), "with")) {
            return Err(GuardError::NotSelect);
        }
        if let Some(m) = FORBIDDEN_KEYWORD.find(&masked) {
            return Err(GuardError::ForbiddenKeyword(m.as_str().to_uppercase()));
        }
        if let Some(caps) = FORBIDDEN_FUNCTION.captures(&masked) {
            return Err(GuardError::ForbiddenFunction(caps[1].to_lowercase()));
        }

        let ctes = cte_names(&tokens);
        for table in referenced_tables(&tokens) {
            if !ctes.contains(&table) && !schema::is_allowed_table(&table) {
                return Err(GuardError::UnknownTable(table));
            }
        }

        Ok(self.enforce_limit(sql))
    }

    fn enforce_limit(&self, sql: &str) -> String {
        let Some(caps) = TRAILING_LIMIT.captures(sql) else {
            return format!("{} LIMIT {}", sql, self.row_limit);
        };
        let Some(number) = caps.get(1) else {
            return sql.to_string();
        };
        // `ALL` parses as unbounded and gets replaced
        let requested = number.as_str().parse::<u64>().unwrap_or(u64::MAX);
        if requested > u64::from(self.row_limit) {
            format!("{}{}{}", &sql[..number.start()], self.row_limit, &sql[number.end()..])
        } else {
            sql.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> SqlGuard {
        SqlGuard::new(50)
    }

    #[test]
    fn test_plain_select_gets_limit() {
        let sql = guard().check("SELECT vod_name FROM vod_details WHERE type_name = '韩国剧';").unwrap();
        assert_eq!(sql, "SELECT vod_name FROM vod_details WHERE type_name = '韩国剧' LIMIT 50");
    }

    #[test]
    fn test_limits_are_capped_not_raised() {
        assert_eq!(
            guard().check("SELECT id FROM videos ORDER BY id LIMIT 500").unwrap(),
            "SELECT id FROM videos ORDER BY id LIMIT 50"
        );
        assert_eq!(
            guard().check("SELECT id FROM videos LIMIT 10 OFFSET 20").unwrap(),
            "SELECT id FROM videos LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_joins_ctes_and_aliases() {
        let sql = "WITH counts AS (SELECT movdetail_id, COUNT(*) AS n FROM comments GROUP BY movdetail_id) \
                   SELECT d.vod_name, c.n FROM vod_details d JOIN counts c ON c.movdetail_id = d.id \
                   ORDER BY c.n DESC LIMIT 5";
        assert!(guard().check(sql).is_ok());

        let listed = "SELECT d.vod_name FROM vod_details AS d, comments c WHERE c.movdetail_id = d.id";
        assert!(guard().check(listed).is_ok());
    }

    #[test]
    fn test_from_inside_extract_is_not_a_table() {
        let sql = "SELECT vod_name FROM vod_details WHERE EXTRACT(YEAR FROM vod_time) = 2024";
        assert!(guard().check(sql).is_ok());
    }

    #[test]
    fn test_keywords_inside_literals_are_ignored() {
        let sql = "SELECT id FROM comments WHERE body ILIKE '%drop it; delete me%'";
        assert!(guard().check(sql).is_ok());
    }

    #[test]
    fn test_rejections() {
        let g = guard();
        assert_eq!(g.check("  ;"), Err(GuardError::Empty));
        assert_eq!(g.check("DELETE FROM videos"), Err(GuardError::NotSelect));
        assert_eq!(
            g.check("SELECT 1; DROP TABLE videos"),
            Err(GuardError::MultipleStatements)
        );
        assert_eq!(g.check("SELECT 1 -- hi"), Err(GuardError::Comment));
        assert_eq!(g.check("SELECT 'open"), Err(GuardError::UnterminatedString));
        assert_eq!(
            g.check("WITH gone AS (DELETE FROM videos RETURNING *) SELECT * FROM gone"),
            Err(GuardError::ForbiddenKeyword("DELETE".to_string()))
        );
        assert_eq!(
            g.check("SELECT * INTO backup FROM videos"),
            Err(GuardError::ForbiddenKeyword("INTO".to_string()))
        );
        assert_eq!(
            g.check("SELECT pg_sleep(10)"),
            Err(GuardError::ForbiddenFunction("pg_sleep".to_string()))
        );
    }

    #[test]
    fn test_unlisted_tables_are_rejected() {
        let g = guard();
        assert_eq!(
            g.check("SELECT name, password_hash FROM users"),
            Err(GuardError::UnknownTable("users".to_string()))
        );
        assert_eq!(
            g.check("SELECT v.id FROM videos v JOIN users u ON u.id = v.owner_id"),
            Err(GuardError::UnknownTable("users".to_string()))
        );
        assert_eq!(
            g.check("SELECT * FROM vod_details, information_schema.tables"),
            Err(GuardError::UnknownTable("information_schema.tables".to_string()))
        );
        assert!(g.check("SELECT id FROM public.videos").is_ok());
    }

    #[test]
    fn test_hidden_table_shapes_are_rejected() {
        let g = guard();
        let users = Err(GuardError::UnknownTable("users".to_string()));
        assert_eq!(g.check("WITH x AS (TABLE users) SELECT * FROM x"), users);
        assert_eq!(
            g.check("SELECT u.name, u.password_hash FROM vod_details AS d (a), users u"),
            users
        );
        assert_eq!(
            g.check("SELECT u.name FROM vod_details d (a, b), users u"),
            users
        );
        assert_eq!(g.check("SELECT * FROM (SELECT * FROM users) s"), users);
        assert_eq!(
            g.check("SELECT s.id FROM (SELECT id FROM videos) AS s (id), users u"),
            users
        );
        assert_eq!(g.check(r#"SELECT password_hash FROM "users""#), users);
        assert_eq!(g.check(r#"SELECT password_hash FROM "public"."users""#), users);
    }

    #[test]
    fn test_allowed_subqueries_and_column_aliases_pass() {
        let g = guard();
        assert!(g
            .check("SELECT s.n FROM (SELECT COUNT(*) AS n FROM comments) s, videos v")
            .is_ok());
        assert!(g.check("SELECT a FROM vod_details AS d (a), videos v").is_ok());
        assert!(g.check("WITH x AS (TABLE videos) SELECT * FROM x").is_ok());
    }

    #[test]
    fn test_limit_all_is_replaced() {
        assert_eq!(
            guard().check("SELECT id FROM videos LIMIT ALL").unwrap(),
            "SELECT id FROM videos LIMIT 50"
        );
        assert_eq!(
            guard().check("SELECT id FROM videos limit all offset 5").unwrap(),
            "SELECT id FROM videos limit 50 offset 5"
        );
    }

    #[test]
    fn test_extract_sql_from_fenced_reply() {
        let reply = "Here you go:\n```sql\nSELECT id FROM videos;\nSELECT 2;\n```\nEnjoy";
        assert_eq!(extract_sql(reply), "SELECT id FROM videos");
        assert_eq!(extract_sql("  SELECT 'a;b' FROM videos; "), "SELECT 'a;b' FROM videos");
    }
}
