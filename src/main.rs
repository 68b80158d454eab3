use axum::{Extension, Json};
use fastflix::agent::{PgQueryRunner, SqlAgent};
use fastflix::config::Config;
use fastflix::llm_client::LlmClient;
use fastflix::{db, middleware, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging()?;

    let config = Config::from_env()?;

    let pool = db::create_pool(&config).await?;

    let search_agent = match config.llm.as_ref() {
        Some(llm) => {
            let client = LlmClient::new(llm);
            tracing::info!("AI search enabled (model {})", client.model());
            let runner = PgQueryRunner::new(
                pool.clone(),
                config.ai_search.statement_timeout_ms,
                config.ai_search.row_limit,
            );
            Some(SqlAgent::new(
                Arc::new(client),
                Arc::new(runner),
                config.ai_search.row_limit,
                config.ai_search.max_corrections,
            ))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not found. AI search will be disabled.");
            None
        }
    };

    let bind_addr = config.bind_addr.clone();

    let shared_state = Arc::new(AppState {
        pool,
        config,
        http: reqwest::Client::new(),
        search_agent,
    });

    let app = fastflix::api_routes()
        .route("/", axum::routing::get(welcome))
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state));

    // ConnectInfo feeds the per-IP rate limiter
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,fastflix=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,fastflix=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();

    tracing::info!("FastFlix starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!("Log level: {}", log_level);

    Ok(())
}

async fn welcome() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the FastFlix API" }))
}
