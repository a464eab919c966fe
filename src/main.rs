use std::sync::Arc;

use care_assist::behavior::{BehaviorRouteState, InMemoryBehaviorLog, InMemoryChildProfiles};
use care_assist::config::Config;
use care_assist::llm::{AssistantsApi, OpenAiClient};
use care_assist::routines::{InMemoryRoutineRepository, RoutineRouteState};
use care_assist::server::{ThreadRouteState, app_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export CARE_ASSIST_API_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("🧸 Care Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.completion_model);
    eprintln!("   Assistant: {}", config.assistant_id);
    eprintln!("   Threads API: http://0.0.0.0:{}/threads", config.port);
    eprintln!("   Activity API: http://0.0.0.0:{}/activity_plan", config.port);
    eprintln!("   Behavior API: http://0.0.0.0:{}/log_behavior\n", config.port);

    let api: Arc<dyn AssistantsApi> = Arc::new(OpenAiClient::new(config.api_key.clone()));

    let app = app_router(
        ThreadRouteState {
            api: Arc::clone(&api),
            assistant_id: config.assistant_id.clone(),
        },
        RoutineRouteState {
            repo: Arc::new(InMemoryRoutineRepository::new()),
            api: Arc::clone(&api),
            model: config.completion_model.clone(),
        },
        BehaviorRouteState {
            api,
            children: Arc::new(InMemoryChildProfiles::new()),
            log: Arc::new(InMemoryBehaviorLog::new()),
            model: config.completion_model.clone(),
            auth_token: config.behavior_auth_token.clone(),
        },
    );

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}
