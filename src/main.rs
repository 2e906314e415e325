use std::sync::Arc;

use axum::Json;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use nutrimind::blueprint::{GeneratorConfig, LlmBlueprintGenerator};
use nutrimind::config::AppConfig;
use nutrimind::llm::{LlmConfig, create_provider};
use nutrimind::meals::{AnalyzerConfig, MealAnalyzer, MealRouteState, meal_routes};
use nutrimind::onboarding::{
    OnboardingManager, OnboardingRouteState, TokioClock, onboarding_routes,
};
use nutrimind::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export NUTRIMIND_LLM_API_KEY=...");
        std::process::exit(1);
    });

    // Initialize tracing: stderr plus a daily-rolling file
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "nutrimind.log");
    let (file_writer, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr.and(file_writer))
        .with_target(false)
        .init();

    eprintln!("🥗 NutriMind v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm_model);
    eprintln!("   API: http://{}/api", config.bind_addr);

    // ── LLM provider ─────────────────────────────────────────────────────
    let llm_config = LlmConfig {
        backend: config.llm_backend,
        api_key: config.llm_api_key.clone(),
        model: config.llm_model.clone(),
    };
    let llm = create_provider(&llm_config)?;

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Onboarding ───────────────────────────────────────────────────────
    let generator = Arc::new(LlmBlueprintGenerator::new(
        llm.clone(),
        GeneratorConfig::default(),
    ));
    let manager = Arc::new(
        OnboardingManager::resume(
            Arc::clone(&db),
            generator,
            Arc::new(TokioClock),
            config.splash_delay,
        )
        .await,
    );
    if manager.is_active() {
        // Timed self-transition off the splash screen.
        let timer_manager = Arc::clone(&manager);
        tokio::spawn(async move {
            timer_manager.run_splash_timer().await;
        });
        eprintln!("   Onboarding: active");
    } else {
        eprintln!("   Onboarding: complete");
    }

    // ── Meals ────────────────────────────────────────────────────────────
    let analyzer = Arc::new(MealAnalyzer::new(llm, AnalyzerConfig::default()));

    // ── REST server ──────────────────────────────────────────────────────
    let app = onboarding_routes(OnboardingRouteState {
        manager: Arc::clone(&manager),
    })
    .merge(meal_routes(MealRouteState {
        db: Arc::clone(&db),
        analyzer,
    }))
    .route(
        "/health",
        get(|| async { Json(serde_json::json!({"status": "ok"})) }),
    )
    .layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "REST server started");
    axum::serve(listener, app).await?;

    Ok(())
}
