use careconnect::config::Config;
use careconnect::harness::{self, flows};
use careconnect::stub::{self, StubState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let arg = std::env::args().nth(1);

    // `careconnect stub`：只启动桩服务端，供外部客户端调试
    if arg.as_deref() == Some("stub") {
        serve_stub(&config).await;
        return;
    }

    let selected = flows::matching(arg.as_deref());
    if selected.is_empty() {
        tracing::error!("No flow matches {:?}", arg);
        std::process::exit(2);
    }

    if config.use_stub_backend {
        tracing::info!("Running {} flows against the in-process stub backend", selected.len());
    } else {
        tracing::info!("Running {} flows against {}", selected.len(), config.api_domain);
    }

    let report = harness::run(&config, &selected).await;
    let failed = report.failed();
    println!("{} passed, {} failed", report.passed(), failed.len());
    for outcome in &failed {
        println!(
            "  FAILED {}: {}",
            outcome.name,
            outcome.error.as_deref().unwrap_or_default()
        );
    }

    if !report.is_success() {
        std::process::exit(1);
    }
}

async fn serve_stub(config: &Config) {
    let state = match StubState::seeded(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to seed stub backend: {}", e);
            std::process::exit(2);
        }
    };
    let server = match stub::spawn(state).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind stub backend: {}", e);
            std::process::exit(2);
        }
    };

    println!("Stub backend ready at {}", server.base_url());
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Stub backend shutting down");
}
