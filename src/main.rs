use call_desk::api::api_routes;
use call_desk::config::{AppConfig, SmtpConfig};
use call_desk::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env();
    let smtp = SmtpConfig::from_env();

    eprintln!("📞 call-desk v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Database: {}", config.db_path);
    eprintln!(
        "   SMTP: {}",
        smtp.as_ref()
            .map(|s| format!("{}:{} (from {})", s.host, s.port, s.from_address))
            .unwrap_or_else(|| "disabled".to_string())
    );
    eprintln!("   Oversight copy: {}\n", config.oversight_address);

    let state = server::build_state(&config, smtp.as_ref()).await?;
    let app = api_routes(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    server::serve(listener, app).await?;

    Ok(())
}
