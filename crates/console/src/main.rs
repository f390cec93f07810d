use std::sync::Arc;

use anyhow::Context;

use tutaller_client::HttpIdentityResolver;
use tutaller_console::config::ConsoleConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tutaller_observability::init();

    let config = ConsoleConfig::from_env().context("invalid console configuration")?;

    let resolver = HttpIdentityResolver::new(&config.api_base_url, config.auth_timeout)
        .context("failed to build identity resolver")?;
    let app = tutaller_console::app::build_app(Arc::new(resolver));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, api = %config.api_base_url, "console listening");

    axum::serve(listener, app).await?;
    Ok(())
}
