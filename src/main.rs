use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use splitledger::{config::Config, routes, state::AppState};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::load().context("invalid configuration")?;
    let state = web::Data::new(
        AppState::from_config(&config)
            .await
            .context("failed to set up storage")?,
    );

    let address = (config.host.clone(), config.port);
    info!("Binding to {}:{}", address.0, address.1);

    let cors_origin = config.cors_origin.clone();
    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials(),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
