use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use tracing::info;

use classifier_backend::config::Config;
use classifier_backend::logging::init_logging;
use classifier_backend::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config.log_level, config.log_json);

    let state = web::Data::new(AppState::load(&config).context("failed to load classifiers")?);

    info!(
        "Max upload size: {} MB",
        config.max_content_length / (1024 * 1024)
    );
    info!("Server running at http://{}:{}", config.host, config.port);

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(classifier_backend::configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    server
        .bind((config.host.as_str(), config.port))
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
        .run()
        .await?;
    Ok(())
}
