use actix_web::{web, App, HttpServer};
use clap::Parser;
use reviewstore::api;
use reviewstore::config::Config;
use reviewstore::db::Database;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.default_log_filter().into()),
        )
        .init();

    tracing::info!("reviewstore v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the database
    let db = Database::connect(&config.database_url).map_err(std::io::Error::other)?;
    db.create_schema().await.map_err(std::io::Error::other)?;

    let (host, port) = config.bind_address();
    tracing::info!("listening on http://{}:{}", host, port);

    // Start the Actix Web server
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db.clone())) // Each worker shares the same connection
            .configure(api::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
