use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};

use teamboard::{store::PgStore, AppState, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("starting in {:?} mode", config.app_env);

    let store = match PgStore::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            log::error!("failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = store.migrate().await {
        log::error!("{}", e);
        std::process::exit(1);
    }

    let state = match AppState::from_config(&config, Arc::new(store)) {
        Ok(state) => state,
        Err(e) => {
            log::error!("failed to build application state: {}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting teamboard server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
