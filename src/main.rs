use rocket::launch;
use std::sync::Arc;

use range_wizard::{bootstrap, config, web};

#[launch]
async fn rocket() -> _ {
    env_logger::init();

    // Load configuration
    let config = config::Config::from_env()
        .expect("Failed to load configuration");

    // Build application state
    let app_state = Arc::new(
        bootstrap::AppState::new(&config)
            .expect("Failed to initialize application state")
    );
    log::info!(
        "Serving on port {} (tick spacing {}, {} listed tokens)",
        config.port,
        app_state.engine.tick_spacing,
        app_state.token_list.len()
    );

    // Configure Rocket
    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", "0.0.0.0"));

    rocket::custom(figment)
        .manage(app_state)
        .mount("/", web::routes::api_routes())
}
