use actix_cors::Cors;
use actix_web::{middleware, App, HttpServer};
use exam_grader::api::{configure_routes, AppState};
use exam_grader::{banner, config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Print the startup banner
    banner::print_banner();

    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  Warning: Could not load .env file: {}", e);
        eprintln!("   Make sure GEMINI_API_KEY is set in your environment");
    }

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    log::info!(
        "Probing API versions {:?} for models {:?}",
        app_config.gemini.api_versions,
        app_config.gemini.models
    );

    let bind_addr = app_config.bind_addr.clone();
    let state = AppState::new(app_config);

    println!("🚀 Starting server...");
    println!("📊 Grading API available at http://{}/api/v1", bind_addr);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(actix_web::web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
