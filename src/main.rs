#![warn(clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use wicket::{
    handlers::{current_user, health, login, logout, renew, signup},
    store::{MemorySessionStore, MemoryUserStore, UserStore},
    CredentialVerifier, SessionManager, WicketSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Loads .env, initializes the logger, and fails hard on a missing secret
    let settings = WicketSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let session_store = Arc::new(MemorySessionStore::new());
    let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());

    let session_manager = SessionManager::new(
        session_store,
        settings.session.secret.as_bytes(),
        settings.cookies.secure,
        settings.session.ttl_days,
    );
    let credential_verifier = CredentialVerifier::new(users.clone());

    spawn_expiry_sweep(&session_manager, settings.session.sweep_interval_minutes);

    start_server(session_manager, credential_verifier, users, settings).await
}

/// Periodic housekeeping: drop expired session records. Disabled when the
/// interval is 0; verification already treats expired records as absent.
fn spawn_expiry_sweep(session_manager: &SessionManager, interval_minutes: u64) {
    if interval_minutes == 0 {
        return;
    }

    let manager = session_manager.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            match manager.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => log::info!("expiry sweep removed {purged} session(s)"),
                Err(e) => log::warn!("expiry sweep failed: {e}"),
            }
        }
    });
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if server binding fails or the server fails to start
async fn start_server(
    session_manager: SessionManager,
    credential_verifier: CredentialVerifier,
    users: Arc<dyn UserStore>,
    settings: WicketSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Authorization", "Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(session_manager.clone()))
            .app_data(web::Data::new(credential_verifier.clone()))
            .app_data(web::Data::new(users.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Authentication endpoints
        .route("/auth/signup", web::post().to(signup))
        .route("/auth/login", web::post().to(login))
        .route("/auth/logout", web::post().to(logout))
        .route("/auth/renew", web::post().to(renew))
        .route("/auth/me", web::get().to(current_user))
        // Health endpoint
        .route("/ping", web::get().to(health));
}

fn print_startup_info(bind_address: &str, settings: &WicketSettings) {
    println!("Starting Wicket session service on http://{bind_address}");
    println!();
    println!("Authentication endpoints:");
    println!("  POST /auth/signup - Register and sign in");
    println!("  POST /auth/login  - Verify credentials, open a session");
    println!("  POST /auth/logout - Revoke the current session");
    println!("  POST /auth/renew  - Slide the session expiration forward");
    println!("  GET  /auth/me     - Current user for the presented session");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping        - Health check");
    println!();
    println!(
        "Session TTL: {} day(s), secure cookies: {}",
        settings.session.ttl_days, settings.cookies.secure
    );
}
