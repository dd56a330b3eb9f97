pub mod config;
pub mod connection;
pub mod coordinator;
pub mod hub;
pub mod models;
pub mod protocol;
pub mod rate_limit;
pub mod registry;
pub mod routes;
pub mod store;
pub mod sweep;

use config::RuntimeConfig;
use connection::ConnectionRegistry;
use coordinator::EventCoordinator;
use hub::RoomHub;
use registry::LectureRegistry;
use rocket_cors::{AllowedOrigins, CorsOptions};
use std::sync::Arc;
use store::DocumentStore;

pub fn rocket() -> rocket::Rocket<rocket::Build> {
    build_rocket(RuntimeConfig::from_env())
}

pub fn build_rocket(config: RuntimeConfig) -> rocket::Rocket<rocket::Build> {
    if let Some(parent) = std::path::Path::new(&config.storage_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let store = Arc::new(DocumentStore::open(&config.storage_path).expect("failed to open document store"));
    let lecture_registry = Arc::new(LectureRegistry::new());
    let connections = Arc::new(ConnectionRegistry::new());
    let hub = Arc::new(RoomHub::new(Arc::clone(&connections), Arc::clone(&lecture_registry), config.clone()));
    let coordinator = EventCoordinator::new(Arc::clone(&store), Arc::clone(&lecture_registry), Arc::clone(&hub));

    let allowed_origins = AllowedOrigins::some_exact(&config.allowed_origins);
    let cors = CorsOptions::default()
        .allowed_origins(allowed_origins)
        .to_cors()
        .expect("failed to build CORS fairing");

    let sweep_interval = config.room_cleanup_interval;
    let sweep_threshold = config.room_inactive_threshold;
    let sweep_hub = Arc::clone(&hub);
    let shutdown_hub = Arc::clone(&hub);

    rocket::build()
        .manage(store)
        .manage(lecture_registry)
        .manage(connections)
        .manage(hub)
        .manage(coordinator)
        .manage(config)
        .attach(cors)
        .register("/", rocket::catchers![routes::too_many_requests, routes::not_found])
        .mount(
            "/",
            rocket::routes![
                routes::health,
                routes::stats,
                routes::create_room,
                routes::get_room,
                routes::create_lecture,
                routes::get_lecture,
                routes::update_lecture_status,
                routes::ws_connect,
            ],
        )
        .attach(rocket::fairing::AdHoc::on_liftoff("Idle Room Sweep", move |_rocket| {
            let sweep_hub = Arc::clone(&sweep_hub);
            Box::pin(async move {
                sweep::spawn_sweep_task(sweep_hub, sweep_interval, sweep_threshold);
                println!("🧹 idle room sweep started");
            })
        }))
        .attach(rocket::fairing::AdHoc::on_liftoff("Graceful Shutdown", move |rocket| {
            let shutdown_hub = Arc::clone(&shutdown_hub);
            Box::pin(async move {
                let shutdown = rocket.shutdown();
                tokio::spawn(async move {
                    wait_for_shutdown_signal().await;
                    shutdown_hub.shutdown("server is shutting down").await;
                    shutdown.notify();
                });
                println!("🔌 shutdown signal handler installed");
            })
        }))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
