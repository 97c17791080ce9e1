use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use redis::Client as RedisClient;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use messhall_api::{
    config::Config,
    db,
    middleware::session::JwtSecret,
    routes,
    services::{
        changefeed::ChangeFeed, menu_window::MenuWindowManager, metrics, rollover_scheduler,
        sweep_scheduler,
    },
    store::RedisMenuStore,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let redis_client = RedisClient::open(config.redis_url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_async_connection().await?;
    info!("Redis connected");

    let menu = MenuWindowManager::new(Arc::new(RedisMenuStore::new(redis_conn.clone())));
    // Anchor the window before accepting traffic; the scheduler keeps it
    // anchored from here on.
    let today = chrono::Local::now().date_naive();
    if menu.rollover_if_needed(today).await? {
        info!("Menu window rolled to {today}");
    }

    let state = AppState {
        db: pool.clone(),
        redis: redis_conn.clone(),
        redis_client: redis_client.clone(),
        config: config.clone(),
        menu: menu.clone(),
        feed: ChangeFeed::new(redis_conn),
    };

    rollover_scheduler::start(menu, config.rollover_tick_secs);
    sweep_scheduler::start(pool.clone(), config.roster_sweep_secs);
    metrics::start(pool);

    // CORS: the configured app origin, plus localhost for development.
    let cors_origin = {
        let base = config.app_base_url.clone();
        AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let o = match origin.to_str() {
                Ok(s) => s,
                Err(_) => return false,
            };
            o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") || o == base
        })
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Menu window
        .route("/menu", get(routes::menu::get_window))
        .route(
            "/menu/{date}",
            get(routes::menu::get_day).put(routes::menu::set_day),
        )
        .route("/catalog", get(routes::catalog::list_catalog))
        // Votes
        .route("/votes", post(routes::votes::submit_vote))
        .route("/votes/{date}/mine", get(routes::votes::my_votes))
        .route("/votes/{date}/counts", get(routes::votes::day_counts))
        // Complaints
        .route(
            "/complaints",
            get(routes::complaints::list_complaints).post(routes::complaints::submit_complaint),
        )
        .route("/complaints/mine", get(routes::complaints::my_complaints))
        .route(
            "/complaints/summary",
            get(routes::complaints::complaint_summary),
        )
        .route(
            "/complaints/{id}/status",
            put(routes::complaints::update_status),
        )
        .route("/complaints/{id}/reply", post(routes::complaints::reply))
        // Live feed
        .route("/live", get(routes::live::live_handler))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("mess hall API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
