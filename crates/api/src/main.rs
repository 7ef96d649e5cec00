use api::{create_router_with_cors, ApiDoc, AppState};
use database::repositories::{
    PostgresCartRepository, PostgresOrderRepository, PostgresPaymentRepository,
    PostgresSessionRepository, PostgresUserRepository,
};
use services::{
    cart::CartServiceImpl,
    order::OrderServiceImpl,
    payment::{PaymentEventProjectorImpl, StripeCheckoutService, StripePaymentService},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
        eprintln!("Continuing with environment variables...");
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api=debug,services=debug,database=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting marketplace API server...");

    // Load configuration from environment
    let config = config::Config::from_env();

    tracing::info!(
        "Database: {}:{}/{}",
        config.database.host,
        config.database.port,
        config.database.database
    );
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);

    if !config.stripe.is_configured() {
        tracing::warn!("Stripe secrets are not configured; checkout and webhook will return 503");
    }

    // Create database and run migrations
    tracing::info!("Connecting to database...");
    let db = database::Database::from_config(&config.database)?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    // Repositories
    let cart_repo = Arc::new(PostgresCartRepository::new(db.pool().clone()));
    let order_repo = Arc::new(PostgresOrderRepository::new(db.pool().clone()));
    let payment_repo = Arc::new(PostgresPaymentRepository::new(db.pool().clone()));
    let session_repo = Arc::new(PostgresSessionRepository::new(db.pool().clone()));
    let user_repo = Arc::new(PostgresUserRepository::new(db.pool().clone()));

    // Services
    tracing::info!("Initializing services...");
    let cart_service = Arc::new(CartServiceImpl::new(cart_repo.clone()));
    let order_service = Arc::new(OrderServiceImpl::new(cart_repo.clone(), order_repo.clone()));

    let checkout_service = Arc::new(StripeCheckoutService::new(
        config.stripe.secret_key.clone(),
        config.stripe.currency.clone(),
    ));

    let projector = Arc::new(PaymentEventProjectorImpl::new(
        payment_repo.clone(),
        order_repo.clone(),
        cart_repo.clone(),
    ));
    let payment_service = Arc::new(StripePaymentService::new(
        config.stripe.webhook_secret.clone(),
        projector,
        payment_repo,
    ));

    // Create application state
    let app_state = AppState {
        cart_service,
        order_service,
        checkout_service,
        payment_service,
        session_repository: session_repo,
        user_repository: user_repo,
    };

    // Create router
    let app = create_router_with_cors(app_state, config.cors.clone())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
