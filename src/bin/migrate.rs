use axum_storefront::{
    config,
    db::{create_orm_conn, run_migrations},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,axum_storefront=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let orm = create_orm_conn(&config::database_url()?).await?;
    run_migrations(&orm).await?;
    tracing::info!("migrations applied");
    Ok(())
}
