use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use diesel::{Connection, PgConnection};
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::FutureProducer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use order_status_service::api;
use order_status_service::cache::RedisStatusCache;
use order_status_service::clock::SystemClock;
use order_status_service::config::Config;
use order_status_service::handlers::UpdateHandler;
use order_status_service::order_api::HttpOrderApi;
use order_status_service::queue::KafkaMessageQueue;
use order_status_service::repository::ReconciliationRepository;
use order_status_service::store::PgDocumentStore;
use order_status_service::usecase::OrderWorkflow;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = Config::parse();

    info!("Running database migrations...");
    let mut conn = PgConnection::establish(&config.database_url)?;
    conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
    info!("Migrations completed successfully");

    let manager = diesel_async::pooled_connection::AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
    let pool = Pool::builder().build(manager).await?;

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &config.kafka_brokers)
        .set("message.timeout.ms", "5000")
        .create()?;

    let consumer: StreamConsumer = ClientConfig::new()
        .set("group.id", "order-status-service")
        .set("bootstrap.servers", &config.kafka_brokers)
        .set("enable.partition.eof", "false")
        .set("session.timeout.ms", "6000")
        .set("enable.auto.commit", "false")
        .create()?;

    consumer.subscribe(&[&config.update_topic])?;

    let cache = RedisStatusCache::connect(&config.redis_url).await?;
    info!("Connected to redis at {}", config.redis_url);

    let repository = ReconciliationRepository::new(
        Arc::new(PgDocumentStore::new(pool)),
        Arc::new(KafkaMessageQueue::new(producer)),
        Arc::new(HttpOrderApi::new(reqwest::Client::new(), config.order_api_url.clone())),
        Arc::new(SystemClock),
        config.order_queue_name.clone(),
    );
    let workflow = Arc::new(OrderWorkflow::new(Arc::new(repository), Arc::new(cache)));

    let update_handler = UpdateHandler::new(workflow.clone());
    tokio::spawn(async move {
        update_handler.run(consumer).await;
    });

    let app = api::create_router(api::AppState { workflow });
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!("Order status service consuming {} and publishing to {}", config.update_topic, config.order_queue_name);
    info!("Order status service ready to accept HTTP requests at http://0.0.0.0:{}/orders/status", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
