//! An item CRUD web service with axum.

use item_crud::{
    app,
    feature::item::{
        item_repository::{InMemoryItemRepository, ItemGateway, PgItemRepository},
        item_service::ItemService,
    },
    infra::{
        config::{self, Config, StorageKind},
        database,
        logging::{self, TracingLog},
        state::AppState,
    },
};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn init_gateway(config: &Config) -> color_eyre::Result<Arc<dyn ItemGateway>> {
    let gateway: Arc<dyn ItemGateway> = match config.storage.kind {
        StorageKind::Postgres => {
            let db = database::init_db(&config.database);
            database::migrate(&db).await?;
            Arc::new(PgItemRepository::new(db))
        }
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage, items will not survive a restart");
            Arc::new(InMemoryItemRepository::new())
        }
    };
    Ok(gateway)
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let config = config::load_config()?;
    let _guard = logging::init_logging(&config.logging);

    let gateway = init_gateway(&config).await?;
    let items = ItemService::new(gateway, Arc::new(TracingLog));
    let state = AppState::new(items);

    let address = (config.server.http_address.as_str(), config.server.http_port);
    let listener = TcpListener::bind(address).await?;
    app::run_app(listener, state, config.server.request_timeout).await?;

    Ok(())
}
