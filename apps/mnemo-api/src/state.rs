use std::sync::Arc;

use mnemo_config::Config;
use mnemo_service::{MnemoService, Providers};
use mnemo_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MnemoService>,
}
impl AppState {
	/// Connects to Qdrant, makes sure the collection exists, and probes the reranker.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let store = QdrantStore::new(&config.storage.qdrant)?;

		store.ensure_collection().await?;

		let service = MnemoService::start(config, Arc::new(store), Providers::default()).await;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: MnemoService) -> Self {
		Self { service: Arc::new(service) }
	}
}
