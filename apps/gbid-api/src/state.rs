use std::sync::Arc;

use gbid_service::{GbidService, Providers};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<GbidService>,
}
impl AppState {
	pub fn new(config: gbid_config::Config) -> Self {
		Self { service: Arc::new(GbidService::new(config)) }
	}

	pub fn with_providers(config: gbid_config::Config, providers: Providers) -> Self {
		Self { service: Arc::new(GbidService::with_providers(config, providers)) }
	}
}
