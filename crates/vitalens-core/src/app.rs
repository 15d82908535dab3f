//! Object graph for one client process

use crate::config::ClientConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::gateway::{ApiClient, AuthGateway, MealGateway, NutritionGateway};
use crate::session::Session;

/// Session and gateways sharing one store, transport and event bus
#[derive(Debug)]
pub struct AppServices {
    pub session: Session,
    pub meals: MealGateway,
    pub nutrition: NutritionGateway,
}

impl AppServices {
    /// Open the configured store and wire everything to a `reqwest` transport
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let store = config.open_store()?;
        let client = ApiClient::from_config(config, store)?;
        log::debug!("[session] Connected to {}", client.base_url());
        Ok(Self::from_client(client, EventBus::default()))
    }

    /// Wire the services around an existing client
    pub fn from_client(client: ApiClient, bus: EventBus) -> Self {
        let session = Session::new(
            client.store().clone(),
            AuthGateway::new(client.clone()),
            bus,
        );
        Self {
            session,
            meals: MealGateway::new(client.clone()),
            nutrition: NutritionGateway::new(client),
        }
    }
}
