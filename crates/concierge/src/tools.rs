//! The tool catalog offered to the orchestrator.
//!
//! Each collection holds its collaborators and exposes one async method per
//! tool; `definitions` binds those methods into registry entries.
mod datetime;
mod regions;
mod system;
mod users;
mod weather;

pub use datetime::{now_timestamp, DateTimeTools};
pub use regions::RegionTools;
pub use system::SystemTools;
pub use users::UserTools;
pub use weather::WeatherTools;

use std::sync::Arc;

use crate::errors::RegistryError;
use crate::registry::ToolRegistry;
use crate::store::DirectoryStore;
use crate::weather::WeatherService;

/// Registry with the full catalog, in advertised order
pub fn default_registry(
    store: Arc<dyn DirectoryStore>,
    weather: Arc<dyn WeatherService>,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register_all(Arc::new(DateTimeTools::new()).definitions())?;
    registry.register_all(Arc::new(RegionTools::new(store.clone())).definitions())?;
    registry.register_all(Arc::new(UserTools::new(store.clone())).definitions())?;
    registry.register_all(Arc::new(WeatherTools::new(weather)).definitions())?;
    registry.register_all(Arc::new(SystemTools::new(store)).definitions())?;
    Ok(registry)
}
