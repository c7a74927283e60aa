pub mod catalog;
pub mod config;
pub mod constants;
pub mod coords;
pub mod error;
pub mod filter;
pub mod launch;
pub mod measure;
pub mod model;
pub mod nav;
pub mod popup;
pub mod prefs;
pub mod resolve;
pub mod session;
pub mod shortcuts;
pub mod sidebar;
pub mod surface;

pub use catalog::{Catalog, CatalogLoader, MapSource};
pub use config::ViewerConfig;
pub use error::{ActivateError, CatalogError, SourceError};
pub use model::{LatLng, MapDescriptor};
pub use session::{Activated, Controls, ImageOutcome, LoadingPhase, ViewSession};
pub use surface::{LayerId, MapSurface};
