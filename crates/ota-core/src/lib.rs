// OTA Core - catalog, eligibility, and artifact storage for the tauOS update service

pub mod catalog;
pub mod eligibility;
pub mod store;
pub mod types;

pub use catalog::{CatalogError, UpdateCatalog};
pub use eligibility::check;
pub use store::{ArtifactStore, StagedArtifact, StoreError, StoredArtifact};
pub use types::{DeviceInfo, EligibilityResult, Platform, UpdateInfo, UpdateRecord};
