//! Assets module - fixed assets and their depreciation schedules.

mod assets_model;
mod assets_service;
mod assets_traits;


// Re-export the public interface
pub use assets_model::{Asset, AssetScheduleItem, DepreciationMethod};
pub use assets_service::{depreciate, regularize_asset, AssetService};
pub use assets_traits::AssetRepositoryTrait;
