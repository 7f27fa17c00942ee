//! Forecast Volumes: decline-curve volume computation service
//!
//! Turns stored per-well, per-phase forecast segments into aligned daily or
//! monthly volume series.
//!
//! ## Architecture
//!
//! - **volumes**: segment strategies, date indices, resolution, well assembly
//! - **grouping**: per-well grouping pipelines issued to the store
//! - **query**: filter and sort translation, cursor handling
//! - **store**: document store backends (in-memory, sled)
//! - **service**: request façade with paging and cancellation
//! - **api**: Axum HTTP surface

pub mod api;
pub mod config;
pub mod grouping;
pub mod model;
pub mod query;
pub mod service;
pub mod store;
pub mod volumes;

// Re-export configuration
pub use config::{ServiceConfig, VolumeSettings};

// Re-export commonly used types
pub use model::{
    Forecast, ForecastKind, ForecastOutput, ForecastVolumes, OutputType, Phase, Resolution,
    Segment, SegmentKind, Series,
};

// Re-export the service façade
pub use service::{ForecastVolumeService, Page, ServiceError, VolumeRequest};

// Re-export storage
pub use store::{ForecastStore, InMemoryStore, SeedData, SledStore, StoreError};

pub use volumes::{DateRange, VolumeError};
