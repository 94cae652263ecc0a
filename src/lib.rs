//! `GeoAssist` - geospatial action dispatch and weather risk analysis
//!
//! This library turns model-emitted map actions into renderer-agnostic
//! layers: it validates actions, resolves state and county names, reads
//! forecast and infrastructure datasets, and runs the wind-vs-power-line
//! and unsafe-temperature risk analyses.

pub mod assembler;
pub mod cache;
pub mod cities;
pub mod config;
pub mod dataset;
pub mod dispatcher;
pub mod error;
pub mod geojson;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod region_resolver;
pub mod risk;

// Re-export core types for public API
pub use assembler::{assemble, bounds_of};
pub use cache::RegionCache;
pub use config::GeoAssistConfig;
pub use dataset::{DatasetAccess, StaticDatasets};
pub use dispatcher::{ActionHandler, HandlerContext, HandlerRegistry};
pub use error::{GeoAssistError, RegionLookupFailure, ValidationKind};
pub use models::{Action, ActionType, Layer, LayerRole, Region, RegionKind, RiskResult, RiskTier};
pub use normalizer::{Normalizer, normalize};
pub use pipeline::{GeoAssist, SessionContext};
pub use region_resolver::RegionResolver;
pub use risk::{CustomerEstimator, RiskEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, GeoAssistError>;
