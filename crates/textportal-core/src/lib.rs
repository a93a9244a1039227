pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod regen;
pub mod render;
pub mod serve;

pub use cache::{ArtifactCache, BlobStore, CacheLookup, Freshness};
pub use clock::{Clock, SystemClock};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use regen::{RegenerationJob, RegenerationReport, Regenerator, SchedulerService};
pub use serve::{HttpServer, ServingDispatcher};
