pub mod accumulator;
pub mod config;
pub mod fetcher;
pub mod percentile;
pub mod pool;
pub mod queue;
pub mod status;
pub mod targets;

pub use accumulator::*;
pub use config::*;
pub use fetcher::*;
pub use percentile::*;
pub use pool::*;
pub use queue::*;
pub use status::*;
pub use targets::*;
