pub mod assistant;
pub mod category;
pub mod config;
pub mod dataset;
pub mod favorites;
pub mod layers;
pub mod logging;
pub mod proximity;
pub mod ranking;
pub mod search;
pub mod server;
pub mod stats;
