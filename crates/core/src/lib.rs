#![forbid(unsafe_code)]

pub mod error;
pub mod feedback;
pub mod graph;
pub mod model;
pub mod quiz;
pub mod recommend;
pub mod time;

pub use error::Error;
pub use time::Clock;
