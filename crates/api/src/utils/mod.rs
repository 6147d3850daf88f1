//! Command helpers shared across the app layer

pub mod health;
pub mod logging;
