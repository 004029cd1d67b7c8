//! External API integrations

pub mod weather;

pub use weather::{OpenMeteoClient, WeatherSource};
