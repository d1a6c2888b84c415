//! External API integrations

pub mod inference;
pub mod valve;
pub mod weather;

pub use inference::RemoteClassifier;
pub use valve::{ValveActuator, ValveClient};
pub use weather::{WeatherClient, WeatherSource};
