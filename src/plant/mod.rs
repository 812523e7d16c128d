//! Plant components: site configuration, battery store, and synthetic weather.

pub mod battery;
pub mod site;
pub mod weather;

pub use battery::{Battery, Discharge};
pub use site::{PlantParams, Site, SiteId};
pub use weather::{SyntheticWeather, WeatherParams};
