use clap::Parser;
use reqwest::Url;

use crate::error::{Error, Result};

/// Path of the server-sent events feed
pub const EVENTS_PATH: &str = "/events";
/// Path that erases all recorded data on the device
pub const CLEAR_PATH: &str = "/clear";

/// Live gyro/accelerometer dashboard for the ESP32 sensor web server
#[derive(Debug, Clone, Parser)]
#[command(name = "imu_telemetry_gui")]
#[command(version)]
pub struct Config {
    /// Base URL of the sensor web server
    #[arg(short, long, default_value = "http://192.168.4.1")]
    pub server: Url,

    /// Initial window width
    #[arg(long, default_value_t = 1024.0)]
    pub width: f32,

    /// Initial window height
    #[arg(long, default_value_t = 768.0)]
    pub height: f32,
}

impl Config {
    pub fn events_url(&self) -> Result<Url> {
        self.endpoint(EVENTS_PATH)
    }

    /// Resolves an absolute path against the server origin.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.server
            .join(path)
            .map_err(|e| Error::Config(format!("invalid endpoint '{path}': {e}")))
    }

    /// URL of the reset action bound to a UI control.
    pub fn reset_url(&self, element_id: &str) -> Result<Url> {
        self.endpoint(&format!("/{element_id}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(server: &str) -> Config {
        Config::parse_from(["imu_telemetry_gui", "--server", server])
    }

    #[test]
    fn defaults() {
        let config = Config::parse_from(["imu_telemetry_gui"]);
        assert_eq!(config.server.as_str(), "http://192.168.4.1/");
        assert_eq!(config.width, 1024.0);
        assert_eq!(config.height, 768.0);
    }

    #[test]
    fn endpoints_are_relative_to_origin() {
        let config = config("http://10.0.0.7:8080/dashboard/index.html");
        assert_eq!(
            config.events_url().unwrap().as_str(),
            "http://10.0.0.7:8080/events"
        );
        assert_eq!(
            config.endpoint(CLEAR_PATH).unwrap().as_str(),
            "http://10.0.0.7:8080/clear"
        );
        assert_eq!(
            config.reset_url("resetX").unwrap().as_str(),
            "http://10.0.0.7:8080/resetX"
        );
    }

    #[test]
    fn rejects_invalid_server() {
        assert!(Config::try_parse_from(["imu_telemetry_gui", "--server", "not a url"]).is_err());
    }
}
