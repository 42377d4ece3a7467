use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::Sender;

use eframe::egui;
use serde::Deserialize;

use crate::error::Result;
use crate::feed::Handler;
use crate::time_fmt::format_elapsed;
use crate::viewport::{Euler, Viewport};

pub const GYRO_READINGS: &str = "gyro_readings";
pub const TEMPERATURE_READING: &str = "temperature_reading";
pub const ACCELEROMETER_READINGS: &str = "accelerometer_readings";
pub const STORAGE_INFO: &str = "storage_info";

/// A reading field as the firmware sends it, either a JSON number or the
/// number already formatted as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Scalar {
    /// Numeric value, 0 when the field does not hold a number.
    pub fn as_f64(&self) -> f64 {
        match self {
            Scalar::Number(n) => *n,
            Scalar::Text(s) => s.trim().parse().unwrap_or_default(),
            Scalar::Other(serde_json::Value::Bool(true)) => 1.0,
            Scalar::Other(_) => 0.0,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Orientation angles in degrees.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GyroReading {
    #[serde(rename = "gyroX")]
    pub x: Scalar,
    #[serde(rename = "gyroY")]
    pub y: Scalar,
    #[serde(rename = "gyroZ")]
    pub z: Scalar,
}

impl GyroReading {
    /// Rotation of the solid. The axes are remapped on purpose: X turns
    /// around depth, Y around the horizontal axis and Z around the vertical.
    pub fn rotation(&self) -> Euler {
        Euler {
            x: radians(&self.y),
            y: radians(&self.z),
            z: radians(&self.x),
        }
    }
}

fn radians(degrees: &Scalar) -> f32 {
    degrees.as_f64().to_radians() as f32
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccelReading {
    #[serde(rename = "accX")]
    pub x: Scalar,
    #[serde(rename = "accY")]
    pub y: Scalar,
    #[serde(rename = "accZ")]
    pub z: Scalar,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageInfo {
    /// Recording time in milliseconds.
    pub elapsed: Scalar,
    pub percent: Scalar,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    Gyro(GyroReading),
    Temperature(String),
    Accel(AccelReading),
    Storage(StorageInfo),
}

/// Feed handlers that parse each payload and forward it to the UI thread.
pub fn handlers(tx: Sender<Telemetry>, ctx: egui::Context) -> HashMap<String, Handler> {
    let mut handlers: HashMap<String, Handler> = HashMap::new();

    handlers.insert(
        GYRO_READINGS.to_string(),
        forward(&tx, &ctx, |data| Ok(Telemetry::Gyro(serde_json::from_str(data)?))),
    );
    handlers.insert(
        TEMPERATURE_READING.to_string(),
        forward(&tx, &ctx, |data| Ok(Telemetry::Temperature(data.to_string()))),
    );
    handlers.insert(
        ACCELEROMETER_READINGS.to_string(),
        forward(&tx, &ctx, |data| Ok(Telemetry::Accel(serde_json::from_str(data)?))),
    );
    handlers.insert(
        STORAGE_INFO.to_string(),
        forward(&tx, &ctx, |data| Ok(Telemetry::Storage(serde_json::from_str(data)?))),
    );

    handlers
}

fn forward<F>(tx: &Sender<Telemetry>, ctx: &egui::Context, parse: F) -> Handler
where
    F: Fn(&str) -> Result<Telemetry> + Send + 'static,
{
    let tx = tx.clone();
    let ctx = ctx.clone();
    Box::new(move |data: &str| {
        // the receiver only goes away while the window is closing
        tx.send(parse(data)?).ok();
        ctx.request_repaint();
        Ok(())
    })
}

/// Text shown in the readings panel. Every field holds the last value
/// received for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub gyro: [String; 3],
    pub temperature: String,
    pub acc: [String; 3],
    pub timer: String,
    pub storage_percent: String,
    /// Progress bar fill in percent, deliberately not clamped.
    pub progress_fill: f64,
    /// Latest orientation not yet handed to the viewport.
    orientation: Option<Euler>,
}

impl Dashboard {
    /// Updates the text fields right away. Gyro readings also queue their
    /// rotation, older queued rotations are replaced.
    pub fn apply(&mut self, msg: Telemetry) {
        match msg {
            Telemetry::Gyro(reading) => {
                self.gyro = [
                    reading.x.to_string(),
                    reading.y.to_string(),
                    reading.z.to_string(),
                ];
                self.orientation = Some(reading.rotation());
            }
            Telemetry::Temperature(text) => self.temperature = text,
            Telemetry::Accel(reading) => {
                self.acc = [
                    reading.x.to_string(),
                    reading.y.to_string(),
                    reading.z.to_string(),
                ];
            }
            Telemetry::Storage(info) => {
                self.timer = format_elapsed(info.elapsed.as_f64().max(0.0) as u64);
                self.storage_percent = info.percent.to_string();
                self.progress_fill = info.percent.as_f64();
            }
        }
    }

    /// Applies the queued orientation, if any, and renders it.
    pub fn update_viewport(&mut self, viewport: &mut Viewport) {
        if let Some(rotation) = self.orientation.take() {
            viewport.apply_orientation(rotation);
        }
    }
}
