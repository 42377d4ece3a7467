#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod actions;
mod config;
mod error;
mod feed;
mod http;
mod telemetry;
mod time_fmt;
mod ui;
mod viewport;

use clap::Parser;
use tokio::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::parse();

    let rt = tokio::runtime::Runtime::new()?;
    let handle = rt.handle().clone();
    let _enter = handle.enter();

    std::thread::spawn(move || {
        rt.block_on(async {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        })
    });

    ui::init(config)?;
    Ok(())
}
