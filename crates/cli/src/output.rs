// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use warden_core::{Notification, Statistics};

use crate::color;
use crate::display::{format_bytes, format_uptime};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print one notification as a text line or a JSON object per line.
pub fn print_notification(format: OutputFormat, notification: &Notification) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let now = chrono::Local::now().format("%H:%M:%S").to_string();
            println!("{} {}", color::context(&now), render(notification));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(notification)?),
    }
    Ok(())
}

/// Text rendering, without the timestamp prefix.
pub fn render(notification: &Notification) -> String {
    match notification {
        Notification::StatusChanged { status } => format!("status  {}", color::status(*status)),
        Notification::LogReceived { record } => {
            format!("{:<7} {}", color::level(&record.level), record.message)
        }
        Notification::StatisticsUpdated { stats } => format!("stats   {}", summarize(stats)),
        Notification::ErrorOccurred { message } => format!("{}   {message}", color::bad("error")),
    }
}

/// `up 1.50 KB  down 2.00 MB  conns 1/3  uptime 00:42`
pub fn summarize(stats: &Statistics) -> String {
    format!(
        "up {}  down {}  conns {}/{}  uptime {}",
        format_bytes(stats.upload_bytes),
        format_bytes(stats.download_bytes),
        stats.active_connections,
        stats.total_connections,
        format_uptime(stats.uptime_seconds),
    )
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
