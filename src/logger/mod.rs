//! Logger module
//!
//! Server lifecycle logging plus per-request access logging in
//! configurable formats.

mod format;

pub use format::AccessLogEntry;

use crate::settings::Settings;
use std::net::SocketAddr;

fn write_info(message: &str) {
    println!("{message}");
}

fn write_error(message: &str) {
    eprintln!("{message}");
}

pub fn log_server_start(addr: &SocketAddr, settings: &Settings) {
    write_info("======================================");
    write_info("Server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Environment: {}", settings.env.as_str()));
    write_info(&format!(
        "Access log: {}",
        if settings.logging.access_log {
            settings.access_log_format()
        } else {
            "disabled"
        }
    ));
    if let Some(workers) = settings.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}
