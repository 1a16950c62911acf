//! Access log format module
//!
//! Supports the `dev` and `tiny` formats plus custom patterns with
//! `$variable` substitution.

use chrono::Local;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request URI path
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: String,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            request_time_us: 0,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "dev" => self.format_dev(),
            "tiny" => self.format_tiny(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    fn response_time_ms(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let ms = self.request_time_us as f64 / 1000.0;
        format!("{ms:.3}")
    }

    /// `dev` format:
    /// `$method $url $status $response_time ms - $body_bytes`
    fn format_dev(&self) -> String {
        format!(
            "{} {} {} {} ms - {}",
            self.method,
            self.request_uri(),
            self.status,
            self.response_time_ms(),
            self.body_bytes,
        )
    }

    /// `tiny` format:
    /// `$method $url $status $body_bytes - $response_time ms`
    fn format_tiny(&self) -> String {
        format!(
            "{} {} {} {} - {} ms",
            self.method,
            self.request_uri(),
            self.status,
            self.body_bytes,
            self.response_time_ms(),
        )
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client IP address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request` - Full request line ("METHOD /path HTTP/version")
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Request URI with query string
    /// - `$status` - Response status code
    /// - `$body_bytes_sent` - Response body size
    /// - `$request_time` - Request processing time in seconds (3 decimal places)
    fn format_custom(&self, pattern: &str) -> String {
        let mut result = pattern.to_string();

        let request_uri = self.request_uri();
        let request_line = format!("{} {} HTTP/{}", self.method, request_uri, self.http_version);

        // Order matters: longer variables first to avoid partial replacement
        result = result.replace("$remote_addr", &self.remote_addr);
        result = result.replace(
            "$time_local",
            &self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string(),
        );
        result = result.replace("$time_iso8601", &self.time.to_rfc3339());
        // $request_time must come before $request
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;
        result = result.replace("$request_time", &format!("{request_time:.3}"));
        result = result.replace("$request_method", &self.method);
        result = result.replace("$request_uri", &request_uri);
        result = result.replace("$request", &request_line);
        result = result.replace("$status", &self.status.to_string());
        result = result.replace("$body_bytes_sent", &self.body_bytes.to_string());

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1".to_string(),
            "GET".to_string(),
            "/surveys/s1".to_string(),
        );
        entry.query = Some("page=1".to_string());
        entry.status = 404;
        entry.body_bytes = 1234;
        entry.request_time_us = 1500;
        entry
    }

    #[test]
    fn test_format_dev() {
        let entry = create_test_entry();
        let log = entry.format("dev");
        assert_eq!(log, "GET /surveys/s1?page=1 404 1.500 ms - 1234");
    }

    #[test]
    fn test_format_tiny() {
        let entry = create_test_entry();
        let log = entry.format("tiny");
        assert_eq!(log, "GET /surveys/s1?page=1 404 1234 - 1.500 ms");
    }

    #[test]
    fn test_no_query_string() {
        let mut entry = create_test_entry();
        entry.query = None;
        assert!(entry.format("tiny").starts_with("GET /surveys/s1 404"));
    }

    #[test]
    fn test_format_custom() {
        let entry = create_test_entry();
        let log = entry.format("$remote_addr \"$request\" $status $request_time");
        assert!(log.contains("192.168.1.1"));
        assert!(log.contains("\"GET /surveys/s1?page=1 HTTP/1.1\""));
        assert!(log.contains("404"));
        // 1500us = 0.0015s, formatted with 3 decimal places
        assert!(log.ends_with("0.002") || log.ends_with("0.001"));
    }
}
