//! Status reporting for pipeline runs.
//!
//! The reporter is constructed once in `main` and handed to each stage by
//! reference. It only writes progress lines; it never drives control flow.

use time::OffsetDateTime;

/// Timestamped, leveled progress output.
#[derive(Debug, Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    /// Emit one `[INFO]` line to stdout.
    pub fn info(&self, message: &str) {
        println!("[{}] [INFO] {}", timestamp(), message);
    }
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
