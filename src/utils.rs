//! Small cross-cutting helpers used by the pipeline stages: timing, text
//! truncation, and byte/duration formatting for log lines.

use std::time::Instant;

/// Measures how long a pipeline stage takes and logs it on drop via `stop()`.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("{} completed in {}ms", self.name, elapsed);
        elapsed
    }
}

pub struct TextUtils;

impl TextUtils {
    /// Truncate text to `max_length` bytes with an ellipsis, for log lines and
    /// error messages (not for the LLM-prompt truncation, which has its own
    /// head/middle/tail budgeting).
    pub fn truncate(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            text.to_string()
        } else {
            format!("{}...", &text[..max_length.saturating_sub(3)])
        }
    }

    pub fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    /// Strips control characters (keeping whitespace) before logging PDF-derived text.
    pub fn sanitize(text: &str) -> String {
        text.chars().filter(|c| !c.is_control() || c.is_whitespace()).collect()
    }
}

pub struct SystemUtils;

impl SystemUtils {
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

/// Times a block and logs its duration under `name`.
#[macro_export]
macro_rules! time_block {
    ($name:expr, $block:block) => {{
        let timer = $crate::utils::Timer::new($name);
        let result = $block;
        timer.stop();
        result
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_text() {
        assert_eq!(TextUtils::truncate("Hello world", 20), "Hello world");
        assert_eq!(TextUtils::truncate("This is a very long text", 10), "This is...");
    }

    #[test]
    fn formats_bytes() {
        assert_eq!(SystemUtils::format_bytes(512), "512 B");
        assert_eq!(SystemUtils::format_bytes(1024), "1.00 KB");
        assert_eq!(SystemUtils::format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn sanitize_strips_control_chars_but_keeps_whitespace() {
        let input = "line one\n\x07line two\tend";
        assert_eq!(TextUtils::sanitize(input), "line one\nline two\tend");
    }
}
