use upsync_core::domain::SyncEvent;
use upsync_core::ports::IProgressReporter;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter: Send + Sync {
    fn line(&self, message: &str);
    fn success(&self, message: &str);
    fn info(&self, message: &str);
    fn event(&self, event: &SyncEvent);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn line(&self, message: &str) {
        println!("{}", message);
    }
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn event(&self, event: &SyncEvent) {
        println!("{}", event);
    }
    fn print_json(&self, _value: &serde_json::Value) {
        // Human formatter doesn't print JSON
    }
}

/// JSON output formatter, one object per line
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn line(&self, message: &str) {
        println!("{}", serde_json::json!({ "message": message }));
    }
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn event(&self, event: &SyncEvent) {
        println!("{}", event_json(event));
    }
    fn print_json(&self, value: &serde_json::Value) {
        println!("{}", value);
    }
}

fn event_json(event: &SyncEvent) -> serde_json::Value {
    serde_json::to_value(event).unwrap_or_else(|_| serde_json::json!({ "message": event.to_string() }))
}

pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

/// Prints every sync event as it happens
///
/// With `quiet` set, events are dropped and only the summary is printed.
pub struct ConsoleReporter {
    formatter: Box<dyn OutputFormatter>,
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self {
            formatter: get_formatter(matches!(format, OutputFormat::Json)),
            quiet,
        }
    }
}

impl IProgressReporter for ConsoleReporter {
    fn report(&self, event: &SyncEvent) {
        if !self.quiet {
            self.formatter.event(event);
        }
    }
}

/// Appends "s" for counts other than one
pub fn plural(count: u32) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Formats a millisecond duration the way the summary shows it
pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms >= 1000 {
        format!("{:.1}s", duration_ms as f64 / 1000.0)
    } else {
        format!("{}ms", duration_ms)
    }
}
