use serde_json::Value;
use std::io::{self, Read};

/// A trade log piped in on stdin.
pub enum StdinPayload {
    Json(Value),
    /// Raw comma-separated text with a header row
    Csv(String),
}

/// Read a piped trade log: JSON when it opens with `[` or `{`, CSV otherwise.
/// Returns None for an interactive terminal or empty input.
pub fn read_stdin() -> Result<Option<StdinPayload>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(classify(&buffer)?)
}

fn classify(buffer: &str) -> Result<Option<StdinPayload>, serde_json::Error> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Ok(Some(StdinPayload::Json(serde_json::from_str(trimmed)?)));
    }
    Ok(Some(StdinPayload::Csv(trimmed.to_string())))
}
