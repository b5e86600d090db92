use anyhow::{bail, Result};

/// Parse `ss`, `m:ss` or `h:mm:ss` into seconds.
pub fn parse_duration(input: &str) -> std::result::Result<u32, String> {
    let parts: Vec<&str> = input.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(format!("invalid duration '{}'", input));
    }

    let mut total: u32 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: u32 = part
            .parse()
            .map_err(|_| format!("invalid duration '{}'", input))?;
        if i > 0 && value >= 60 {
            return Err(format!("invalid duration '{}': {} is not below 60", input, value));
        }
        total = total
            .checked_mul(60)
            .and_then(|t| t.checked_add(value))
            .ok_or_else(|| format!("duration '{}' is too long", input))?;
    }
    Ok(total)
}

/// `mm:ss`, with an hour prefix once needed.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

pub fn format_ago(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if parts.is_empty() || secs > 0 {
        parts.push(format!("{}s", secs));
    }
    format!("{} ago", parts.join(" "))
}

/// Convert a 1-based position typed by a user into a 0-based index below `len`.
pub fn to_index(position: usize, len: usize, what: &str) -> Result<usize> {
    if len == 0 {
        bail!("The queue is empty");
    }
    if position < 1 {
        bail!("`{}` cannot be smaller than 1", what);
    }
    if position > len {
        bail!("`{}` cannot be bigger than the queue size ({})", what, len);
    }
    Ok(position - 1)
}
