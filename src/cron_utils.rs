//! Reminder schedule parsing and next-run computation.
//!
//! Schedules are written by hand in `config.toml` and always evaluated in the
//! system timezone.

use chrono::{DateTime, Local, TimeZone};
use croner::Cron;
use regex::Regex;

/// Parse a human-friendly daily schedule into a 5-field cron expression.
///
/// Accepts `daily` (midnight), `daily at 9am` / `daily at 14:30` /
/// `daily at 2:30pm`, a bare `09:00`, or a raw cron expression.
pub fn parse_schedule(input: &str) -> anyhow::Result<String> {
    let input = input.trim();

    if input.eq_ignore_ascii_case("daily") {
        return Ok("0 0 * * *".to_string());
    }

    let re_daily = Regex::new(r"(?i)^(?:daily\s+at\s+)?(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$")?;
    if let Some(caps) = re_daily.captures(input) {
        // A bare number ("9") is too ambiguous to accept.
        if caps.get(2).is_some() || caps.get(3).is_some() || input.to_lowercase().starts_with("daily") {
            let (hour, minute) = parse_time_captures(&caps)?;
            return Ok(format!("{} {} * * *", minute, hour));
        }
    }

    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() == 5 {
        input
            .parse::<Cron>()
            .map_err(|e| anyhow::anyhow!("Invalid cron expression '{}': {}", input, e))?;
        return Ok(input.to_string());
    }

    anyhow::bail!(
        "Unrecognized reminder schedule '{}'. Use 'daily', 'daily at 9am', '09:00' or a 5-field cron expression.",
        input
    )
}

fn parse_time_captures(caps: &regex::Captures) -> anyhow::Result<(u32, u32)> {
    let mut hour: u32 = caps[1].parse()?;
    let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse())?;
    if let Some(ampm) = caps.get(3) {
        if hour == 0 || hour > 12 {
            anyhow::bail!("Hour must be between 1 and 12 when using am/pm");
        }
        match ampm.as_str().to_lowercase().as_str() {
            "am" if hour == 12 => hour = 0,
            "pm" if hour != 12 => hour += 12,
            _ => {}
        }
    }
    if hour > 23 {
        anyhow::bail!("Hour must be between 0 and 23");
    }
    if minute > 59 {
        anyhow::bail!("Minute must be between 0 and 59");
    }
    Ok((hour, minute))
}

/// Next occurrence of `cron_expr` strictly after `after`.
pub fn next_run_after<Tz: TimeZone>(
    cron_expr: &str,
    after: &DateTime<Tz>,
) -> anyhow::Result<DateTime<Tz>> {
    let cron: Cron = cron_expr
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to parse cron '{}': {}", cron_expr, e))?;

    cron.find_next_occurrence(after, false)
        .map_err(|e| anyhow::anyhow!("No next occurrence for '{}': {}", cron_expr, e))
}

pub fn compute_next_run_local(cron_expr: &str) -> anyhow::Result<DateTime<Local>> {
    next_run_after(cron_expr, &Local::now())
}

pub fn system_timezone_display() -> String {
    let now = Local::now();
    format!("{} (UTC{})", now.format("%Z"), now.format("%:z"))
}
