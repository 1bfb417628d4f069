use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use std::sync::Arc;

use crate::errors::{ToolError, ToolResult};
use crate::models::tool::{bind, ParamType, ToolArgs, ToolDefinition, ToolParameter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Current time in the server's time zone, ISO-8601 with offset
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts RFC 3339 timestamps, or local date-times without an offset
fn parse_time(input: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Some(time);
    }
    LOCAL_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(input, format)
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|local| local.fixed_offset())
    })
}

#[derive(Debug, Default)]
pub struct DateTimeTools;

impl DateTimeTools {
    pub fn new() -> Self {
        Self
    }

    pub fn definitions(self: &Arc<Self>) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "getCurrentDateTime",
                "Get the current date and time in the user's time zone.",
                bind(self, |tools, args| async move { tools.get_current_date_time(args) }),
            ),
            ToolDefinition::new(
                "setAlarm",
                "Set an alarm for the given time.",
                bind(self, |tools, args| async move { tools.set_alarm(args) }),
            )
            .with_param(ToolParameter::required(
                "time",
                ParamType::String,
                "Alarm time in ISO-8601 format, e.g. 2025-05-01T07:30:00",
            )),
        ]
    }

    pub fn get_current_date_time(&self, _args: ToolArgs) -> ToolResult<String> {
        Ok(now_timestamp())
    }

    pub fn set_alarm(&self, args: ToolArgs) -> ToolResult<String> {
        let time = args.str("time")?.trim();
        let alarm = parse_time(time).ok_or_else(|| {
            ToolError::invalid_argument(format!(
                "Parameter 'time' must be an ISO-8601 date-time, got '{}'",
                time
            ))
        })?;

        Ok(format!(
            "Current time: {}\nAlarm time: {}\n",
            now_timestamp(),
            alarm.format(TIMESTAMP_FORMAT)
        ))
    }
}
