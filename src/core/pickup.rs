use crate::domain::model::BusinessHour;
use chrono::NaiveTime;
use serde::Serialize;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A human-readable recurring opening range, e.g. `Mon to Fri, 9:00 AM - 6:00 PM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedBusinessHour {
    pub days: String,
    pub hours: String,
}

/// Collapses a pickup point's raw weekly schedule into display ranges:
/// consecutive days sharing identical opening hours merge into one entry.
pub fn format_business_hours(hours: &[BusinessHour]) -> Vec<FormattedBusinessHour> {
    let mut week: Vec<&BusinessHour> = hours.iter().filter(|h| h.day_of_week < 7).collect();
    week.sort_by_key(|h| h.day_of_week);

    let mut formatted: Vec<FormattedBusinessHour> = Vec::new();
    let mut run: Option<(u8, u8, NaiveTime, NaiveTime)> = None;

    for hour in week {
        run = match run {
            Some((start, end, opening, closing))
                if hour.day_of_week == end + 1
                    && hour.opening_time == opening
                    && hour.closing_time == closing =>
            {
                Some((start, hour.day_of_week, opening, closing))
            }
            Some(group) => {
                formatted.push(format_group(group));
                Some((
                    hour.day_of_week,
                    hour.day_of_week,
                    hour.opening_time,
                    hour.closing_time,
                ))
            }
            None => Some((
                hour.day_of_week,
                hour.day_of_week,
                hour.opening_time,
                hour.closing_time,
            )),
        };
    }

    if let Some(group) = run {
        formatted.push(format_group(group));
    }

    formatted
}

fn format_group((start, end, opening, closing): (u8, u8, NaiveTime, NaiveTime)) -> FormattedBusinessHour {
    let days = if start == end {
        DAY_NAMES[start as usize].to_string()
    } else {
        format!("{} to {}", DAY_NAMES[start as usize], DAY_NAMES[end as usize])
    };

    FormattedBusinessHour {
        days,
        hours: format!("{} - {}", format_time(opening), format_time(closing)),
    }
}

fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}
