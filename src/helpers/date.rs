//! Date helper functions

use chrono::NaiveDateTime;

use crate::content::parse_date_string;

/// Display style for post dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// "January 5, 2024"
    Long,
    /// "Jan 5, 2024"
    Short,
}

impl DateStyle {
    pub fn from_name(name: &str) -> Self {
        match name {
            "short" => DateStyle::Short,
            _ => DateStyle::Long,
        }
    }

    fn chrono_format(self) -> &'static str {
        match self {
            DateStyle::Long => "%B %-d, %Y",
            DateStyle::Short => "%b %-d, %Y",
        }
    }
}

/// Format a parsed date in the given style
pub fn format_date(date: &NaiveDateTime, style: DateStyle) -> String {
    date.format(style.chrono_format()).to_string()
}

/// Format a front-matter date string, passing unreadable input through
pub fn display_date(raw: &str, style: DateStyle) -> String {
    match parse_date_string(raw) {
        Some(date) => format_date(&date, style),
        None => raw.to_string(),
    }
}
