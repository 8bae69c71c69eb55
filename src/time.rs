use std::fmt;

use serde::Deserialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

/// The day an episode was published.
///
/// Upstream sends an ISO-8601 date or date-time; only the calendar date
/// survives, and it displays as `d MMM yy` (`8 Jan 21`).
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct PublishedAt(Date);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid publication date {0:?}")]
pub struct ParseError(String);

impl PublishedAt {
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let s = s.trim();

        let date = PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
        .or_else(|_| {
            PrimitiveDateTime::parse(
                s,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            )
        })
        .map(|dt| dt.date())
        .or_else(|_| OffsetDateTime::parse(s, &Rfc3339).map(|dt| dt.date()))
        .or_else(|_| Date::parse(s, format_description!("[year]-[month]-[day]")))
        .map_err(|_| ParseError(s.to_string()))?;

        Ok(Self(date))
    }
}

#[cfg(test)]
impl From<Date> for PublishedAt {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl TryFrom<String> for PublishedAt {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl fmt::Display for PublishedAt {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(format_description!(
                "[day padding:none] [month repr:short] [year repr:last_two]"
            ))
            .ok();

        match formatted {
            Some(s) => write!(fmt, "{}", s),
            None => write!(fmt, "{}", self.0),
        }
    }
}
