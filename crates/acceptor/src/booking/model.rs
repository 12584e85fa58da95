//! Booking payloads and the conversions from Gherkin table rows.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::result::{AcceptorError, AcceptorResult};

/// Date formats accepted in feature tables, tried in order
const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Check-in and check-out dates (`YYYY-MM-DD`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDates {
    pub checkin: String,
    pub checkout: String,
}

/// A hotel booking as sent to and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub firstname: String,
    pub lastname: String,
    pub totalprice: i64,
    pub depositpaid: bool,
    pub bookingdates: BookingDates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additionalneeds: Option<String>,
}

/// Response to a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedBooking {
    pub bookingid: u64,
    pub booking: Booking,
}

/// Entry of the booking id listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingId {
    pub bookingid: u64,
}

/// Optional dates for a partial update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDatesPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<String>,
}

/// Fields of a partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totalprice: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depositpaid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookingdates: Option<BookingDatesPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additionalneeds: Option<String>,
}

impl BookingPatch {
    /// Whether the patch changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the present fields to `booking`
    pub fn apply(&self, booking: &mut Booking) {
        if let Some(ref firstname) = self.firstname {
            booking.firstname.clone_from(firstname);
        }
        if let Some(ref lastname) = self.lastname {
            booking.lastname.clone_from(lastname);
        }
        if let Some(totalprice) = self.totalprice {
            booking.totalprice = totalprice;
        }
        if let Some(depositpaid) = self.depositpaid {
            booking.depositpaid = depositpaid;
        }
        if let Some(ref dates) = self.bookingdates {
            if let Some(ref checkin) = dates.checkin {
                booking.bookingdates.checkin.clone_from(checkin);
            }
            if let Some(ref checkout) = dates.checkout {
                booking.bookingdates.checkout.clone_from(checkout);
            }
        }
        if let Some(ref needs) = self.additionalneeds {
            booking.additionalneeds = Some(needs.clone());
        }
    }

    /// Build a patch from the columns present in a table row
    pub fn from_row(row: &HashMap<String, String>) -> AcceptorResult<Self> {
        let mut patch = Self {
            firstname: row.get("firstname").cloned(),
            lastname: row.get("lastname").cloned(),
            ..Self::default()
        };
        if let Some(price) = row.get("totalprice") {
            patch.totalprice = Some(parse_price(price)?);
        }
        if let Some(paid) = row.get("depositpaid") {
            patch.depositpaid = Some(parse_bool("depositpaid", paid)?);
        }
        let checkin = row.get("checkin").map(|d| normalize_date(d)).transpose()?;
        let checkout = row.get("checkout").map(|d| normalize_date(d)).transpose()?;
        if checkin.is_some() || checkout.is_some() {
            patch.bookingdates = Some(BookingDatesPatch { checkin, checkout });
        }
        patch.additionalneeds = row
            .get("additionalneeds")
            .and_then(|needs| parse_needs(needs));
        Ok(patch)
    }
}

impl Booking {
    /// Build a booking from a table row.
    ///
    /// Required columns: `firstname`, `lastname`, `totalprice`,
    /// `depositpaid`, `checkin`, `checkout`. `additionalneeds` is optional
    /// and the text `None` means absent.
    pub fn from_row(row: &HashMap<String, String>) -> AcceptorResult<Self> {
        let column = |name: &str| {
            row.get(name)
                .map(String::as_str)
                .ok_or_else(|| AcceptorError::missing(format!("table column '{name}'")))
        };
        Ok(Self {
            firstname: column("firstname")?.to_string(),
            lastname: column("lastname")?.to_string(),
            totalprice: parse_price(column("totalprice")?)?,
            depositpaid: parse_bool("depositpaid", column("depositpaid")?)?,
            bookingdates: BookingDates {
                checkin: normalize_date(column("checkin")?)?,
                checkout: normalize_date(column("checkout")?)?,
            },
            additionalneeds: row.get("additionalneeds").and_then(|n| parse_needs(n)),
        })
    }
}

/// Normalize a free-form date to `YYYY-MM-DD`
pub fn normalize_date(input: &str) -> AcceptorResult<String> {
    let text = input.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| AcceptorError::invalid("date", input))?;
    Ok(date.format("%Y-%m-%d").to_string())
}

fn parse_price(value: &str) -> AcceptorResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| AcceptorError::invalid("totalprice", value))
}

fn parse_bool(field: &str, value: &str) -> AcceptorResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(AcceptorError::invalid(field, value)),
    }
}

fn parse_needs(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "None" {
        None
    } else {
        Some(value.to_string())
    }
}
