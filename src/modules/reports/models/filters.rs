use chrono::{Datelike, Duration, NaiveDate};
use std::str::FromStr;

use crate::core::scalars::format_date;
use crate::core::{AppError, Result};
use crate::modules::marketplace::models::{BookingFilter, ServiceFilter};
use crate::modules::marketplace::{Booking, EntityId};

/// Inclusive calendar range; either bound may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_bounded(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppError::validation(format!(
                    "fechaDesde ({}) must be before or equal to fechaHasta ({})",
                    from, to
                )));
            }
        }
        Ok(())
    }

    /// Undated records only fall inside an unbounded range
    pub fn admits(&self, date: Option<NaiveDate>) -> bool {
        if !self.is_bounded() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    pub fn label(&self) -> String {
        match (self.from, self.to) {
            (Some(from), Some(to)) => format!("{} to {}", format_date(from), format_date(to)),
            (Some(from), None) => format!("from {}", format_date(from)),
            (None, Some(to)) => format!("until {}", format_date(to)),
            (None, None) => "all time".to_string(),
        }
    }
}

/// Filter accepted by the sales, satisfaction, provider and client reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub range: DateRange,
    pub category_id: Option<EntityId>,
    pub provider_id: Option<EntityId>,
    pub city: Option<String>,
    pub booking_status: Option<String>,
}

impl ReportFilter {
    pub fn validate(&self) -> Result<()> {
        self.range.validate()
    }

    pub fn period_label(&self) -> String {
        self.range.label()
    }

    /// Upstream parameters for the bookings collection
    pub fn booking_filter(&self) -> BookingFilter {
        BookingFilter {
            client_id: None,
            status: self.booking_status.clone(),
            date_from: self.range.from,
            date_to: self.range.to,
        }
    }

    /// Upstream parameters for the services collection
    pub fn service_filter(&self) -> ServiceFilter {
        ServiceFilter {
            category_id: self.category_id.clone(),
            provider_id: self.provider_id.clone(),
            city: self.city.clone(),
            ..Default::default()
        }
    }

    /// Client-side check, applied whether or not the upstream honored the filter
    pub fn admits_booking(&self, booking: &Booking) -> bool {
        if !self.range.admits(booking.date) {
            return false;
        }
        match &self.booking_status {
            Some(status) => booking.has_status(status),
            None => true,
        }
    }

    pub fn restricts_bookings(&self) -> bool {
        self.range.is_bounded() || self.booking_status.is_some()
    }
}

/// Trend bucket width
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

impl FromStr for GroupBy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DIA" | "DAY" => Ok(GroupBy::Day),
            "SEMANA" | "WEEK" => Ok(GroupBy::Week),
            "MES" | "MONTH" => Ok(GroupBy::Month),
            other => Err(AppError::validation(format!(
                "Invalid agruparPor '{}' (expected DIA, SEMANA or MES)",
                other
            ))),
        }
    }
}

impl GroupBy {
    /// First calendar day of the bucket containing `date`
    pub fn bucket_key(&self, date: NaiveDate) -> NaiveDate {
        match self {
            GroupBy::Day => date,
            GroupBy::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            GroupBy::Month => date.with_day(1).unwrap_or(date),
        }
    }

    pub fn label(&self, key: NaiveDate) -> String {
        match self {
            GroupBy::Day => key.format("%a %d %b %Y").to_string(),
            GroupBy::Week => format!("Week of {}", key.format("%d %b %Y")),
            GroupBy::Month => key.format("%B %Y").to_string(),
        }
    }
}

/// Filter accepted by the metrics and trend endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsFilter {
    pub range: DateRange,
    pub group_by: GroupBy,
}

impl MetricsFilter {
    pub fn validate(&self) -> Result<()> {
        self.range.validate()
    }

    pub fn booking_filter(&self) -> BookingFilter {
        BookingFilter {
            date_from: self.range.from,
            date_to: self.range.to,
            ..Default::default()
        }
    }
}
