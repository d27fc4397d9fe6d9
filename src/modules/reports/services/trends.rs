use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::aggregation::overflow;
use crate::core::scalars::money;
use crate::core::Result;
use crate::modules::marketplace::{Booking, EntityKind, Rating};
use crate::modules::reports::models::{DateRange, GroupBy, TrendPoint};

fn points<V>(buckets: BTreeMap<NaiveDate, V>, group_by: GroupBy, value: impl Fn(V) -> Decimal) -> Vec<TrendPoint> {
    buckets
        .into_iter()
        .map(|(date, bucket)| TrendPoint {
            date,
            value: value(bucket),
            label: group_by.label(date),
        })
        .collect()
}

/// Booking totals summed per bucket, ascending by date.
/// Undated bookings cannot be placed and are left out.
pub fn sales_trend<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    range: DateRange,
    group_by: GroupBy,
) -> Result<Vec<TrendPoint>> {
    let mut buckets: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for booking in bookings {
        let Some(date) = booking.date else {
            continue;
        };
        if !range.admits(Some(date)) {
            continue;
        }
        let key = group_by.bucket_key(date);
        let bucket = buckets.entry(key).or_default();
        *bucket = bucket
            .checked_add(booking.total_estimated)
            .ok_or_else(|| overflow(EntityKind::Booking, format!("sales on {}", key)))?;
    }

    Ok(points(buckets, group_by, money))
}

/// Mean score per bucket, ascending by date
pub fn satisfaction_trend<'a>(
    ratings: impl IntoIterator<Item = &'a Rating>,
    range: DateRange,
    group_by: GroupBy,
) -> Result<Vec<TrendPoint>> {
    let mut buckets: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();

    for rating in ratings {
        let Some(date) = rating.date else {
            continue;
        };
        if !range.admits(Some(date)) {
            continue;
        }
        let key = group_by.bucket_key(date);
        let bucket = buckets.entry(key).or_default();
        bucket.0 = bucket
            .0
            .checked_add(rating.score)
            .ok_or_else(|| overflow(EntityKind::Rating, format!("score sum on {}", key)))?;
        bucket.1 += 1;
    }

    Ok(points(buckets, group_by, |(sum, count)| {
        Decimal::from(sum) / Decimal::from(count)
    }))
}
