use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use marketplace_gateway::core::scalars::money;
use marketplace_gateway::modules::marketplace::{Booking, BookingLineItem, EntityId, Rating, Reference, Service};
use marketplace_gateway::modules::reports::services::aggregation::{
    average, booking_totals, line_item_revenue, satisfaction_reports, QuantityRule, SalesAccumulator,
};

/// Property-based tests for the aggregation folds
///
/// Validates:
/// - total sales is the literal sum of booking totals, in any order
/// - quantities are conserved between line items and per-service buckets
/// - average × count reproduces the total
/// - satisfaction distribution percentages sum to 100

fn booking(id: usize, cents: u64) -> Booking {
    Booking {
        id: EntityId::from(id as i64),
        client: None,
        date: None,
        time: None,
        status: None,
        total_estimated: Decimal::new(cents as i64, 2),
        line_items: Vec::new(),
    }
}

fn item(service: i64, quantity: i64) -> BookingLineItem {
    BookingLineItem {
        id: None,
        booking: None,
        service: Some(Reference::Unresolved(EntityId::from(service))),
        quantity: Some(quantity),
        unit_price: dec!(1.50),
        subtotal: Decimal::ZERO,
    }
}

fn rating(id: usize, service: i64, score: i64) -> Rating {
    Rating {
        id: EntityId::from(id as i64),
        client: None,
        service: Some(Reference::Unresolved(EntityId::from(service))),
        score,
        comment: None,
        date: None,
    }
}

#[cfg(test)]
mod aggregation_property_tests {
    use super::*;

    proptest! {
        #[test]
        fn test_total_sales_is_order_independent(
            totals in prop::collection::vec(0u64..10_000_000u64, 0..50)
        ) {
            let bookings: Vec<Booking> = totals.iter().enumerate().map(|(i, c)| booking(i, *c)).collect();
            let mut reversed = bookings.clone();
            reversed.reverse();

            let literal: Decimal = totals.iter().map(|c| Decimal::new(*c as i64, 2)).sum();
            let (forward, count) = booking_totals(&bookings).unwrap();
            let (backward, _) = booking_totals(&reversed).unwrap();

            prop_assert_eq!(forward, literal);
            prop_assert_eq!(backward, literal);
            prop_assert_eq!(count, bookings.len() as i64);
        }

        #[test]
        fn test_quantity_is_conserved(
            lines in prop::collection::vec((1i64..6, 0i64..20), 0..60)
        ) {
            let items: Vec<BookingLineItem> = lines.iter().map(|(s, q)| item(*s, *q)).collect();
            let mut accumulator = SalesAccumulator::new();
            accumulator.add_items(&items, &HashMap::new(), QuantityRule::AsGiven, |_| true).unwrap();

            let expected: i64 = lines.iter().map(|(_, q)| q).sum();
            prop_assert_eq!(accumulator.total_quantity(), Some(expected));

            let buckets = accumulator.into_buckets();
            let summed: i64 = buckets.iter().map(|b| b.quantity_sold).sum();
            prop_assert_eq!(summed, expected);
        }

        #[test]
        fn test_average_times_count_reproduces_total(
            totals in prop::collection::vec(1u64..10_000_000u64, 1..50)
        ) {
            let bookings: Vec<Booking> = totals.iter().enumerate().map(|(i, c)| booking(i, *c)).collect();
            let (total, count) = booking_totals(&bookings).unwrap();

            let exact = average(total, count) * Decimal::from(count);
            prop_assert!((exact - total).abs() < dec!(0.01));

            // Rounding the average loses at most half a cent per booking
            let rounded = money(average(total, count)) * Decimal::from(count);
            prop_assert!((rounded - total).abs() <= dec!(0.005) * Decimal::from(count));
        }

        #[test]
        fn test_distribution_percentages_sum_to_100(
            scores in prop::collection::vec(1i64..=5, 1..40)
        ) {
            let ratings: Vec<Rating> = scores.iter().enumerate().map(|(i, s)| rating(i, 9, *s)).collect();
            let reports = satisfaction_reports(&ratings, &HashMap::new()).unwrap();

            prop_assert_eq!(reports.len(), 1);
            let report = &reports[0];
            prop_assert_eq!(report.total_ratings, scores.len() as i64);

            let total: f64 = report.distribution.iter().map(|s| s.percentage).sum();
            prop_assert!((total - 100.0).abs() < 1e-9);

            let counted: i64 = report.distribution.iter().map(|s| s.count).sum();
            prop_assert_eq!(counted, report.total_ratings);
            prop_assert!(report.distribution.windows(2).all(|w| w[0].score < w[1].score));
        }
    }

    #[test]
    fn test_no_ratings_no_entries() {
        let reports = satisfaction_reports(&Vec::<Rating>::new(), &HashMap::new()).unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn test_service_price_fallback_revenue() {
        let mut service = Service::stub(EntityId::from(4));
        service.name = "Limpieza".to_string();
        service.price = dec!(9.99);

        let bare = BookingLineItem {
            id: None,
            booking: None,
            service: Some(Reference::Unresolved(EntityId::from(4))),
            quantity: Some(2),
            unit_price: Decimal::ZERO,
            subtotal: Decimal::ZERO,
        };

        assert_eq!(line_item_revenue(&bare, 2, Some(&service)).unwrap(), dec!(19.98));
    }

    #[test]
    fn test_quantity_defaults_only_on_fallback_path() {
        let mut absent = item(1, 0);
        absent.quantity = None;

        assert_eq!(QuantityRule::AsGiven.quantity(&absent), 0);
        assert_eq!(QuantityRule::DefaultToOne.quantity(&absent), 1);
        assert_eq!(QuantityRule::DefaultToOne.quantity(&item(1, 0)), 1);
        assert_eq!(QuantityRule::DefaultToOne.quantity(&item(1, 4)), 4);
    }
}
