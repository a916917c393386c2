//! Aggregations shown on the admin dashboard and the barista board.

use crate::types::{BookingStatus, Money, OrderStatus};

/// Headline numbers on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    /// Sum of completed order totals.
    pub revenue: Money,
    pub total_items: usize,
    pub total_users: u64,
    pub pending_orders: usize,
}

impl DashboardStats {
    /// Build the stats from `(status, total)` pairs of every order.
    pub fn from_orders<I>(orders: I, total_items: usize, total_users: u64) -> Self
    where
        I: IntoIterator<Item = (OrderStatus, Money)>,
    {
        let (revenue, pending_orders) = orders.into_iter().fold(
            (Money::ZERO, 0_usize),
            |(revenue, pending), (status, total)| match status {
                OrderStatus::Completed => (revenue + total, pending),
                OrderStatus::Pending => (revenue, pending + 1),
                OrderStatus::Processing | OrderStatus::Cancelled => (revenue, pending),
            },
        );

        Self {
            revenue,
            total_items,
            total_users,
            pending_orders,
        }
    }
}

/// Per-status booking counters on the admin bookings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookingCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
}

impl BookingCounts {
    #[must_use]
    pub const fn count(&self, status: &BookingStatus) -> usize {
        match status {
            BookingStatus::Pending => self.pending,
            BookingStatus::Confirmed => self.confirmed,
            BookingStatus::Cancelled => self.cancelled,
        }
    }
}

impl FromIterator<BookingStatus> for BookingCounts {
    fn from_iter<I: IntoIterator<Item = BookingStatus>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut counts, status| {
            match status {
                BookingStatus::Pending => counts.pending += 1,
                BookingStatus::Confirmed => counts.confirmed += 1,
                BookingStatus::Cancelled => counts.cancelled += 1,
            }
            counts
        })
    }
}

/// Whether the barista board should announce a new order.
///
/// The board remembers how many active orders it last showed. The very first
/// load (nothing shown yet) never announces.
#[must_use]
pub const fn new_order_arrived(previously_shown: usize, active_now: usize) -> bool {
    previously_shown != 0 && active_now > previously_shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revenue_counts_completed_orders_only() {
        let orders = vec![
            (OrderStatus::Completed, Money::from_rupees(1_200)),
            (OrderStatus::Pending, Money::from_rupees(800)),
            (OrderStatus::Cancelled, Money::from_rupees(5_000)),
            (OrderStatus::Completed, Money::from_rupees(300)),
            (OrderStatus::Pending, Money::from_rupees(100)),
            (OrderStatus::Processing, Money::from_rupees(700)),
        ];

        let stats = DashboardStats::from_orders(orders, 12, 40);
        assert_eq!(stats.revenue, Money::from_rupees(1_500));
        assert_eq!(stats.pending_orders, 2);
        assert_eq!(stats.total_items, 12);
        assert_eq!(stats.total_users, 40);
    }

    #[test]
    fn test_booking_counts() {
        let counts: BookingCounts = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
        ]
        .into_iter()
        .collect();

        assert_eq!(
            counts,
            BookingCounts {
                pending: 2,
                confirmed: 1,
                cancelled: 1
            }
        );
        assert_eq!(counts.count(&BookingStatus::Pending), 2);
    }

    #[test]
    fn test_new_order_detection() {
        assert!(!new_order_arrived(0, 3));
        assert!(new_order_arrived(2, 3));
        assert!(!new_order_arrived(3, 3));
        assert!(!new_order_arrived(3, 1));
    }
}
