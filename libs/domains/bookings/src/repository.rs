use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::availability::ranges_overlap;
use crate::error::{BookingError, BookingResult};
use crate::kpi::{Period, StatusCounts};
use crate::models::{Booking, BookingFilter, BookingStatus, NewBooking};
use crate::pagination::KeysetQuery;

/// Repository trait for Booking persistence
///
/// Writes are plain inserts and read-modify-write updates; there is no
/// transaction spanning an availability check and the insert that follows it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist a new pending booking
    async fn create(&self, input: NewBooking) -> BookingResult<Booking>;

    /// Get a booking by ID
    async fn get_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>>;

    /// Write a new status and refresh `updated_at`
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking>;

    /// Whether any date-holding booking of the property overlaps `[start, end]`
    async fn has_bookings_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool>;

    /// Fetch up to `query.fetch_limit()` rows in query order
    async fn find_page(&self, filter: BookingFilter, query: KeysetQuery)
    -> BookingResult<Vec<Booking>>;

    /// Count rows matching the filter
    async fn count(&self, filter: BookingFilter) -> BookingResult<u64>;

    /// Bookings per status for the given properties, optionally within a creation period
    async fn count_by_status(
        &self,
        property_ids: Vec<Uuid>,
        period: Option<Period>,
    ) -> BookingResult<StatusCounts>;

    /// Sum of `total_price` over confirmed bookings created within the period
    async fn confirmed_revenue(
        &self,
        property_ids: Vec<Uuid>,
        period: Period,
    ) -> BookingResult<Decimal>;
}

/// In-memory implementation of BookingRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a booking as-is (seeding fixtures with chosen status/timestamps)
    pub async fn insert(&self, booking: Booking) {
        self.bookings.write().await.insert(booking.id, booking);
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, input: NewBooking) -> BookingResult<Booking> {
        let mut bookings = self.bookings.write().await;

        if bookings
            .values()
            .any(|b| b.confirmation_code == input.confirmation_code)
        {
            return Err(BookingError::Database(format!(
                "confirmation code {} already in use",
                input.confirmation_code
            )));
        }

        let booking = Booking::new(input);
        bookings.insert(booking.id, booking.clone());

        tracing::debug!(booking_id = %booking.id, "Stored booking");
        Ok(booking)
    }

    async fn get_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id).cloned())
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or(BookingError::NotFound(id))?;

        booking.set_status(status);

        tracing::debug!(booking_id = %id, status = %status, "Updated booking status");
        Ok(booking.clone())
    }

    async fn has_bookings_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        let bookings = self.bookings.read().await;
        Ok(bookings.values().any(|b| {
            b.property_id == property_id
                && b.status.holds_dates()
                && ranges_overlap(b.start_date, b.end_date, start, end)
        }))
    }

    async fn find_page(
        &self,
        filter: BookingFilter,
        query: KeysetQuery,
    ) -> BookingResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(query.apply(bookings.values().filter(|b| filter.matches(b)).cloned()))
    }

    async fn count(&self, filter: BookingFilter) -> BookingResult<u64> {
        let bookings = self.bookings.read().await;
        Ok(bookings.values().filter(|b| filter.matches(b)).count() as u64)
    }

    async fn count_by_status(
        &self,
        property_ids: Vec<Uuid>,
        period: Option<Period>,
    ) -> BookingResult<StatusCounts> {
        let bookings = self.bookings.read().await;
        let mut counts = StatusCounts::default();

        bookings
            .values()
            .filter(|b| property_ids.contains(&b.property_id))
            .filter(|b| period.is_none_or(|p| p.contains(b.created_at)))
            .for_each(|b| counts.record(b.status, 1));

        Ok(counts)
    }

    async fn confirmed_revenue(
        &self,
        property_ids: Vec<Uuid>,
        period: Period,
    ) -> BookingResult<Decimal> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .filter(|b| property_ids.contains(&b.property_id))
            .filter(|b| b.status == BookingStatus::Confirmed && period.contains(b.created_at))
            .map(|b| b.total_price)
            .sum())
    }
}
