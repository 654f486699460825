use chrono::NaiveDate;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::BookingResult;
use crate::property::PropertyRepository;
use crate::repository::BookingRepository;

/// Inclusive interval overlap: `[a_start, a_end]` meets `[b_start, b_end]`
///
/// Both ends are inclusive, so a stay checking in on another stay's
/// check-out date counts as a conflict.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Read-only date conflict queries for a property
pub struct AvailabilityChecker<B: BookingRepository, P: PropertyRepository> {
    bookings: Arc<B>,
    properties: Arc<P>,
}

impl<B: BookingRepository, P: PropertyRepository> Clone for AvailabilityChecker<B, P> {
    fn clone(&self) -> Self {
        Self {
            bookings: Arc::clone(&self.bookings),
            properties: Arc::clone(&self.properties),
        }
    }
}

impl<B: BookingRepository, P: PropertyRepository> AvailabilityChecker<B, P> {
    pub fn new(bookings: Arc<B>, properties: Arc<P>) -> Self {
        Self {
            bookings,
            properties,
        }
    }

    /// True if a booking that still holds its dates overlaps `[start, end]`
    #[instrument(skip(self))]
    pub async fn has_bookings_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        self.bookings
            .has_bookings_in_range(property_id, start, end)
            .await
    }

    /// True if a blackout window overlaps `[start, end]`
    #[instrument(skip(self))]
    pub async fn has_blocked_dates_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        self.properties
            .has_blocked_dates_in_range(property_id, start, end)
            .await
    }

    /// Neither a reservation nor a blackout window touches the range
    pub async fn is_available(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        if self.has_bookings_in_range(property_id, start, end).await? {
            return Ok(false);
        }
        Ok(!self
            .has_blocked_dates_in_range(property_id, start, end)
            .await?)
    }
}
