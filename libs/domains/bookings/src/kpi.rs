//! Per-organization booking rollups.
//!
//! Every figure is scoped to the bookings of the organization's properties and
//! bucketed by the booking's `created_at`. Calendar periods are half-open UTC
//! ranges, so a month runs from its first day at midnight up to, but not
//! including, the first day of the next month.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::models::BookingStatus;
use crate::property::PropertyRepository;
use crate::repository::BookingRepository;

/// Half-open creation-time window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Calendar month that contains `date`
    pub fn month_containing(date: NaiveDate) -> Option<Self> {
        let first = date.with_day(1)?;
        let next = first.checked_add_months(Months::new(1))?;
        Some(Self::new(midnight(first), midnight(next)))
    }

    /// Calendar month before the one that contains `date`
    pub fn previous_month(date: NaiveDate) -> Option<Self> {
        let first = date.with_day(1)?;
        let previous = first.checked_sub_months(Months::new(1))?;
        Some(Self::new(midnight(previous), midnight(first)))
    }

    /// From January 1st of `now`'s year through `now`, inclusive
    ///
    /// Creation times are stored at microsecond precision, so the exclusive
    /// end sits one microsecond past `now`.
    pub fn year_to_date(now: DateTime<Utc>) -> Option<Self> {
        let jan_first = NaiveDate::from_ymd_opt(now.year(), 1, 1)?;
        let end = now.checked_add_signed(TimeDelta::microseconds(1))?;
        Some(Self::new(midnight(jan_first), end))
    }
}

/// Booking counts per lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub confirmed: u64,
    pub cancelled: u64,
    pub pending: u64,
    pub rejected: u64,
}

impl StatusCounts {
    pub fn record(&mut self, status: BookingStatus, n: u64) {
        match status {
            BookingStatus::Confirmed => self.confirmed += n,
            BookingStatus::Cancelled => self.cancelled += n,
            BookingStatus::Pending => self.pending += n,
            BookingStatus::Rejected => self.rejected += n,
        }
    }

    pub fn total(&self) -> u64 {
        self.confirmed + self.cancelled + self.pending + self.rejected
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingKpis {
    pub current_month: StatusCounts,
    pub previous_month: StatusCounts,
    pub lifetime: StatusCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueKpis {
    pub current_month: Decimal,
    pub previous_month: Decimal,
    pub year_to_date: Decimal,
    /// Month-over-month change in percent
    pub revenue_growth: Decimal,
}

/// Percent change from `previous` to `current`.
///
/// With nothing to compare against, any revenue counts as 100% growth and
/// no revenue as none.
pub fn revenue_growth(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    (current - previous) / previous * Decimal::ONE_HUNDRED
}

fn period_error(now: DateTime<Utc>) -> BookingError {
    BookingError::Internal(format!("No calendar period around {now}"))
}

/// Read-only aggregation over the booking store
pub struct KpiService<B: BookingRepository, P: PropertyRepository> {
    bookings: Arc<B>,
    properties: Arc<P>,
}

impl<B: BookingRepository, P: PropertyRepository> Clone for KpiService<B, P> {
    fn clone(&self) -> Self {
        Self {
            bookings: Arc::clone(&self.bookings),
            properties: Arc::clone(&self.properties),
        }
    }
}

impl<B: BookingRepository, P: PropertyRepository> KpiService<B, P> {
    pub fn new(bookings: Arc<B>, properties: Arc<P>) -> Self {
        Self {
            bookings,
            properties,
        }
    }

    pub async fn kpis_by_organization(&self, organization_id: Uuid) -> BookingResult<BookingKpis> {
        self.kpis_by_organization_at(organization_id, Utc::now())
            .await
    }

    /// Status counts for the month of `now`, the month before, and all time
    #[instrument(skip(self))]
    pub async fn kpis_by_organization_at(
        &self,
        organization_id: Uuid,
        now: DateTime<Utc>,
    ) -> BookingResult<BookingKpis> {
        let property_ids = self
            .properties
            .list_ids_by_organization(organization_id)
            .await?;
        if property_ids.is_empty() {
            return Ok(BookingKpis::default());
        }

        let today = now.date_naive();
        let current = Period::month_containing(today).ok_or_else(|| period_error(now))?;
        let previous = Period::previous_month(today).ok_or_else(|| period_error(now))?;

        let (current_month, previous_month, lifetime) = tokio::try_join!(
            self.bookings
                .count_by_status(property_ids.clone(), Some(current)),
            self.bookings
                .count_by_status(property_ids.clone(), Some(previous)),
            self.bookings.count_by_status(property_ids, None),
        )?;

        tracing::debug!(
            organization_id = %organization_id,
            lifetime = lifetime.total(),
            "Computed booking KPIs"
        );

        Ok(BookingKpis {
            current_month,
            previous_month,
            lifetime,
        })
    }

    pub async fn revenue_kpis_by_organization(
        &self,
        organization_id: Uuid,
    ) -> BookingResult<RevenueKpis> {
        self.revenue_kpis_by_organization_at(organization_id, Utc::now())
            .await
    }

    /// Confirmed revenue for the month of `now`, the month before, and the year to date
    #[instrument(skip(self))]
    pub async fn revenue_kpis_by_organization_at(
        &self,
        organization_id: Uuid,
        now: DateTime<Utc>,
    ) -> BookingResult<RevenueKpis> {
        let property_ids = self
            .properties
            .list_ids_by_organization(organization_id)
            .await?;
        if property_ids.is_empty() {
            return Ok(RevenueKpis::default());
        }

        let today = now.date_naive();
        let current = Period::month_containing(today).ok_or_else(|| period_error(now))?;
        let previous = Period::previous_month(today).ok_or_else(|| period_error(now))?;
        let year = Period::year_to_date(now).ok_or_else(|| period_error(now))?;

        let (current_month, previous_month, year_to_date) = tokio::try_join!(
            self.bookings
                .confirmed_revenue(property_ids.clone(), current),
            self.bookings
                .confirmed_revenue(property_ids.clone(), previous),
            self.bookings.confirmed_revenue(property_ids, year),
        )?;

        Ok(RevenueKpis {
            current_month,
            previous_month,
            year_to_date,
            revenue_growth: revenue_growth(current_month, previous_month),
        })
    }
}
