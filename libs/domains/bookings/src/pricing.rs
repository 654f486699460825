use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::models::{PriceRule, Property};
use crate::property::PropertyRepository;

/// Nights between check-in and check-out
pub fn nights(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(0)
}

/// Price every night in `[start, end)`.
///
/// A night is charged at the first rule (in slice order) whose inclusive
/// window contains it, or at `base_price` when no rule does.
pub fn price_stay(
    base_price: Decimal,
    rules: &[PriceRule],
    start: NaiveDate,
    end: NaiveDate,
) -> Decimal {
    start
        .iter_days()
        .take_while(|night| *night < end)
        .map(|night| {
            rules
                .iter()
                .find(|rule| rule.covers(night))
                .map_or(base_price, |rule| rule.price)
        })
        .sum()
}

/// Computes stay totals from a property's base rate and its price rules
pub struct PricingEngine<P: PropertyRepository> {
    properties: Arc<P>,
}

impl<P: PropertyRepository> Clone for PricingEngine<P> {
    fn clone(&self) -> Self {
        Self {
            properties: Arc::clone(&self.properties),
        }
    }
}

impl<P: PropertyRepository> PricingEngine<P> {
    pub fn new(properties: Arc<P>) -> Self {
        Self { properties }
    }

    /// Total cost of a stay at the given property
    #[instrument(skip(self))]
    pub async fn calculate_total_price(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<Decimal> {
        let property = self
            .properties
            .find_by_id(property_id)
            .await?
            .ok_or(BookingError::PropertyNotFound(property_id))?;

        self.price_for(&property, start, end).await
    }

    /// Total cost of a stay for an already loaded property
    pub async fn price_for(
        &self,
        property: &Property,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<Decimal> {
        let rules = self
            .properties
            .find_price_rules(property.id, start, end)
            .await?;

        let total = price_stay(property.base_price, &rules, start, end);
        tracing::debug!(
            property_id = %property.id,
            nights = nights(start, end),
            rules = rules.len(),
            total = %total,
            "Priced stay"
        );
        Ok(total)
    }
}
