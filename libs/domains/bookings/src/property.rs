use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::availability::ranges_overlap;
use crate::error::BookingResult;
use crate::models::{BlockedDate, PriceRule, Property};

/// Read access to the property catalog: properties, price rules, blackout windows
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Get a property by ID
    async fn find_by_id(&self, id: Uuid) -> BookingResult<Option<Property>>;

    /// Price rules whose inclusive window overlaps `[start, end]`, in resolution order
    async fn find_price_rules(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<Vec<PriceRule>>;

    /// Whether any blackout window of the property overlaps `[start, end]`
    async fn has_blocked_dates_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool>;

    /// IDs of the properties managed by an organization
    async fn list_ids_by_organization(&self, organization_id: Uuid) -> BookingResult<Vec<Uuid>>;
}

#[derive(Debug, Default)]
struct Catalog {
    properties: HashMap<Uuid, Property>,
    // Insertion order is resolution order
    price_rules: Vec<PriceRule>,
    blocked_dates: Vec<BlockedDate>,
}

/// In-memory implementation of PropertyRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryPropertyRepository {
    catalog: Arc<RwLock<Catalog>>,
}

impl InMemoryPropertyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_property(&self, property: Property) {
        let mut catalog = self.catalog.write().await;
        catalog.properties.insert(property.id, property);
    }

    pub async fn add_price_rule(&self, rule: PriceRule) {
        self.catalog.write().await.price_rules.push(rule);
    }

    pub async fn add_blocked_date(&self, blocked: BlockedDate) {
        self.catalog.write().await.blocked_dates.push(blocked);
    }
}

#[async_trait]
impl PropertyRepository for InMemoryPropertyRepository {
    async fn find_by_id(&self, id: Uuid) -> BookingResult<Option<Property>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.properties.get(&id).cloned())
    }

    async fn find_price_rules(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<Vec<PriceRule>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .price_rules
            .iter()
            .filter(|r| {
                r.property_id == property_id && ranges_overlap(r.start_date, r.end_date, start, end)
            })
            .cloned()
            .collect())
    }

    async fn has_blocked_dates_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        let catalog = self.catalog.read().await;
        Ok(catalog.blocked_dates.iter().any(|b| {
            b.property_id == property_id && ranges_overlap(b.start_date, b.end_date, start, end)
        }))
    }

    async fn list_ids_by_organization(&self, organization_id: Uuid) -> BookingResult<Vec<Uuid>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .properties
            .values()
            .filter(|p| p.organization_id == organization_id)
            .map(|p| p.id)
            .collect())
    }
}
