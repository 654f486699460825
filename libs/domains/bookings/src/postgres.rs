use async_trait::async_trait;
use chrono::NaiveDate;
use core_config::database::DatabaseConfig;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use crate::entity::{blocked_date, booking, price_rule, property};
use crate::error::{BookingError, BookingResult};
use crate::kpi::{Period, StatusCounts};
use crate::models::{
    Booking, BookingFilter, BookingStatus, NewBooking, PriceRule, Property, timestamp_now,
};
use crate::pagination::{Direction, KeysetQuery};
use crate::property::PropertyRepository;
use crate::repository::BookingRepository;

/// Open a connection pool sized from the config
pub async fn connect(config: &DatabaseConfig) -> BookingResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    tracing::info!(max_connections = config.max_connections, "Connected to Postgres");
    Ok(db)
}

fn filtered(filter: &BookingFilter) -> Select<booking::Entity> {
    let mut query = booking::Entity::find();

    if let Some(property_id) = filter.property_id {
        query = query.filter(booking::Column::PropertyId.eq(property_id));
    }
    if let Some(user_id) = filter.user_id {
        query = query.filter(booking::Column::UserId.eq(user_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(booking::Column::Status.eq(status));
    }

    query
}

fn in_period(query: Select<booking::Entity>, period: Period) -> Select<booking::Entity> {
    query
        .filter(booking::Column::CreatedAt.gte(period.start))
        .filter(booking::Column::CreatedAt.lt(period.end))
}

pub struct PgBookingRepository {
    db: DatabaseConnection,
}

impl PgBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create(&self, input: NewBooking) -> BookingResult<Booking> {
        let active_model: booking::ActiveModel = input.into();
        let model = active_model.insert(&self.db).await?;

        tracing::debug!(booking_id = %model.id, "Stored booking");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking> {
        let active_model = booking::ActiveModel {
            id: Set(id),
            status: Set(status),
            updated_at: Set(timestamp_now().into()),
            ..Default::default()
        };

        match active_model.update(&self.db).await {
            Ok(model) => {
                tracing::debug!(booking_id = %id, status = %status, "Updated booking status");
                Ok(model.into())
            }
            Err(DbErr::RecordNotUpdated) => Err(BookingError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn has_bookings_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        let count = booking::Entity::find()
            .filter(booking::Column::PropertyId.eq(property_id))
            .filter(booking::Column::Status.is_not_in(BookingStatus::RELEASED))
            .filter(booking::Column::StartDate.lte(end))
            .filter(booking::Column::EndDate.gte(start))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn find_page(
        &self,
        filter: BookingFilter,
        query: KeysetQuery,
    ) -> BookingResult<Vec<Booking>> {
        let mut select = filtered(&filter);

        if let Some(boundary) = query.boundary {
            let (past_created, past_id) = match query.direction {
                Direction::Forward => (
                    booking::Column::CreatedAt.lt(boundary.created_at),
                    booking::Column::Id.lt(boundary.id),
                ),
                Direction::Backward => (
                    booking::Column::CreatedAt.gt(boundary.created_at),
                    booking::Column::Id.gt(boundary.id),
                ),
            };
            select = select.filter(
                Condition::any().add(past_created).add(
                    Condition::all()
                        .add(booking::Column::CreatedAt.eq(boundary.created_at))
                        .add(past_id),
                ),
            );
        }

        select = match query.direction {
            Direction::Forward => select
                .order_by_desc(booking::Column::CreatedAt)
                .order_by_desc(booking::Column::Id),
            Direction::Backward => select
                .order_by_asc(booking::Column::CreatedAt)
                .order_by_asc(booking::Column::Id),
        };

        let models = select
            .limit(query.fetch_limit())
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: BookingFilter) -> BookingResult<u64> {
        Ok(filtered(&filter).count(&self.db).await?)
    }

    async fn count_by_status(
        &self,
        property_ids: Vec<Uuid>,
        period: Option<Period>,
    ) -> BookingResult<StatusCounts> {
        let mut query =
            booking::Entity::find().filter(booking::Column::PropertyId.is_in(property_ids));
        if let Some(period) = period {
            query = in_period(query, period);
        }

        let rows: Vec<(BookingStatus, i64)> = query
            .select_only()
            .column(booking::Column::Status)
            .column_as(booking::Column::Id.count(), "count")
            .group_by(booking::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            counts.record(status, n.max(0) as u64);
        }
        Ok(counts)
    }

    async fn confirmed_revenue(
        &self,
        property_ids: Vec<Uuid>,
        period: Period,
    ) -> BookingResult<Decimal> {
        let query = booking::Entity::find()
            .filter(booking::Column::PropertyId.is_in(property_ids))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed));

        let revenue: Option<Option<Decimal>> = in_period(query, period)
            .select_only()
            .column_as(booking::Column::TotalPrice.sum(), "revenue")
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(revenue.flatten().unwrap_or_default())
    }
}

/// Read-only view over the property catalog tables
pub struct PgPropertyRepository {
    db: DatabaseConnection,
}

impl PgPropertyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PropertyRepository for PgPropertyRepository {
    async fn find_by_id(&self, id: Uuid) -> BookingResult<Option<Property>> {
        let model = property::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn find_price_rules(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<Vec<PriceRule>> {
        let models = price_rule::Entity::find()
            .filter(price_rule::Column::PropertyId.eq(property_id))
            .filter(price_rule::Column::StartDate.lte(end))
            .filter(price_rule::Column::EndDate.gte(start))
            .order_by_asc(price_rule::Column::StartDate)
            .order_by_asc(price_rule::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn has_blocked_dates_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        let count = blocked_date::Entity::find()
            .filter(blocked_date::Column::PropertyId.eq(property_id))
            .filter(blocked_date::Column::StartDate.lte(end))
            .filter(blocked_date::Column::EndDate.gte(start))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn list_ids_by_organization(&self, organization_id: Uuid) -> BookingResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = property::Entity::find()
            .select_only()
            .column(property::Column::Id)
            .filter(property::Column::OrganizationId.eq(organization_id))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(ids)
    }
}
