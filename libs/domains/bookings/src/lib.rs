//! Bookings Domain
//!
//! Reservation lifecycle for rental properties: availability checks, nightly
//! pricing, the confirm/reject/cancel state machine, keyset pagination and
//! per-organization KPIs.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐      ┌────────────────┐
//! │ BookingService │─────▶│ EventPublisher │  ← fire-and-forget
//! └───┬────────┬───┘      └────────────────┘
//!     │        │
//! ┌───▼────┐ ┌─▼───────┐  ┌────────────┐
//! │ Avail. │ │ Pricing │  │ KpiService │
//! └───┬────┘ └─┬───────┘  └─────┬──────┘
//!     │        │                │
//! ┌───▼────────▼────────────────▼───┐
//! │ BookingRepository / Property-   │  ← trait + in-memory + Postgres
//! │ Repository                      │
//! └─────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use core_config::{FromEnv, database::DatabaseConfig, events::EventsConfig};
//! use domain_bookings::{
//!     BookingService, DaprEventPublisher, PgBookingRepository, PgPropertyRepository,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = domain_bookings::postgres::connect(&DatabaseConfig::from_env()?).await?;
//! let publisher = DaprEventPublisher::from_config(&EventsConfig::from_env()?);
//!
//! let service = BookingService::new(
//!     PgBookingRepository::new(db.clone()),
//!     PgPropertyRepository::new(db),
//!     Arc::new(publisher),
//! );
//! let kpis = service.kpi_service();
//! # Ok(())
//! # }
//! ```

pub mod availability;
pub mod entity;
pub mod error;
pub mod events;
pub mod kpi;
pub mod lifecycle;
pub mod models;
pub mod pagination;
pub mod postgres;
pub mod pricing;
pub mod property;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use availability::AvailabilityChecker;
pub use error::{BookingError, BookingResult};
pub use events::{
    BookingTopic, ChannelEventPublisher, DaprEventPublisher, EventMessage, EventPublisher,
    NoopEventPublisher, PublishedEvent,
};
pub use kpi::{BookingKpis, KpiService, RevenueKpis, StatusCounts};
pub use lifecycle::BookingAction;
pub use models::{
    Actor, BlockedDate, Booking, BookingDetails, BookingOutcome, BookingRejection, BookingStatus,
    CreateBooking, CreateBookingResponse, OrganizationMembership, OrganizationRole, PriceRule,
    Property, UserRole,
};
pub use pagination::{Connection, Cursor, PageInfo, PageRequest};
pub use postgres::{PgBookingRepository, PgPropertyRepository};
pub use pricing::PricingEngine;
pub use property::{InMemoryPropertyRepository, PropertyRepository};
pub use repository::{BookingRepository, InMemoryBookingRepository};
pub use service::BookingService;
