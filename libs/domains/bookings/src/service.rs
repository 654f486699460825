use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::availability::AvailabilityChecker;
use crate::error::{BookingError, BookingResult};
use crate::events::{
    BookingCreatedPayload, BookingTopic, EventMessage, EventPublisher, EventUser,
    StatusChangedPayload, spawn_publish,
};
use crate::kpi::KpiService;
use crate::lifecycle::{AccessContext, BookingAction};
use crate::models::{
    Actor, Booking, BookingDetails, BookingFilter, BookingOutcome, BookingRejection,
    BookingStatus, CreateBooking, NewBooking, generate_confirmation_code,
};
use crate::pagination::{Connection, PageRequest};
use crate::pricing::PricingEngine;
use crate::property::PropertyRepository;
use crate::repository::BookingRepository;

/// Service layer for the booking lifecycle
///
/// Two writes are deliberately unguarded:
/// - creation checks availability and then inserts without a transaction, so
///   concurrent requests for overlapping dates can both succeed;
/// - status transitions read, authorize and write without comparing the
///   previous status, so concurrent transitions resolve as last write wins.
pub struct BookingService<B: BookingRepository, P: PropertyRepository> {
    bookings: Arc<B>,
    properties: Arc<P>,
    availability: AvailabilityChecker<B, P>,
    pricing: PricingEngine<P>,
    publisher: Arc<dyn EventPublisher>,
}

impl<B: BookingRepository, P: PropertyRepository> Clone for BookingService<B, P> {
    fn clone(&self) -> Self {
        Self {
            bookings: Arc::clone(&self.bookings),
            properties: Arc::clone(&self.properties),
            availability: self.availability.clone(),
            pricing: self.pricing.clone(),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<B: BookingRepository, P: PropertyRepository> BookingService<B, P> {
    pub fn new(bookings: B, properties: P, publisher: Arc<dyn EventPublisher>) -> Self {
        let bookings = Arc::new(bookings);
        let properties = Arc::new(properties);
        Self {
            availability: AvailabilityChecker::new(Arc::clone(&bookings), Arc::clone(&properties)),
            pricing: PricingEngine::new(Arc::clone(&properties)),
            bookings,
            properties,
            publisher,
        }
    }

    /// Create a pending booking for the actor.
    ///
    /// Business-rule refusals come back as [`BookingOutcome::Rejected`];
    /// only malformed input and store failures are errors.
    #[instrument(skip(self, input, actor), fields(user_id = %actor.id))]
    pub async fn create_booking(
        &self,
        property_id: Uuid,
        input: CreateBooking,
        actor: &Actor,
    ) -> BookingResult<BookingOutcome> {
        input.validate()?;

        let Some(property) = self.properties.find_by_id(property_id).await? else {
            return Ok(BookingOutcome::Rejected(BookingRejection::PropertyNotFound));
        };

        if input.number_of_guests > property.max_occupancy {
            return Ok(BookingOutcome::Rejected(
                BookingRejection::ExceedsMaxOccupancy,
            ));
        }

        if !self
            .availability
            .is_available(property_id, input.start_date, input.end_date)
            .await?
        {
            return Ok(BookingOutcome::Rejected(BookingRejection::DatesUnavailable));
        }

        let total_price = self
            .pricing
            .price_for(&property, input.start_date, input.end_date)
            .await?;

        let booking = self
            .bookings
            .create(NewBooking {
                property_id,
                user_id: actor.id,
                start_date: input.start_date,
                end_date: input.end_date,
                number_of_guests: input.number_of_guests,
                total_price,
                confirmation_code: generate_confirmation_code(),
            })
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            confirmation_code = %booking.confirmation_code,
            total_price = %booking.total_price,
            "Booking created"
        );

        self.emit(
            BookingTopic::Created,
            booking.id,
            &BookingCreatedPayload {
                user: actor,
                booking_details: &booking,
                property: &property,
            },
        );

        Ok(BookingOutcome::Created(booking))
    }

    /// Apply a lifecycle action on behalf of the actor
    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn transition(
        &self,
        booking_id: Uuid,
        action: BookingAction,
        actor: &Actor,
    ) -> BookingResult<Booking> {
        let booking = self
            .bookings
            .get_by_id(booking_id)
            .await?
            .ok_or(BookingError::NotFound(booking_id))?;

        let property = self.properties.find_by_id(booking.property_id).await?;
        let transition = action.transition();

        let ctx = AccessContext {
            actor,
            booking: &booking,
            property_organization_id: property.map(|p| p.organization_id),
        };
        if !transition.is_authorized(&ctx) {
            tracing::warn!(booking_id = %booking_id, action = %action, "Transition refused");
            return Err(BookingError::Forbidden { action, booking_id });
        }

        let updated = self
            .bookings
            .update_status(booking_id, transition.status)
            .await?;

        tracing::info!(
            booking_id = %booking_id,
            from = %booking.status,
            to = %updated.status,
            "Booking status changed"
        );

        self.emit(
            transition.topic,
            updated.id,
            &StatusChangedPayload {
                user: EventUser::from(actor),
                booking_details: &updated,
            },
        );

        Ok(updated)
    }

    pub async fn confirm_booking(&self, booking_id: Uuid, actor: &Actor) -> BookingResult<Booking> {
        self.transition(booking_id, BookingAction::Confirm, actor)
            .await
    }

    pub async fn reject_booking(&self, booking_id: Uuid, actor: &Actor) -> BookingResult<Booking> {
        self.transition(booking_id, BookingAction::Reject, actor)
            .await
    }

    pub async fn cancel_booking(&self, booking_id: Uuid, actor: &Actor) -> BookingResult<Booking> {
        self.transition(booking_id, BookingAction::Cancel, actor)
            .await
    }

    /// Get a booking with its property
    #[instrument(skip(self), fields(booking_id = %id))]
    pub async fn get_booking(&self, id: Uuid) -> BookingResult<BookingDetails> {
        let booking = self
            .bookings
            .get_by_id(id)
            .await?
            .ok_or(BookingError::NotFound(id))?;
        let property = self.properties.find_by_id(booking.property_id).await?;

        Ok(BookingDetails { booking, property })
    }

    /// All bookings, optionally restricted to one guest
    pub async fn list_bookings(
        &self,
        user_id: Option<Uuid>,
        page: PageRequest,
    ) -> BookingResult<Connection<Booking>> {
        self.paginate(
            BookingFilter {
                user_id,
                ..Default::default()
            },
            page,
        )
        .await
    }

    /// Bookings of one property, optionally restricted to one status
    pub async fn list_property_bookings(
        &self,
        property_id: Uuid,
        status: Option<BookingStatus>,
        page: PageRequest,
    ) -> BookingResult<Connection<Booking>> {
        self.paginate(
            BookingFilter {
                property_id: Some(property_id),
                status,
                ..Default::default()
            },
            page,
        )
        .await
    }

    pub async fn list_user_bookings(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> BookingResult<Connection<Booking>> {
        self.list_bookings(Some(user_id), page).await
    }

    #[instrument(skip(self))]
    async fn paginate(
        &self,
        filter: BookingFilter,
        page: PageRequest,
    ) -> BookingResult<Connection<Booking>> {
        let query = page.to_keyset()?;

        let (rows, total_count) = tokio::try_join!(
            self.bookings.find_page(filter.clone(), query),
            self.bookings.count(filter),
        )?;

        Ok(Connection::from_rows(rows, &query, total_count))
    }

    pub async fn has_bookings_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        self.availability
            .has_bookings_in_range(property_id, start, end)
            .await
    }

    pub async fn has_blocked_dates_in_range(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<bool> {
        self.availability
            .has_blocked_dates_in_range(property_id, start, end)
            .await
    }

    pub async fn calculate_total_price(
        &self,
        property_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BookingResult<Decimal> {
        self.pricing
            .calculate_total_price(property_id, start, end)
            .await
    }

    /// KPI reads over the same stores
    pub fn kpi_service(&self) -> KpiService<B, P> {
        KpiService::new(Arc::clone(&self.bookings), Arc::clone(&self.properties))
    }

    fn emit<T: Serialize>(&self, topic: BookingTopic, booking_id: Uuid, payload: &T) {
        match EventMessage::new(booking_id, payload) {
            Ok(message) => spawn_publish(Arc::clone(&self.publisher), topic, message),
            Err(e) => {
                tracing::warn!(topic = %topic, booking_id = %booking_id, error = %e, "Booking event not built")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelEventPublisher, NoopEventPublisher, PublishedEvent};
    use crate::models::{
        OrganizationMembership, OrganizationRole, PriceRule, Property, UserRole,
    };
    use crate::pagination::Cursor;
    use crate::property::{InMemoryPropertyRepository, MockPropertyRepository};
    use crate::repository::{InMemoryBookingRepository, MockBookingRepository};
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn guest() -> Actor {
        Actor {
            id: Uuid::now_v7(),
            email: "guest@example.com".to_string(),
            name: "Guest".to_string(),
            role: UserRole::User,
            organization_membership: None,
        }
    }

    fn admin() -> Actor {
        Actor {
            role: UserRole::Admin,
            email: "admin@example.com".to_string(),
            name: "Admin".to_string(),
            ..guest()
        }
    }

    fn member_of(organization_id: Uuid) -> Actor {
        Actor {
            email: "host@example.com".to_string(),
            name: "Host".to_string(),
            organization_membership: Some(OrganizationMembership {
                organization_id,
                role: OrganizationRole::Member,
            }),
            ..guest()
        }
    }

    fn stay(start: NaiveDate, end: NaiveDate, guests: i32) -> CreateBooking {
        CreateBooking {
            start_date: start,
            end_date: end,
            number_of_guests: guests,
        }
    }

    fn property(max_occupancy: i32) -> Property {
        Property {
            id: Uuid::now_v7(),
            organization_id: Uuid::now_v7(),
            title: "Seaside cottage".to_string(),
            base_price: dec!(100),
            max_occupancy,
        }
    }

    struct Harness {
        service: BookingService<InMemoryBookingRepository, InMemoryPropertyRepository>,
        properties: InMemoryPropertyRepository,
        events: UnboundedReceiver<PublishedEvent>,
        property: Property,
    }

    async fn harness() -> Harness {
        let properties = InMemoryPropertyRepository::new();
        let property = property(4);
        properties.insert_property(property.clone()).await;

        let (publisher, events) = ChannelEventPublisher::channel();
        let service = BookingService::new(
            InMemoryBookingRepository::new(),
            properties.clone(),
            Arc::new(publisher),
        );

        Harness {
            service,
            properties,
            events,
            property,
        }
    }

    async fn created(h: &Harness, input: CreateBooking, actor: &Actor) -> Booking {
        match h.service.create_booking(h.property.id, input, actor).await {
            Ok(BookingOutcome::Created(booking)) => booking,
            other => panic!("expected a created booking, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_booking_prices_and_stores_pending() {
        let mut h = harness().await;
        let actor = guest();

        let outcome = h
            .service
            .create_booking(h.property.id, stay(date(2024, 6, 1), date(2024, 6, 4), 2), &actor)
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.message(), "Booking created successfully");
        let booking = outcome.booking().unwrap();
        assert_eq!(booking.total_price, dec!(300));
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.user_id, actor.id);
        assert_eq!(booking.confirmation_code.len(), 8);

        let event = h.events.recv().await.unwrap();
        assert_eq!(event.topic, BookingTopic::Created);
        assert_eq!(event.message.key, booking.id.to_string());
        assert_eq!(event.message.value["user"]["email"], "guest@example.com");
        assert_eq!(event.message.value["property"]["id"], h.property.id.to_string());
        assert_eq!(event.message.value["bookingDetails"]["status"], "PENDING");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_create_booking_logs_once_at_info() {
        let h = harness().await;
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let guard = tracing::subscriber::set_default(subscriber);
        created(&h, stay(date(2024, 6, 1), date(2024, 6, 4), 2), &guest()).await;
        drop(guard);

        let text = logs.text();
        assert_eq!(text.matches("Booking created").count(), 1, "{text}");
        assert!(!text.contains("Stored booking"), "{text}");
    }

    #[tokio::test]
    async fn test_create_booking_applies_price_rules() {
        let h = harness().await;
        h.properties
            .add_price_rule(PriceRule {
                id: Uuid::now_v7(),
                property_id: h.property.id,
                start_date: date(2024, 2, 10),
                end_date: date(2024, 2, 12),
                price: dec!(200),
                description: Some("Winter festival".to_string()),
            })
            .await;

        let booking = created(&h, stay(date(2024, 2, 9), date(2024, 2, 13), 2), &guest()).await;
        assert_eq!(booking.total_price, dec!(700));
    }

    #[tokio::test]
    async fn test_overlapping_request_is_refused() {
        let h = harness().await;
        let admin = admin();
        let first = created(&h, stay(date(2024, 1, 1), date(2024, 1, 5), 2), &guest()).await;
        h.service.confirm_booking(first.id, &admin).await.unwrap();

        assert!(
            h.service
                .has_bookings_in_range(h.property.id, date(2024, 1, 3), date(2024, 1, 7))
                .await
                .unwrap()
        );

        let outcome = h
            .service
            .create_booking(h.property.id, stay(date(2024, 1, 3), date(2024, 1, 7), 2), &guest())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            BookingOutcome::Rejected(BookingRejection::DatesUnavailable)
        );
        assert_eq!(outcome.message(), "Selected dates are not available");
    }

    #[tokio::test]
    async fn test_cancelled_booking_frees_dates() {
        let h = harness().await;
        let actor = guest();
        let first = created(&h, stay(date(2024, 1, 1), date(2024, 1, 5), 2), &actor).await;
        h.service.cancel_booking(first.id, &actor).await.unwrap();

        let outcome = h
            .service
            .create_booking(h.property.id, stay(date(2024, 1, 3), date(2024, 1, 7), 2), &guest())
            .await
            .unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_blocked_dates_are_unavailable() {
        let h = harness().await;
        h.properties
            .add_blocked_date(crate::models::BlockedDate {
                id: Uuid::now_v7(),
                property_id: h.property.id,
                start_date: date(2024, 8, 1),
                end_date: date(2024, 8, 10),
                reason: Some("renovation".to_string()),
            })
            .await;

        let outcome = h
            .service
            .create_booking(h.property.id, stay(date(2024, 8, 5), date(2024, 8, 12), 1), &guest())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            BookingOutcome::Rejected(BookingRejection::DatesUnavailable)
        );
    }

    #[tokio::test]
    async fn test_unknown_property_is_a_rejection() {
        let h = harness().await;
        let outcome = h
            .service
            .create_booking(Uuid::now_v7(), stay(date(2024, 6, 1), date(2024, 6, 4), 2), &guest())
            .await
            .unwrap();
        assert_eq!(outcome.message(), "Property not found");
    }

    #[tokio::test]
    async fn test_invalid_request_is_an_error() {
        let h = harness().await;
        let result = h
            .service
            .create_booking(h.property.id, stay(date(2024, 6, 4), date(2024, 6, 1), 2), &guest())
            .await;
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_exceeding_occupancy_skips_availability_and_pricing() {
        let property = property(4);
        let found = property.clone();

        let mut mock_properties = MockPropertyRepository::new();
        mock_properties
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        mock_properties.expect_has_blocked_dates_in_range().never();
        mock_properties.expect_find_price_rules().never();

        let mut mock_bookings = MockBookingRepository::new();
        mock_bookings.expect_has_bookings_in_range().never();
        mock_bookings.expect_create().never();

        let service = BookingService::new(
            mock_bookings,
            mock_properties,
            Arc::new(NoopEventPublisher),
        );

        let outcome = service
            .create_booking(property.id, stay(date(2024, 6, 1), date(2024, 6, 4), 5), &guest())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            BookingOutcome::Rejected(BookingRejection::ExceedsMaxOccupancy)
        );
        assert_eq!(outcome.message(), "Booking exceeds max occupancy");
    }

    #[tokio::test]
    async fn test_admin_confirms_booking_of_any_organization() {
        let mut h = harness().await;
        let booking = created(&h, stay(date(2024, 6, 1), date(2024, 6, 4), 2), &guest()).await;
        let _ = h.events.recv().await;

        let admin = admin();
        let confirmed = h.service.confirm_booking(booking.id, &admin).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.total_price, booking.total_price);
        assert_eq!(confirmed.confirmation_code, booking.confirmation_code);

        let event = h.events.recv().await.unwrap();
        assert_eq!(event.topic, BookingTopic::Confirm);
        assert_eq!(event.message.value["user"]["email"], "admin@example.com");
        assert_eq!(event.message.value["bookingDetails"]["status"], "CONFIRMED");
    }

    #[tokio::test]
    async fn test_member_of_other_organization_cannot_confirm() {
        let h = harness().await;
        let booking = created(&h, stay(date(2024, 6, 1), date(2024, 6, 4), 2), &guest()).await;

        let outsider = member_of(Uuid::now_v7());
        let result = h.service.confirm_booking(booking.id, &outsider).await;
        assert!(matches!(
            result,
            Err(BookingError::Forbidden { action: BookingAction::Confirm, booking_id }) if booking_id == booking.id
        ));

        let unchanged = h.service.get_booking(booking.id).await.unwrap();
        assert_eq!(unchanged.booking.status, BookingStatus::Pending);
        assert_eq!(unchanged.property, Some(h.property.clone()));
    }

    #[tokio::test]
    async fn test_property_member_rejects_booking() {
        let h = harness().await;
        let booking = created(&h, stay(date(2024, 6, 1), date(2024, 6, 4), 2), &guest()).await;

        let host = member_of(h.property.organization_id);
        let rejected = h.service.reject_booking(booking.id, &host).await.unwrap();
        assert_eq!(rejected.status, BookingStatus::Rejected);
    }

    #[tokio::test]
    async fn test_no_status_guard_on_transitions() {
        let h = harness().await;
        let actor = guest();
        let booking = created(&h, stay(date(2024, 6, 1), date(2024, 6, 4), 2), &actor).await;
        let admin = admin();

        h.service.reject_booking(booking.id, &admin).await.unwrap();
        let confirmed = h.service.confirm_booking(booking.id, &admin).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let cancelled = h.service.cancel_booking(booking.id, &actor).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_transition_on_missing_booking() {
        let h = harness().await;
        let id = Uuid::now_v7();
        let result = h.service.cancel_booking(id, &admin()).await;
        assert!(matches!(result, Err(BookingError::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    async fn test_refused_transition_writes_nothing() {
        let booking = Booking::new(NewBooking {
            property_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            start_date: date(2024, 6, 1),
            end_date: date(2024, 6, 4),
            number_of_guests: 2,
            total_price: dec!(300),
            confirmation_code: "HX3P9KQA".to_string(),
        });
        let found = booking.clone();

        let mut mock_bookings = MockBookingRepository::new();
        mock_bookings
            .expect_get_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        mock_bookings.expect_update_status().never();

        let mut mock_properties = MockPropertyRepository::new();
        mock_properties.expect_find_by_id().returning(|_| Ok(None));

        let service = BookingService::new(
            mock_bookings,
            mock_properties,
            Arc::new(NoopEventPublisher),
        );

        let result = service.cancel_booking(booking.id, &guest()).await;
        assert!(matches!(result, Err(BookingError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_list_property_bookings_pages_forward() {
        let h = harness().await;
        for day in [1, 6, 11, 16, 21] {
            created(&h, stay(date(2024, 3, day), date(2024, 3, day + 2), 1), &guest()).await;
        }

        let first = h
            .service
            .list_property_bookings(h.property.id, None, PageRequest::first(2))
            .await
            .unwrap();
        assert_eq!(first.edges.len(), 2);
        assert_eq!(first.total_count, 5);
        assert!(first.page_info.has_next_page);
        assert!(!first.page_info.has_previous_page);

        let after = first.page_info.end_cursor.clone().unwrap();
        let second = h
            .service
            .list_property_bookings(h.property.id, None, PageRequest::first(2).after(after))
            .await
            .unwrap();
        assert_eq!(second.edges.len(), 2);
        assert!(second.page_info.has_previous_page);

        let seen: std::collections::HashSet<Uuid> =
            first.nodes().chain(second.nodes()).map(|b| b.id).collect();
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test]
    async fn test_list_property_bookings_by_status() {
        let h = harness().await;
        let admin = admin();
        let a = created(&h, stay(date(2024, 4, 1), date(2024, 4, 2), 1), &guest()).await;
        created(&h, stay(date(2024, 4, 5), date(2024, 4, 6), 1), &guest()).await;
        h.service.confirm_booking(a.id, &admin).await.unwrap();

        let page = h
            .service
            .list_property_bookings(
                h.property.id,
                Some(BookingStatus::Confirmed),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.edges[0].node.id, a.id);
    }

    #[tokio::test]
    async fn test_list_user_bookings() {
        let h = harness().await;
        let actor = guest();
        created(&h, stay(date(2024, 5, 1), date(2024, 5, 3), 1), &actor).await;
        created(&h, stay(date(2024, 5, 10), date(2024, 5, 12), 1), &guest()).await;

        let mine = h
            .service
            .list_user_bookings(actor.id, PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(mine.total_count, 1);
        assert!(mine.nodes().all(|b| b.user_id == actor.id));

        let all = h
            .service
            .list_bookings(None, PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(all.total_count, 2);
    }

    #[tokio::test]
    async fn test_garbage_cursor_is_rejected() {
        let h = harness().await;
        let result = h
            .service
            .list_bookings(None, PageRequest::first(5).after(Cursor::new("not a cursor")))
            .await;
        assert!(matches!(result, Err(BookingError::InvalidCursor(_))));
    }

    #[tokio::test]
    async fn test_kpi_service_sees_created_bookings() {
        let h = harness().await;
        let admin = admin();
        let booking = created(&h, stay(date(2024, 6, 1), date(2024, 6, 4), 2), &guest()).await;
        h.service.confirm_booking(booking.id, &admin).await.unwrap();

        let kpis = h
            .service
            .kpi_service()
            .kpis_by_organization(h.property.organization_id)
            .await
            .unwrap();
        assert_eq!(kpis.current_month.confirmed, 1);
        assert_eq!(kpis.lifetime.total(), 1);

        let revenue = h
            .service
            .kpi_service()
            .revenue_kpis_by_organization(h.property.organization_id)
            .await
            .unwrap();
        assert_eq!(revenue.current_month, dec!(300));
    }
}
