use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// Characters used for confirmation codes (no 0/O/1/I to keep them readable)
const CONFIRMATION_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CONFIRMATION_CODE_LEN: usize = 8;

/// Reservation lifecycle status
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Awaiting a decision from the property's organization
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl BookingStatus {
    /// Statuses that no longer hold the property's dates
    pub const RELEASED: [BookingStatus; 2] = [BookingStatus::Cancelled, BookingStatus::Rejected];

    /// Whether a booking in this status occupies its dates
    pub fn holds_dates(self) -> bool {
        !Self::RELEASED.contains(&self)
    }
}

/// Booking entity - a reservation of a property for a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: Uuid,
    /// Short code shown to the guest, immutable after creation
    pub confirmation_code: String,
    pub property_id: Uuid,
    /// Guest who owns the booking
    pub user_id: Uuid,
    /// Check-in date
    pub start_date: NaiveDate,
    /// Check-out date (exclusive for pricing)
    pub end_date: NaiveDate,
    pub number_of_guests: i32,
    /// Price fixed at creation time
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a pending booking from a priced request
    pub fn new(input: NewBooking) -> Self {
        let now = timestamp_now();
        Self {
            id: Uuid::now_v7(),
            confirmation_code: input.confirmation_code,
            property_id: input.property_id,
            user_id: input.user_id,
            start_date: input.start_date,
            end_date: input.end_date,
            number_of_guests: input.number_of_guests,
            total_price: input.total_price,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a new status and refresh `updated_at`
    pub fn set_status(&mut self, status: BookingStatus) {
        self.status = status;
        self.updated_at = timestamp_now();
    }
}

/// Current time truncated to the precision Postgres keeps for `timestamptz`
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Generate a fresh confirmation code
pub fn generate_confirmation_code() -> String {
    let mut rng = rand::rng();
    (0..CONFIRMATION_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CONFIRMATION_CHARSET.len());
            CONFIRMATION_CHARSET[idx] as char
        })
        .collect()
}

fn validate_stay_dates(input: &CreateBooking) -> Result<(), validator::ValidationError> {
    if input.start_date >= input.end_date {
        return Err(validator::ValidationError::new("start_date_not_before_end_date"));
    }
    Ok(())
}

/// Stay request submitted by a guest
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_stay_dates"))]
pub struct CreateBooking {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(range(min = 1))]
    pub number_of_guests: i32,
}

/// A validated, priced booking ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_guests: i32,
    pub total_price: Decimal,
    pub confirmation_code: String,
}

/// Read-only view of a rentable property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    /// Organization that manages the property
    pub organization_id: Uuid,
    pub title: String,
    /// Nightly rate when no price rule applies
    pub base_price: Decimal,
    pub max_occupancy: i32,
}

/// Date-bound override of a property's nightly rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    pub id: Uuid,
    pub property_id: Uuid,
    /// First night covered (inclusive)
    pub start_date: NaiveDate,
    /// Last night covered (inclusive)
    pub end_date: NaiveDate,
    pub price: Decimal,
    pub description: Option<String>,
}

impl PriceRule {
    /// Whether the rule's inclusive window contains `night`
    pub fn covers(&self, night: NaiveDate) -> bool {
        self.start_date <= night && night <= self.end_date
    }
}

/// Owner-declared window during which a property cannot be booked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedDate {
    pub id: Uuid,
    pub property_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

/// Platform-wide role of an actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// Role held inside an organization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrganizationRole {
    Owner,
    Admin,
    #[default]
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    pub organization_id: Uuid,
    pub role: OrganizationRole,
}

/// Authenticated caller of a booking operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub organization_membership: Option<OrganizationMembership>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Organization the actor is a member of, if any
    pub fn organization_id(&self) -> Option<Uuid> {
        self.organization_membership
            .as_ref()
            .map(|membership| membership.organization_id)
    }
}

/// Filters shared by the paginated booking queries
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookingFilter {
    pub property_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.property_id.is_none_or(|id| booking.property_id == id)
            && self.user_id.is_none_or(|id| booking.user_id == id)
            && self.status.is_none_or(|status| booking.status == status)
    }
}

/// Single-record read with the property joined in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: Option<Property>,
}

/// Business-rule reasons a stay request is turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BookingRejection {
    #[strum(to_string = "Property not found")]
    PropertyNotFound,
    #[strum(to_string = "Booking exceeds max occupancy")]
    ExceedsMaxOccupancy,
    #[strum(to_string = "Selected dates are not available")]
    DatesUnavailable,
}

/// Result of the booking creation workflow
///
/// Business-rule failures are values, not errors: callers branch on
/// [`BookingOutcome::is_success`].
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Created(Booking),
    Rejected(BookingRejection),
}

impl BookingOutcome {
    pub const CREATED_MESSAGE: &'static str = "Booking created successfully";

    pub fn is_success(&self) -> bool {
        matches!(self, BookingOutcome::Created(_))
    }

    pub fn message(&self) -> String {
        match self {
            BookingOutcome::Created(_) => Self::CREATED_MESSAGE.to_string(),
            BookingOutcome::Rejected(reason) => reason.to_string(),
        }
    }

    pub fn booking(&self) -> Option<&Booking> {
        match self {
            BookingOutcome::Created(booking) => Some(booking),
            BookingOutcome::Rejected(_) => None,
        }
    }
}

/// Wire form of [`BookingOutcome`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_code: Option<String>,
}

impl From<&BookingOutcome> for CreateBookingResponse {
    fn from(outcome: &BookingOutcome) -> Self {
        let booking = outcome.booking();
        Self {
            success: outcome.is_success(),
            message: outcome.message(),
            booking_id: booking.map(|b| b.id),
            confirmation_code: booking.map(|b| b.confirmation_code.clone()),
        }
    }
}
