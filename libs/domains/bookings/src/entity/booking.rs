use crate::models::{Booking, BookingStatus, NewBooking};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM Entity for Bookings table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub confirmation_code: String,
    pub property_id: Uuid,
    pub user_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub number_of_guests: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Booking {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            confirmation_code: model.confirmation_code,
            property_id: model.property_id,
            user_id: model.user_id,
            start_date: model.start_date,
            end_date: model.end_date,
            number_of_guests: model.number_of_guests,
            total_price: model.total_price,
            status: model.status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

// Goes through the domain constructor so ids and timestamps match the in-memory store
impl From<NewBooking> for ActiveModel {
    fn from(input: NewBooking) -> Self {
        let booking = Booking::new(input);

        ActiveModel {
            id: Set(booking.id),
            confirmation_code: Set(booking.confirmation_code),
            property_id: Set(booking.property_id),
            user_id: Set(booking.user_id),
            start_date: Set(booking.start_date),
            end_date: Set(booking.end_date),
            number_of_guests: Set(booking.number_of_guests),
            total_price: Set(booking.total_price),
            status: Set(booking.status),
            created_at: Set(booking.created_at.into()),
            updated_at: Set(booking.updated_at.into()),
        }
    }
}
