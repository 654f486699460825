use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use crate::m20260105_000000_create_properties::Properties;

#[derive(DeriveMigrationName)]
pub struct Migration;

const STATUSES: [BookingStatus; 4] = [
    BookingStatus::Pending,
    BookingStatus::Confirmed,
    BookingStatus::Cancelled,
    BookingStatus::Rejected,
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values(STATUSES)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(pk_uuid(Bookings::Id))
                    .col(string_len_uniq(Bookings::ConfirmationCode, 16))
                    .col(uuid(Bookings::PropertyId))
                    .col(uuid(Bookings::UserId))
                    .col(date(Bookings::StartDate))
                    .col(date(Bookings::EndDate))
                    .col(integer(Bookings::NumberOfGuests))
                    .col(decimal_len(Bookings::TotalPrice, 12, 2))
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .enumeration(BookingStatus::Enum, STATUSES)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        timestamp_with_time_zone(Bookings::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Bookings::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_property_id")
                            .from(Bookings::Table, Bookings::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE bookings
                    ADD CONSTRAINT chk_bookings_dates CHECK (start_date < end_date),
                    ADD CONSTRAINT chk_bookings_guests CHECK (number_of_guests >= 1)
                "#,
            )
            .await?;

        // Availability lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_property_dates")
                    .table(Bookings::Table)
                    .col(Bookings::PropertyId)
                    .col(Bookings::StartDate)
                    .col(Bookings::EndDate)
                    .to_owned(),
            )
            .await?;

        // Keyset pagination and KPI periods
        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_created_at_id")
                    .table(Bookings::Table)
                    .col(Bookings::CreatedAt)
                    .col(Bookings::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user_id")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Bookings {
    Table,
    Id,
    ConfirmationCode,
    PropertyId,
    UserId,
    StartDate,
    EndDate,
    NumberOfGuests,
    TotalPrice,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden, Clone, Copy)]
enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    #[sea_orm(iden = "PENDING")]
    Pending,
    #[sea_orm(iden = "CONFIRMED")]
    Confirmed,
    #[sea_orm(iden = "CANCELLED")]
    Cancelled,
    #[sea_orm(iden = "REJECTED")]
    Rejected,
}
