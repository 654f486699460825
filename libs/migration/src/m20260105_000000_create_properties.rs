use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Property catalog, owned elsewhere; bookings only read it
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(pk_uuid(Properties::Id))
                    .col(uuid(Properties::OrganizationId))
                    .col(string(Properties::Title))
                    .col(decimal_len(Properties::BasePrice, 12, 2))
                    .col(integer(Properties::MaxOccupancy))
                    .col(
                        timestamp_with_time_zone(Properties::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Properties::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_properties_organization_id")
                    .table(Properties::Table)
                    .col(Properties::OrganizationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PriceRules::Table)
                    .if_not_exists()
                    .col(pk_uuid(PriceRules::Id))
                    .col(uuid(PriceRules::PropertyId))
                    .col(date(PriceRules::StartDate))
                    .col(date(PriceRules::EndDate))
                    .col(decimal_len(PriceRules::Price, 12, 2))
                    .col(text_null(PriceRules::Description))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_price_rules_property_id")
                            .from(PriceRules::Table, PriceRules::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_price_rules_property_dates")
                    .table(PriceRules::Table)
                    .col(PriceRules::PropertyId)
                    .col(PriceRules::StartDate)
                    .col(PriceRules::EndDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BlockedDates::Table)
                    .if_not_exists()
                    .col(pk_uuid(BlockedDates::Id))
                    .col(uuid(BlockedDates::PropertyId))
                    .col(date(BlockedDates::StartDate))
                    .col(date(BlockedDates::EndDate))
                    .col(text_null(BlockedDates::Reason))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_blocked_dates_property_id")
                            .from(BlockedDates::Table, BlockedDates::PropertyId)
                            .to(Properties::Table, Properties::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_blocked_dates_property_dates")
                    .table(BlockedDates::Table)
                    .col(BlockedDates::PropertyId)
                    .col(BlockedDates::StartDate)
                    .col(BlockedDates::EndDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BlockedDates::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PriceRules::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Properties {
    Table,
    Id,
    OrganizationId,
    Title,
    BasePrice,
    MaxOccupancy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PriceRules {
    Table,
    Id,
    PropertyId,
    StartDate,
    EndDate,
    Price,
    Description,
}

#[derive(DeriveIden)]
enum BlockedDates {
    Table,
    Id,
    PropertyId,
    StartDate,
    EndDate,
    Reason,
}
