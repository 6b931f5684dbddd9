use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_clients_table::Migration),
            Box::new(m20250901_000002_create_releases_table::Migration),
            Box::new(m20250901_000003_create_events_table::Migration),
            Box::new(m20250901_000004_create_reservations_table::Migration),
            Box::new(m20250901_000005_create_staff_table::Migration),
            Box::new(m20250901_000006_create_palette_tables::Migration),
        ]
    }
}

mod m20250901_000001_create_clients_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000001_create_clients_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Clients::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Clients::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Clients::Name).string().not_null())
                        .col(ColumnDef::new(Clients::Email).string().null())
                        .col(ColumnDef::new(Clients::Phone).string().null())
                        .col(
                            ColumnDef::new(Clients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // NULL emails never collide, so clients without one are unaffected
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clients_email")
                        .table(Clients::Table)
                        .col(Clients::Email)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_clients_phone")
                        .table(Clients::Table)
                        .col(Clients::Phone)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Clients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Clients {
        Table,
        Id,
        Name,
        Email,
        Phone,
        CreatedAt,
    }
}

mod m20250901_000002_create_releases_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000002_create_releases_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Releases::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Releases::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Releases::Name).string().not_null())
                        .col(ColumnDef::new(Releases::Game).string().null())
                        .col(ColumnDef::new(Releases::Collection).string().null())
                        .col(ColumnDef::new(Releases::ReleaseDate).date().not_null())
                        .col(ColumnDef::new(Releases::ShipDate).date().null())
                        .col(
                            ColumnDef::new(Releases::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Releases::ReservationFee)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Releases::Comment).text().null())
                        .col(
                            ColumnDef::new(Releases::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_releases_release_date")
                        .table(Releases::Table)
                        .col(Releases::ReleaseDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Releases::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Releases {
        Table,
        Id,
        Name,
        Game,
        Collection,
        ReleaseDate,
        ShipDate,
        Price,
        ReservationFee,
        Comment,
        CreatedAt,
    }
}

mod m20250901_000003_create_events_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000003_create_events_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Events::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Events::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Events::Name).string().not_null())
                        .col(ColumnDef::new(Events::Game).string().null())
                        .col(ColumnDef::new(Events::Collection).string().null())
                        .col(ColumnDef::new(Events::Date).date().not_null())
                        .col(
                            ColumnDef::new(Events::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Events::ReservationFee)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Events::Comment).text().null())
                        .col(
                            ColumnDef::new(Events::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Events::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Events {
        Table,
        Id,
        Name,
        Game,
        Collection,
        Date,
        Price,
        ReservationFee,
        Comment,
        CreatedAt,
    }
}

mod m20250901_000004_create_reservations_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000004_create_reservations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // References are checked by the services rather than by foreign
            // keys; listings report dangling ones instead of failing.
            manager
                .create_table(
                    Table::create()
                        .table(Reservations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Reservations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Reservations::ClientId).uuid().not_null())
                        .col(ColumnDef::new(Reservations::ReleaseId).uuid().null())
                        .col(ColumnDef::new(Reservations::EventId).uuid().null())
                        .col(
                            ColumnDef::new(Reservations::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Reservations::ReservationDate)
                                .date()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reservations::Status)
                                .string_len(16)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Reservations::AmountPaid)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Reservations::PaymentType).string().null())
                        .col(ColumnDef::new(Reservations::Notes).text().null())
                        .col(
                            ColumnDef::new(Reservations::FullyPaid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Reservations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reservations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, column) in [
                ("idx_reservations_client_id", Reservations::ClientId),
                ("idx_reservations_release_id", Reservations::ReleaseId),
                ("idx_reservations_event_id", Reservations::EventId),
            ] {
                manager
                    .create_index(
                        Index::create()
                            .if_not_exists()
                            .name(name)
                            .table(Reservations::Table)
                            .col(column)
                            .to_owned(),
                    )
                    .await?;
            }

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reservations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Reservations {
        Table,
        Id,
        ClientId,
        ReleaseId,
        EventId,
        Quantity,
        ReservationDate,
        Status,
        AmountPaid,
        PaymentType,
        Notes,
        FullyPaid,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250901_000005_create_staff_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000005_create_staff_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Staff::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Staff::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Staff::Name).string().not_null())
                        .col(ColumnDef::new(Staff::Role).string().null())
                        .col(ColumnDef::new(Staff::Email).string().null())
                        .col(ColumnDef::new(Staff::Phone).string().null())
                        .col(
                            ColumnDef::new(Staff::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Staff::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Staff {
        Table,
        Id,
        Name,
        Role,
        Email,
        Phone,
        CreatedAt,
    }
}

mod m20250901_000006_create_palette_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250901_000006_create_palette_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Games::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Games::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Games::Name).string().not_null().unique_key())
                        .col(ColumnDef::new(Games::Color).string_len(7).not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Collections::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Collections::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Collections::GameId).uuid().not_null())
                        .col(ColumnDef::new(Collections::Name).string().not_null())
                        .col(ColumnDef::new(Collections::Position).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_collections_game_id")
                                .from(Collections::Table, Collections::GameId)
                                .to(Games::Table, Games::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_collections_game_name")
                        .table(Collections::Table)
                        .col(Collections::GameId)
                        .col(Collections::Name)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Collections::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Games::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Games {
        Table,
        Id,
        Name,
        Color,
    }

    #[derive(DeriveIden)]
    enum Collections {
        Table,
        Id,
        GameId,
        Name,
        Position,
    }
}
