//! Database migrations for the land registry

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_farmers::Migration),
            Box::new(m20250301_000002_create_mayors::Migration),
            Box::new(m20250301_000003_create_parcels::Migration),
            Box::new(m20250301_000004_create_audit_logs::Migration),
            Box::new(m20250301_000005_create_site_settings::Migration),
        ]
    }
}

mod m20250301_000001_create_farmers {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_farmers"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Farmers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Farmers::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Farmers::Name).string().not_null())
                        .col(ColumnDef::new(Farmers::CompanyCode).string().not_null())
                        .col(ColumnDef::new(Farmers::Village).string().not_null())
                        .col(ColumnDef::new(Farmers::Email).string())
                        .col(ColumnDef::new(Farmers::Phone).string())
                        .col(ColumnDef::new(Farmers::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Farmers::Color).string())
                        .col(
                            ColumnDef::new(Farmers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Farmers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_farmers_company_code")
                        .table(Farmers::Table)
                        .col(Farmers::CompanyCode)
                        .unique()
                        .to_owned(),
                )
                .await?;

            // NULL emails do not collide
            manager
                .create_index(
                    Index::create()
                        .name("idx_farmers_email")
                        .table(Farmers::Table)
                        .col(Farmers::Email)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_farmers_village")
                        .table(Farmers::Table)
                        .col(Farmers::Village)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Farmers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Farmers {
        Table,
        Id,
        Name,
        CompanyCode,
        Village,
        Email,
        Phone,
        PasswordHash,
        Color,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_mayors {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_mayors"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Mayors::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Mayors::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Mayors::Name).string().not_null())
                        .col(ColumnDef::new(Mayors::Village).string().not_null())
                        .col(ColumnDef::new(Mayors::Email).string().not_null())
                        .col(ColumnDef::new(Mayors::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Mayors::SubscriptionStatus)
                                .string()
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(ColumnDef::new(Mayors::SubscriptionEndDate).timestamp_with_time_zone())
                        .col(
                            ColumnDef::new(Mayors::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Mayors::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_mayors_email")
                        .table(Mayors::Table)
                        .col(Mayors::Email)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_mayors_village")
                        .table(Mayors::Table)
                        .col(Mayors::Village)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Mayors::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Mayors {
        Table,
        Id,
        Name,
        Village,
        Email,
        PasswordHash,
        SubscriptionStatus,
        SubscriptionEndDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000003_create_parcels {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_parcels"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Parcels::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Parcels::Id).string().not_null().primary_key())
                        .col(ColumnDef::new(Parcels::Village).string().not_null())
                        .col(ColumnDef::new(Parcels::Area).double().not_null())
                        .col(ColumnDef::new(Parcels::Coordinates).json().not_null())
                        .col(ColumnDef::new(Parcels::OwnerId).uuid())
                        .col(ColumnDef::new(Parcels::CultivatorId).uuid())
                        .col(
                            ColumnDef::new(Parcels::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .col(
                            ColumnDef::new(Parcels::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_parcels_owner")
                                .from(Parcels::Table, Parcels::OwnerId)
                                .to(Farmers::Table, Farmers::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_parcels_cultivator")
                                .from(Parcels::Table, Parcels::CultivatorId)
                                .to(Farmers::Table, Farmers::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_parcels_village")
                        .table(Parcels::Table)
                        .col(Parcels::Village)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_parcels_owner_id")
                        .table(Parcels::Table)
                        .col(Parcels::OwnerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_parcels_cultivator_id")
                        .table(Parcels::Table)
                        .col(Parcels::CultivatorId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Parcels::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Parcels {
        Table,
        Id,
        Village,
        Area,
        Coordinates,
        OwnerId,
        CultivatorId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Farmers {
        Table,
        Id,
    }
}

mod m20250301_000004_create_audit_logs {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_audit_logs"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AuditLogs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(AuditLogs::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(AuditLogs::LogType).string().not_null())
                        .col(ColumnDef::new(AuditLogs::Actor).string().not_null())
                        .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                        .col(ColumnDef::new(AuditLogs::Details).text().not_null())
                        .col(
                            ColumnDef::new(AuditLogs::Timestamp)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_audit_logs_timestamp")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::Timestamp)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_audit_logs_log_type")
                        .table(AuditLogs::Table)
                        .col(AuditLogs::LogType)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum AuditLogs {
        Table,
        Id,
        LogType,
        Actor,
        Action,
        Details,
        Timestamp,
    }
}

mod m20250301_000005_create_site_settings {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000005_create_site_settings"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SiteSettings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SiteSettings::Id)
                                .integer()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SiteSettings::SiteName).string().not_null())
                        .col(
                            ColumnDef::new(SiteSettings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SiteSettings::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SiteSettings {
        Table,
        Id,
        SiteName,
        UpdatedAt,
    }
}
