//! SeaORM entities for database tables

/// Farmer accounts
pub mod farmer {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "farmers")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        pub name: String,

        /// Company registration code (unique index)
        pub company_code: String,

        pub village: String,

        /// Unique when present
        pub email: Option<String>,

        pub phone: Option<String>,

        /// bcrypt hash, never the plain password
        pub password_hash: String,

        pub color: Option<String>,

        pub created_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Mayor accounts, at most one per village
pub mod mayor {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "mayors")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        pub name: String,

        /// Unique index
        pub village: String,

        /// Unique index
        pub email: String,

        pub password_hash: String,

        /// PENDING, ACTIVE or INACTIVE
        pub subscription_status: String,

        pub subscription_end_date: Option<DateTimeUtc>,

        pub created_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Cadastral parcels
pub mod parcel {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "parcels")]
    pub struct Model {
        /// Cadastral code
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,

        pub village: String,

        /// Hectares
        #[sea_orm(column_type = "Double")]
        pub area: f64,

        /// Ring of `[lon, lat]` pairs as a JSON array
        pub coordinates: Json,

        pub owner_id: Option<Uuid>,

        pub cultivator_id: Option<Uuid>,

        pub created_at: DateTimeUtc,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::farmer::Entity",
            from = "Column::OwnerId",
            to = "super::farmer::Column::Id"
        )]
        Owner,
        #[sea_orm(
            belongs_to = "super::farmer::Entity",
            from = "Column::CultivatorId",
            to = "super::farmer::Column::Id"
        )]
        Cultivator,
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Append-only audit log
pub mod audit_log {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "audit_logs")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,

        /// SYSTEM, USER_ACTION, ASSIGNMENT or PARCEL_UPLOAD
        pub log_type: String,

        pub actor: String,

        pub action: String,

        #[sea_orm(column_type = "Text")]
        pub details: String,

        pub timestamp: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Single-row site settings
pub mod site_settings {
    use sea_orm::entity::prelude::*;

    /// Primary key of the only row
    pub const SINGLETON_ID: i32 = 1;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "site_settings")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,

        pub site_name: String,

        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
