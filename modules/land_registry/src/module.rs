//! Module declaration and lifecycle: migrations, wiring and REST registration

use crate::config::{Config, ProjectionKind};
use crate::contract::LandRegistryApi;
use crate::domain::{Reprojector, Service, Wgs84Passthrough};
use crate::infra::credentials::BcryptPasswordHasher;
use crate::infra::geodesy::Stereo70;
use anyhow::Result;
use parking_lot::RwLock;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;

/// Land registry module
pub struct LandRegistryModule {
    config: RwLock<Config>,
    service: RwLock<Option<Arc<Service>>>,
    client: RwLock<Option<Arc<dyn LandRegistryApi>>>,
}

impl Default for LandRegistryModule {
    fn default() -> Self {
        Self {
            config: RwLock::new(Config::default()),
            service: RwLock::new(None),
            client: RwLock::new(None),
        }
    }
}

impl LandRegistryModule {
    /// Open the configured database
    pub async fn connect(config: &Config) -> Result<DatabaseConnection> {
        let mut options = ConnectOptions::new(config.database_url.clone());
        options.sqlx_logging(false);
        let db = Database::connect(options).await?;
        tracing::info!("Database connection established");
        Ok(db)
    }

    /// Run pending schema migrations
    pub async fn migrate(&self, db: &DatabaseConnection) -> Result<()> {
        use crate::infra::storage::migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        Migrator::up(db, None).await?;
        tracing::info!("Land registry migrations completed");
        Ok(())
    }

    /// Build repositories, the domain service and the native client
    pub fn init(&self, config: Config, db: Arc<DatabaseConnection>) -> Result<()> {
        config.validate()?;

        let repos = crate::infra::storage::repositories(db);
        let hasher = Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost));
        let reprojector: Arc<dyn Reprojector> = match config.projection {
            ProjectionKind::Stereo70 => Arc::new(Stereo70::new()),
            ProjectionKind::Wgs84 => Arc::new(Wgs84Passthrough),
        };

        let service = Arc::new(Service::new(
            repos,
            hasher,
            reprojector.clone(),
            config.service_options(),
        ));
        *self.service.write() = Some(service.clone());

        let client: Arc<dyn LandRegistryApi> =
            Arc::new(crate::api::native::NativeClient::new(service));
        *self.client.write() = Some(client);

        tracing::info!(
            projection = reprojector.name(),
            "Land registry initialized with native client"
        );
        *self.config.write() = config;
        Ok(())
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn service(&self) -> Result<Arc<Service>> {
        self.service
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process API for other modules
    pub fn client(&self) -> Result<Arc<dyn LandRegistryApi>> {
        self.client
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Client not initialized"))
    }

    /// Mount the REST routes onto `router`
    pub fn register_rest(&self, router: axum::Router) -> Result<axum::Router> {
        let service = self.service()?;

        tracing::info!("Registering land registry REST routes");
        Ok(crate::api::rest::register_routes(router, service))
    }
}
