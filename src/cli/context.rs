use std::sync::Arc;

use anyhow::Result;
use vmctl::{
    cache::AssetCache,
    config::Settings,
    host::{ArpTable, HttpFetcher, Screen, SeedIsoPackager, Ssh},
    pipeline::Provisioner,
    provider::ProviderRegistry,
    resolver::Resolver,
    supervisor::Supervisor,
    vm::Registry,
};

/// Everything a command needs, wired to the real host tools.
pub struct Context {
    pub registry: Registry,
    pub settings: Settings,
    pub supervisor: Supervisor,
}

impl Context {
    pub async fn load() -> Result<Self> {
        let registry = Registry::from_env()?;
        let settings = Settings::load().await?;

        let resolver = Resolver::new(Arc::new(ArpTable::new(
            settings.neighbor_interface.clone(),
        )));
        let supervisor = Supervisor::new(
            Arc::new(Screen::default()),
            Arc::new(Ssh::new(settings.ssh_options.clone())),
            resolver,
            &settings.hypervisor,
        );

        Ok(Self {
            registry,
            settings,
            supervisor,
        })
    }

    pub fn provisioner(&self) -> Provisioner {
        let cache = AssetCache::new(self.settings.cache_root(), Arc::new(HttpFetcher::new()));
        Provisioner::new(
            ProviderRegistry::with_defaults(),
            cache,
            Arc::new(SeedIsoPackager),
        )
    }
}
