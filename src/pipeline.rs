use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::{
    cache::AssetCache,
    constants::SEED_VOLUME_NAME,
    host::IsoPackager,
    provider::{
        Arch, AssetKind, Provider, ProviderContext, ProviderRegistry, current_username,
        read_ssh_public_key,
    },
    utils::fs::move_file,
    vm::{CreateRequest, VmDirectory},
};

/// What a provisioning run left behind.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    /// Name of the provider that was used, if it could be resolved.
    pub provider: Option<String>,
    pub missing: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl ProvisionReport {
    pub fn is_complete(&self) -> bool {
        self.provider.is_some() && self.missing.is_empty() && self.errors.is_empty()
    }
}

/// Places boot assets and first-boot configuration into a vm directory.
#[derive(Clone)]
pub struct Provisioner {
    providers: ProviderRegistry,
    cache: AssetCache,
    packager: Arc<dyn IsoPackager>,
    arch: Option<Arch>,
}

impl Provisioner {
    pub fn new(
        providers: ProviderRegistry,
        cache: AssetCache,
        packager: Arc<dyn IsoPackager>,
    ) -> Self {
        Self {
            providers,
            cache,
            packager,
            arch: None,
        }
    }

    /// Pin the architecture instead of asking the host.
    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Best effort: every failure is logged and collected in the report.
    pub async fn provision(&self, vm: &VmDirectory, request: &CreateRequest) -> ProvisionReport {
        let mut report = ProvisionReport::default();

        let provider = match self.providers.resolve(&request.provider) {
            Ok(provider) => provider,
            Err(e) => {
                error!("{e}");
                report.errors.push(e.to_string());
                report.missing = vm.missing_files();
                return report;
            }
        };
        report.provider = Some(provider.name().to_string());

        let arch = match self.arch {
            Some(arch) => Ok(arch),
            None => Arch::host(),
        };
        let arch = match arch {
            Ok(arch) => Some(arch),
            Err(e) => {
                error!("{e}");
                report.errors.push(e.to_string());
                None
            }
        };

        if let Some(arch) = arch {
            let (kernel, initrd, disk) = tokio::join!(
                self.place_asset(vm, provider.clone(), AssetKind::Kernel, arch),
                self.place_asset(vm, provider.clone(), AssetKind::Initrd, arch),
                self.place_asset(vm, provider.clone(), AssetKind::DiskImage, arch),
            );

            for result in [kernel, initrd, disk] {
                if let Err(e) = result {
                    error!("{e:#}");
                    report.errors.push(format!("{e:#}"));
                }
            }
        }

        if let Err(e) = self.write_first_boot_files(vm, provider.as_ref(), request).await {
            error!("{e:#}");
            report.errors.push(format!("{e:#}"));
        }

        if let Err(e) = self.package_seed(vm).await {
            error!("{e:#}");
            report.errors.push(format!("{e:#}"));
        }

        report.missing = vm.missing_files();
        report
    }

    async fn place_asset(
        &self,
        vm: &VmDirectory,
        provider: Arc<dyn Provider>,
        kind: AssetKind,
        arch: Arch,
    ) -> Result<()> {
        let url = kind.source_url(provider.as_ref(), arch);
        let prefix = provider.name().to_string();

        let cached = self
            .cache
            .load(&url, &prefix, move |path| provider.post_process(kind, arch, path))
            .await
            .with_context(|| format!("failed to load {} for vm {}", kind.file_name(), vm.name()))?;

        move_file(&cached, vm.asset_path(kind)).await?;
        debug!("Placed {} for vm {}", kind.file_name(), vm.name());
        Ok(())
    }

    async fn write_first_boot_files(
        &self,
        vm: &VmDirectory,
        provider: &dyn Provider,
        request: &CreateRequest,
    ) -> Result<()> {
        let ctx = ProviderContext {
            vm_name: vm.name().to_string(),
            static_ip_address: request.static_ip_address.clone(),
            username: current_username(),
            ssh_public_key: read_ssh_public_key(&request.ssh_public_key_path).await,
        };

        let [meta_data_path, user_data_path, network_config_path] = vm.first_boot_files();
        let documents = [
            (meta_data_path, provider.meta_data(&ctx)?),
            (user_data_path, provider.user_data(&ctx)?),
            (network_config_path, provider.network_config(&ctx)?),
        ];

        tokio::fs::create_dir_all(vm.iso_folder()).await?;
        for (path, contents) in documents {
            tokio::fs::write(&path, contents)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        Ok(())
    }

    async fn package_seed(&self, vm: &VmDirectory) -> Result<()> {
        let seed_iso = vm.seed_iso_path();
        if seed_iso.exists() {
            tokio::fs::remove_file(&seed_iso).await?;
        }

        let output = self
            .packager
            .package(&vm.iso_folder(), &seed_iso, SEED_VOLUME_NAME)
            .await
            .with_context(|| format!("failed to package seed image for vm {}", vm.name()))?;

        debug!("{}", output.trim());
        info!("Packaged seed image {}", seed_iso.display());
        Ok(())
    }
}
