use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::{
    errors::VmError,
    pipeline::{ProvisionReport, Provisioner},
    vm::{MacAddress, Registry, VmConf, VmDirectory},
};

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: String,
    pub cpu_count: u32,
    /// MiB, written to `memory-size` as is.
    pub memory: u64,
    pub provider: String,
    pub static_ip_address: Option<String>,
    pub ssh_public_key_path: PathBuf,
}

#[derive(Debug)]
pub struct CreateOutcome {
    pub vm: VmDirectory,
    pub report: ProvisionReport,
}

async fn ensure_dir(path: PathBuf) {
    if path.is_dir() {
        return;
    }

    if let Err(source) = tokio::fs::create_dir_all(&path).await {
        let err = VmError::Directory { path, source };
        error!("{err}");
    }
}

/// Allocate (or refresh) a vm directory and provision its boot assets.
///
/// Directory creation and provisioning are best effort: failures are logged
/// and reported through [`ProvisionReport`], only the mac and `vm.conf` writes
/// are fatal.
pub async fn create(
    registry: &Registry,
    request: &CreateRequest,
    provisioner: &Provisioner,
) -> Result<CreateOutcome> {
    let vm = registry.vm(&request.name)?;
    info!("Creating vm {} at {}", vm.name(), vm.path().display());

    ensure_dir(vm.path().to_path_buf()).await;
    ensure_dir(vm.iso_folder()).await;

    let mac_path = vm.mac_path();
    if !mac_path.exists() {
        let mac = MacAddress::generate();
        tokio::fs::write(&mac_path, mac.to_plain_hex())
            .await
            .with_context(|| format!("failed to write mac address to {}", mac_path.display()))?;
        info!("Generated mac address {mac} for vm {}", vm.name());
    }

    let conf_path = vm.conf_path();
    if conf_path.exists() {
        tokio::fs::remove_file(&conf_path).await?;
    }
    let conf = VmConf::for_machine(request.cpu_count, request.memory);
    tokio::fs::write(&conf_path, conf.to_conf_string())
        .await
        .with_context(|| format!("failed to write {}", conf_path.display()))?;

    let report = provisioner.provision(&vm, request).await;

    Ok(CreateOutcome { vm, report })
}
