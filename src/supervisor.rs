use std::{path::Path, sync::Arc};

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    constants::GUEST_SHUTDOWN_COMMAND,
    errors::VmError,
    host::{RemoteShell, SessionMultiplexer},
    resolver::Resolver,
    vm::{LaunchCommand, Registry, VmConf, VmDirectory},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// The launch went through but no session showed up afterwards.
    NotConfirmed,
}

#[derive(Debug, Clone)]
pub struct VmStatus {
    pub name: String,
    pub running: bool,
    pub conf: Option<VmConf>,
    pub ip: Option<String>,
}

/// Number of entries in a session directory; a missing directory counts as
/// empty.
pub async fn session_entry_count(session_dir: &Path) -> usize {
    let Ok(mut entries) = tokio::fs::read_dir(session_dir).await else {
        return 0;
    };

    let mut count = 0;
    while let Ok(Some(_)) = entries.next_entry().await {
        count += 1;
    }
    count
}

/// Drives the vm lifecycle through the session multiplexer and remote shell.
#[derive(Clone)]
pub struct Supervisor {
    sessions: Arc<dyn SessionMultiplexer>,
    shell: Arc<dyn RemoteShell>,
    resolver: Resolver,
    hypervisor: String,
}

impl Supervisor {
    pub fn new(
        sessions: Arc<dyn SessionMultiplexer>,
        shell: Arc<dyn RemoteShell>,
        resolver: Resolver,
        hypervisor: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            shell,
            resolver,
            hypervisor: hypervisor.into(),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Wipe dead sessions, then check whether any session is left.
    pub async fn is_running(&self, vm: &VmDirectory) -> bool {
        let session_dir = vm.session_dir();
        if let Err(e) = self.sessions.wipe_dead_sessions(&session_dir).await {
            warn!("Failed to wipe dead sessions of vm {}: {e}", vm.name());
        }

        session_entry_count(&session_dir).await > 0
    }

    pub async fn start(&self, vm: &VmDirectory) -> Result<StartOutcome> {
        let conf = vm
            .read_config()
            .await
            .ok_or_else(|| VmError::ConfigUnreadable(vm.name().to_string()))?;
        let mac = vm
            .read_mac()
            .await
            .ok_or_else(|| VmError::MacUnavailable(vm.name().to_string()))?;

        if self.is_running(vm).await {
            return Err(VmError::AlreadyRunning(vm.name().to_string()).into());
        }

        let command = LaunchCommand::builder(&self.hypervisor)
            .conf(conf)
            .mac(mac)
            .working_dir(vm.path())
            .build()?;

        info!("Starting vm {}", vm.name());
        self.sessions
            .launch_detached(&vm.session_dir(), command)
            .await?;

        if self.is_running(vm).await {
            Ok(StartOutcome::Started)
        } else {
            Ok(StartOutcome::NotConfirmed)
        }
    }

    pub async fn ip(&self, vm: &VmDirectory) -> Result<String> {
        let ip = self
            .resolver
            .get_ip(vm)
            .await
            .ok_or_else(|| VmError::IpUnavailable(vm.name().to_string()))?;
        Ok(ip)
    }

    /// Ask the guest to power off. Returns whatever the guest printed.
    pub async fn stop(&self, vm: &VmDirectory) -> Result<String> {
        let ip = self.ip(vm).await?;
        info!("Stopping vm {} at {ip}", vm.name());
        self.shell.run(&ip, GUEST_SHUTDOWN_COMMAND).await
    }

    pub async fn ssh(&self, vm: &VmDirectory) -> Result<()> {
        let ip = self.ip(vm).await?;
        self.shell.interactive(&ip).await
    }

    pub async fn attach(&self, vm: &VmDirectory) -> Result<()> {
        if !vm.exists() {
            return Err(VmError::NotFound(vm.name().to_string()).into());
        }

        self.sessions.attach(&vm.session_dir()).await
    }

    pub async fn list(&self, registry: &Registry) -> Result<Vec<VmStatus>> {
        let mut statuses = Vec::new();

        for name in registry.vm_names().await? {
            let vm = match registry.vm(&name) {
                Ok(vm) => vm,
                Err(e) => {
                    warn!("Skipping registry entry: {e}");
                    continue;
                }
            };
            statuses.push(VmStatus {
                running: self.is_running(&vm).await,
                conf: vm.read_config().await,
                ip: vm.read_cached_ip().await,
                name,
            });
        }

        Ok(statuses)
    }
}
