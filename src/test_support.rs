use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use anyhow::{Result, bail};
use async_trait::async_trait;
use url::Url;

use crate::{
    cache::AssetCache,
    errors::AssetFetchError,
    host::{Fetcher, IsoPackager, NeighborTable, RemoteShell, SessionMultiplexer},
    pipeline::Provisioner,
    provider::{Arch, AssetKind, Provider, ProviderContext, ProviderRegistry, cloud_init},
    vm::{CreateRequest, LaunchCommand},
};

/// Writes the requested url into the destination file.
#[derive(Default)]
pub struct FakeFetcher {
    fail: bool,
    fetches: AtomicUsize,
}

impl FakeFetcher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<(), AssetFetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(AssetFetchError::Server {
                url: url.to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }

        tokio::fs::write(dest, url.as_str())
            .await
            .map_err(|e| AssetFetchError::filesystem(dest, e))
    }
}

pub struct FakePackager;

#[async_trait]
impl IsoPackager for FakePackager {
    async fn package(&self, source_dir: &Path, output: &Path, volume_name: &str) -> Result<String> {
        if !source_dir.is_dir() {
            bail!("{} is not a directory", source_dir.display());
        }
        tokio::fs::write(output, volume_name).await?;
        Ok(format!("packaged {}", output.display()))
    }
}

/// Pretends to be screen: a launch drops a socket file into the session dir.
pub struct FakeSessions {
    leave_session: AtomicBool,
    wipes: AtomicUsize,
    attaches: AtomicUsize,
    launches: Mutex<Vec<LaunchCommand>>,
}

impl Default for FakeSessions {
    fn default() -> Self {
        Self {
            leave_session: AtomicBool::new(true),
            wipes: AtomicUsize::new(0),
            attaches: AtomicUsize::new(0),
            launches: Mutex::new(vec![]),
        }
    }
}

impl FakeSessions {
    pub fn set_leave_session(&self, leave: bool) {
        self.leave_session.store(leave, Ordering::SeqCst);
    }

    pub fn wipe_count(&self) -> usize {
        self.wipes.load(Ordering::SeqCst)
    }

    pub fn attach_count(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn last_launch(&self) -> Option<LaunchCommand> {
        self.launches.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SessionMultiplexer for FakeSessions {
    async fn wipe_dead_sessions(&self, _session_dir: &Path) -> Result<()> {
        self.wipes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn launch_detached(&self, session_dir: &Path, command: LaunchCommand) -> Result<()> {
        tokio::fs::create_dir_all(session_dir).await?;
        if self.leave_session.load(Ordering::SeqCst) {
            tokio::fs::write(session_dir.join("4242.vmctl"), "").await?;
        }
        self.launches.lock().unwrap().push(command);
        Ok(())
    }

    async fn attach(&self, _session_dir: &Path) -> Result<()> {
        self.attaches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeShell {
    commands: Mutex<Vec<(String, String)>>,
}

impl FakeShell {
    pub fn commands(&self) -> Vec<(String, String)> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteShell for FakeShell {
    async fn interactive(&self, host: &str) -> Result<()> {
        self.commands
            .lock()
            .unwrap()
            .push((host.to_string(), String::new()));
        Ok(())
    }

    async fn run(&self, host: &str, command: &str) -> Result<String> {
        self.commands
            .lock()
            .unwrap()
            .push((host.to_string(), command.to_string()));
        Ok("Connection closed by remote host.\n".to_string())
    }
}

pub struct FakeNeighbors {
    table: Option<String>,
    queries: AtomicUsize,
}

impl FakeNeighbors {
    pub fn new(table: &str) -> Self {
        Self {
            table: Some(table.to_string()),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            table: None,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NeighborTable for FakeNeighbors {
    async fn snapshot(&self) -> Result<String> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match &self.table {
            Some(table) => Ok(table.clone()),
            None => bail!("arp: command not found"),
        }
    }
}

/// Serves assets from `https://assets.test/`; post-processing prefixes the
/// file contents with `processed `.
pub struct TestProvider;

impl TestProvider {
    pub fn boxed() -> Arc<dyn Provider> {
        Arc::new(TestProvider)
    }
}

impl Provider for TestProvider {
    fn name(&self) -> &str {
        "TestProvider"
    }

    fn kernel_url(&self, _arch: Arch) -> String {
        "https://assets.test/kernel".to_string()
    }

    fn initrd_url(&self, _arch: Arch) -> String {
        "https://assets.test/initrd".to_string()
    }

    fn disk_image_url(&self, _arch: Arch) -> String {
        "https://assets.test/disk.img".to_string()
    }

    fn post_process(&self, _kind: AssetKind, _arch: Arch, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)?;
        std::fs::write(path, format!("processed {contents}"))?;
        Ok(())
    }

    fn meta_data(&self, ctx: &ProviderContext) -> Result<String> {
        cloud_init::render_meta_data(ctx)
    }

    fn user_data(&self, ctx: &ProviderContext) -> Result<String> {
        cloud_init::render_user_data(ctx)
    }

    fn network_config(&self, ctx: &ProviderContext) -> Result<String> {
        cloud_init::render_network_config(ctx)
    }
}

pub fn fake_provisioner(root: &Path) -> (Provisioner, Arc<FakeFetcher>) {
    let fetcher = Arc::new(FakeFetcher::default());

    let mut providers = ProviderRegistry::empty();
    providers.register("TestProvider", TestProvider::boxed);

    let provisioner = Provisioner::new(
        providers,
        AssetCache::new(root.join("cache"), fetcher.clone()),
        Arc::new(FakePackager),
    )
    .with_arch(Arch::Amd64);

    (provisioner, fetcher)
}

pub fn test_request(name: &str) -> CreateRequest {
    CreateRequest {
        name: name.to_string(),
        cpu_count: 1,
        memory: 1024,
        provider: "TestProvider".to_string(),
        static_ip_address: None,
        ssh_public_key_path: PathBuf::from("/nonexistent/id_rsa.pub"),
    }
}
