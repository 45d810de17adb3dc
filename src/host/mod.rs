//! Seams to the external programs vmctl drives, plus the process backed
//! implementations used by the binary.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use crate::{errors::AssetFetchError, vm::LaunchCommand};

pub mod http;
pub mod iso;
pub mod neighbor;
pub mod screen;
pub mod ssh;

pub use http::HttpFetcher;
pub use iso::SeedIsoPackager;
pub use neighbor::ArpTable;
pub use screen::Screen;
pub use ssh::Ssh;

/// Detached terminal sessions, one session directory per vm.
#[async_trait]
pub trait SessionMultiplexer: Send + Sync {
    async fn wipe_dead_sessions(&self, session_dir: &Path) -> Result<()>;
    async fn launch_detached(&self, session_dir: &Path, command: LaunchCommand) -> Result<()>;
    async fn attach(&self, session_dir: &Path) -> Result<()>;
}

#[async_trait]
pub trait RemoteShell: Send + Sync {
    async fn interactive(&self, host: &str) -> Result<()>;
    async fn run(&self, host: &str, command: &str) -> Result<String>;
}

#[async_trait]
pub trait NeighborTable: Send + Sync {
    /// Raw table text as printed by the host tool.
    async fn snapshot(&self) -> Result<String>;
}

#[async_trait]
pub trait IsoPackager: Send + Sync {
    async fn package(&self, source_dir: &Path, output: &Path, volume_name: &str) -> Result<String>;
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<(), AssetFetchError>;
}
