use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use tracing::warn;

use crate::{
    constants::{DISK_IMAGE_FILE, INITRD_FILE, KERNEL_FILE},
    errors::VmError,
};

pub mod arch;
pub mod assets;
pub mod cloud_init;
pub mod ubuntu;

pub use arch::Arch;
pub use ubuntu::Ubuntu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Kernel,
    Initrd,
    DiskImage,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Kernel, AssetKind::Initrd, AssetKind::DiskImage];

    /// Name of the asset inside the vm directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            AssetKind::Kernel => KERNEL_FILE,
            AssetKind::Initrd => INITRD_FILE,
            AssetKind::DiskImage => DISK_IMAGE_FILE,
        }
    }

    pub fn source_url(&self, provider: &dyn Provider, arch: Arch) -> String {
        match self {
            AssetKind::Kernel => provider.kernel_url(arch),
            AssetKind::Initrd => provider.initrd_url(arch),
            AssetKind::DiskImage => provider.disk_image_url(arch),
        }
    }
}

/// Inputs for rendering the first-boot documents of one vm.
#[derive(Debug, Clone, Default)]
pub struct ProviderContext {
    pub vm_name: String,
    pub static_ip_address: Option<String>,
    pub username: String,
    pub ssh_public_key: String,
}

/// A source of boot assets plus the first-boot configuration for its images.
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn kernel_url(&self, arch: Arch) -> String;
    fn initrd_url(&self, arch: Arch) -> String;
    fn disk_image_url(&self, arch: Arch) -> String;

    /// Transform a freshly downloaded asset in place. Runs on a blocking thread.
    fn post_process(&self, kind: AssetKind, arch: Arch, path: &Path) -> Result<()>;

    fn meta_data(&self, ctx: &ProviderContext) -> Result<String>;
    fn user_data(&self, ctx: &ProviderContext) -> Result<String>;
    fn network_config(&self, ctx: &ProviderContext) -> Result<String>;
}

pub type ProviderConstructor = fn() -> Arc<dyn Provider>;

/// Name to constructor table used to pick a provider at create time.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(ubuntu::FOCAL.provider_name, ubuntu::focal);
        registry.register(ubuntu::JAMMY.provider_name, ubuntu::jammy);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: ProviderConstructor) {
        self.providers.insert(name.into(), constructor);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Provider>, VmError> {
        self.providers
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| VmError::ProviderNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.providers.keys().map(|n| n.as_str()).collect::<Vec<_>>();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

/// Login name of the invoking user, from the passwd database or `$USER`.
pub fn current_username() -> String {
    if let Ok(Some(user)) = nix::unistd::User::from_uid(nix::unistd::getuid()) {
        return user.name;
    }

    std::env::var("USER").unwrap_or_default()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match home::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Contents of the public key, trimmed. Empty when the key can't be read.
pub async fn read_ssh_public_key(path: &Path) -> String {
    let path = expand_home(path);
    match tokio::fs::read_to_string(&path).await {
        Ok(key) => key.trim().to_string(),
        Err(e) => {
            warn!("Failed to read ssh public key {}: {e}", path.display());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = ProviderRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec!["UbuntuJammyProvider", "UbuntuProvider"]
        );

        let provider = registry.resolve("UbuntuProvider").unwrap();
        assert_eq!(provider.name(), "UbuntuProvider");
    }

    #[test]
    fn test_resolve_is_exact() {
        let registry = ProviderRegistry::with_defaults();
        let err = registry.resolve("ubuntuprovider").err().unwrap();
        assert!(matches!(err, VmError::ProviderNotFound(name) if name == "ubuntuprovider"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(
            expand_home(Path::new("/etc/key.pub")),
            PathBuf::from("/etc/key.pub")
        );

        if let Some(home) = home::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/.ssh/id_rsa.pub")),
                home.join(".ssh/id_rsa.pub")
            );
        }
    }

    #[tokio::test]
    async fn test_read_ssh_public_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let key_path = temp_dir.path().join("id.pub");
        tokio::fs::write(&key_path, "ssh-ed25519 AAAA test@host\n")
            .await
            .unwrap();

        assert_eq!(
            read_ssh_public_key(&key_path).await,
            "ssh-ed25519 AAAA test@host"
        );
        assert_eq!(
            read_ssh_public_key(&temp_dir.path().join("missing.pub")).await,
            ""
        );
    }
}
