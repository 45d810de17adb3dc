use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::{
    constants::*,
    errors::VmError,
    provider::AssetKind,
    vm::{MacAddress, VmConf},
};

/// Root directory holding one subdirectory per vm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    root: PathBuf,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_env() -> Result<Self, VmError> {
        match std::env::var_os(VMCTL_DIR_ENV) {
            Some(root) if !root.is_empty() => Ok(Self::new(root)),
            _ => Err(VmError::ConfigurationMissing),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the vm called `name`. The name must be a single normal
    /// path component so the directory always sits directly under the root.
    pub fn vm(&self, name: &str) -> Result<VmDirectory, VmError> {
        if !is_valid_vm_name(name) {
            return Err(VmError::InvalidName(name.to_string()));
        }

        Ok(VmDirectory {
            name: name.to_string(),
            path: self.root.join(name),
        })
    }

    /// Names of every vm directory, sorted. Hidden entries and plain files are
    /// skipped; a missing root means there are no vms yet.
    pub async fn vm_names(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            debug!("Registry root {} does not exist", self.root.display());
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }
}

fn is_valid_vm_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// On-disk home of a single vm. Every accessor re-reads the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmDirectory {
    name: String,
    path: PathBuf,
}

impl VmDirectory {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    pub fn conf_path(&self) -> PathBuf {
        self.path.join(VM_CONF_FILE)
    }

    pub fn mac_path(&self) -> PathBuf {
        self.path.join(MAC_ADDR_FILE)
    }

    pub fn ip_path(&self) -> PathBuf {
        self.path.join(IP_ADDR_FILE)
    }

    pub fn iso_folder(&self) -> PathBuf {
        self.path.join(ISO_FOLDER)
    }

    pub fn seed_iso_path(&self) -> PathBuf {
        self.path.join(SEED_ISO_FILE)
    }

    pub fn session_dir(&self) -> PathBuf {
        self.path.join(SESSION_DIR)
    }

    pub fn asset_path(&self, kind: AssetKind) -> PathBuf {
        self.path.join(kind.file_name())
    }

    pub fn first_boot_files(&self) -> [PathBuf; 3] {
        let iso_folder = self.iso_folder();
        [
            iso_folder.join(META_DATA_FILE),
            iso_folder.join(USER_DATA_FILE),
            iso_folder.join(NETWORK_CONFIG_FILE),
        ]
    }

    pub async fn read_config(&self) -> Option<VmConf> {
        let contents = tokio::fs::read_to_string(self.conf_path()).await.ok()?;
        Some(VmConf::parse(&contents))
    }

    /// The mac exactly as persisted (twelve hex digits, no separators).
    pub async fn read_mac_raw(&self) -> Option<String> {
        let contents = tokio::fs::read_to_string(self.mac_path()).await.ok()?;
        let mac = contents.trim();
        if mac.is_empty() {
            return None;
        }
        Some(mac.to_string())
    }

    pub async fn read_mac(&self) -> Option<MacAddress> {
        self.read_mac_raw().await?.parse().ok()
    }

    pub async fn read_cached_ip(&self) -> Option<String> {
        let contents = tokio::fs::read_to_string(self.ip_path()).await.ok()?;
        let ip = contents.trim();
        if ip.is_empty() {
            return None;
        }
        Some(ip.to_string())
    }

    /// Boot assets and first-boot files that are not in place yet.
    pub fn missing_files(&self) -> Vec<PathBuf> {
        let mut expected = AssetKind::ALL
            .iter()
            .map(|kind| self.asset_path(*kind))
            .collect::<Vec<_>>();
        expected.extend(self.first_boot_files());
        expected.push(self.seed_iso_path());

        expected.into_iter().filter(|p| !p.exists()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let registry = Registry::new("/vms");
        let vm = registry.vm("vm1").unwrap();

        assert_eq!(vm.path(), Path::new("/vms/vm1"));
        assert_eq!(vm.conf_path(), PathBuf::from("/vms/vm1/vm.conf"));
        assert_eq!(vm.mac_path(), PathBuf::from("/vms/vm1/0.macaddr"));
        assert_eq!(vm.ip_path(), PathBuf::from("/vms/vm1/0.ipaddr"));
        assert_eq!(vm.session_dir(), PathBuf::from("/vms/vm1/screen"));
        assert_eq!(
            vm.asset_path(AssetKind::Kernel),
            PathBuf::from("/vms/vm1/vmlinux")
        );
        assert_eq!(
            vm.first_boot_files()[2],
            PathBuf::from("/vms/vm1/iso_folder/network-config")
        );
    }

    #[test]
    fn test_vm_rejects_names_outside_root() {
        let registry = Registry::new("/vms");

        for name in ["", ".", "..", "a/b", "/tmp/x", "../escape", "a\\b", "nul\0"] {
            let err = registry.vm(name).unwrap_err();
            assert!(
                matches!(&err, VmError::InvalidName(n) if n == name),
                "{name:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_vm_accepts_plain_names() {
        let registry = Registry::new("/vms");

        for name in ["vm1", "web-01", "db.prod", "..hidden"] {
            let vm = registry.vm(name).unwrap();
            assert_eq!(vm.path().parent(), Some(Path::new("/vms")));
        }
    }

    #[tokio::test]
    async fn test_vm_names_sorted_and_filtered() {
        let temp_dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(temp_dir.path());

        for name in ["zeta", "alpha", ".hidden", "mid"] {
            tokio::fs::create_dir(temp_dir.path().join(name))
                .await
                .unwrap();
        }
        tokio::fs::write(temp_dir.path().join("notes.txt"), "x")
            .await
            .unwrap();

        let names = registry.vm_names().await.unwrap();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_vm_names_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(temp_dir.path().join("nope"));
        assert!(registry.vm_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let registry = Registry::new(temp_dir.path());
        let vm = registry.vm("vm1").unwrap();

        assert!(vm.read_config().await.is_none());
        assert!(vm.read_mac().await.is_none());
        assert!(vm.read_cached_ip().await.is_none());

        tokio::fs::create_dir(vm.path()).await.unwrap();
        tokio::fs::write(vm.mac_path(), "aabbccddeeff").await.unwrap();
        tokio::fs::write(vm.ip_path(), " 10.0.0.5\n").await.unwrap();
        tokio::fs::write(vm.conf_path(), "cpu-count=2\n").await.unwrap();

        assert_eq!(vm.read_mac_raw().await.as_deref(), Some("aabbccddeeff"));
        assert_eq!(
            vm.read_mac().await.map(|m| m.to_string()).as_deref(),
            Some("aa:bb:cc:dd:ee:ff")
        );
        assert_eq!(vm.read_cached_ip().await.as_deref(), Some("10.0.0.5"));
        assert_eq!(
            vm.read_config().await.unwrap().get("cpu-count"),
            Some("2")
        );
        assert_eq!(vm.missing_files().len(), 7);
    }
}
