use std::{path::Path, sync::Arc};

use anyhow::Result;

use crate::provider::{
    Arch, AssetKind, Provider, ProviderContext,
    assets::{extract_file_in_place, gunzip_in_place},
    cloud_init,
};

const CLOUD_IMAGES_URL: &str = "https://cloud-images.ubuntu.com/releases";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UbuntuRelease {
    pub provider_name: &'static str,
    pub codename: &'static str,
    pub version: &'static str,
}

pub const FOCAL: UbuntuRelease = UbuntuRelease {
    provider_name: "UbuntuProvider",
    codename: "focal",
    version: "20.04",
};

pub const JAMMY: UbuntuRelease = UbuntuRelease {
    provider_name: "UbuntuJammyProvider",
    codename: "jammy",
    version: "22.04",
};

pub fn focal() -> Arc<dyn Provider> {
    Arc::new(Ubuntu::new(FOCAL))
}

pub fn jammy() -> Arc<dyn Provider> {
    Arc::new(Ubuntu::new(JAMMY))
}

/// Ubuntu server cloud images, unpacked kernel and initrd plus the raw disk.
#[derive(Debug, Clone)]
pub struct Ubuntu {
    release: UbuntuRelease,
}

impl Ubuntu {
    pub fn new(release: UbuntuRelease) -> Self {
        Self { release }
    }

    pub fn release(&self) -> UbuntuRelease {
        self.release
    }

    fn unpacked_url(&self, arch: Arch, suffix: &str) -> String {
        format!(
            "{CLOUD_IMAGES_URL}/{}/release/unpacked/ubuntu-{}-server-cloudimg-{arch}-{suffix}",
            self.release.codename, self.release.version
        )
    }

    /// Name of the raw image inside the disk tarball.
    pub fn disk_image_member(&self, arch: Arch) -> String {
        format!("{}-server-cloudimg-{arch}.img", self.release.codename)
    }
}

impl Provider for Ubuntu {
    fn name(&self) -> &str {
        self.release.provider_name
    }

    fn kernel_url(&self, arch: Arch) -> String {
        self.unpacked_url(arch, "vmlinuz-generic")
    }

    fn initrd_url(&self, arch: Arch) -> String {
        self.unpacked_url(arch, "initrd-generic")
    }

    fn disk_image_url(&self, arch: Arch) -> String {
        format!(
            "{CLOUD_IMAGES_URL}/{}/release/ubuntu-{}-server-cloudimg-{arch}.tar.gz",
            self.release.codename, self.release.version
        )
    }

    fn post_process(&self, kind: AssetKind, arch: Arch, path: &Path) -> Result<()> {
        match (kind, arch) {
            // arm64 kernels are published gzip compressed
            (AssetKind::Kernel, Arch::Arm64) => gunzip_in_place(path),
            (AssetKind::Kernel, Arch::Amd64) | (AssetKind::Initrd, _) => Ok(()),
            (AssetKind::DiskImage, _) => {
                extract_file_in_place(path, &self.disk_image_member(arch))
            }
        }
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
