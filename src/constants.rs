pub const VMCTL_DIR_ENV: &str = "VMCTLDIR";
pub const VMCTL_CONFIG_ENV: &str = "VMCTL_CONFIG";

pub const VM_CONF_FILE: &str = "vm.conf";
pub const MAC_ADDR_FILE: &str = "0.macaddr";
pub const IP_ADDR_FILE: &str = "0.ipaddr";
pub const ISO_FOLDER: &str = "iso_folder";
pub const SEED_ISO_FILE: &str = "seed.iso";
pub const SESSION_DIR: &str = "screen";

pub const KERNEL_FILE: &str = "vmlinux";
pub const INITRD_FILE: &str = "initrd";
pub const DISK_IMAGE_FILE: &str = "disk.img";

pub const META_DATA_FILE: &str = "meta-data";
pub const USER_DATA_FILE: &str = "user-data";
pub const NETWORK_CONFIG_FILE: &str = "network-config";
pub const SEED_VOLUME_NAME: &str = "cidata";

pub const DEFAULT_KERNEL_CMD_LINE: &str = "console=hvc0 irqfixup root=/dev/vda";
pub const DEFAULT_NETWORK_KIND: &str = "nat";

pub const DEFAULT_PROVIDER: &str = "UbuntuProvider";
pub const DEFAULT_CPU_COUNT: u32 = 1;
pub const DEFAULT_MEMORY_MIB: u64 = 1024;
pub const DEFAULT_SSH_PUBLIC_KEY_PATH: &str = "~/.ssh/id_rsa.pub";

pub const DEFAULT_HYPERVISOR: &str = "vmcli";
pub const DEFAULT_NEIGHBOR_INTERFACE: &str = "bridge100";
pub const GUEST_SHUTDOWN_COMMAND: &str = "sudo shutdown -h now";
