use crate::constants::{
    DEFAULT_KERNEL_CMD_LINE, DEFAULT_NETWORK_KIND, DISK_IMAGE_FILE, INITRD_FILE, KERNEL_FILE,
    SEED_ISO_FILE,
};

pub const KEY_KERNEL: &str = "kernel";
pub const KEY_INITRD: &str = "initrd";
pub const KEY_CMDLINE: &str = "cmdline";
pub const KEY_CPU_COUNT: &str = "cpu-count";
pub const KEY_MEMORY_SIZE: &str = "memory-size";
pub const KEY_DISK: &str = "disk";
pub const KEY_CDROM: &str = "cdrom";
pub const KEY_NETWORK: &str = "network";

/// Contents of `vm.conf`: ordered `key=value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmConf {
    entries: Vec<(String, String)>,
}

impl VmConf {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration every new vm starts with.
    pub fn for_machine(cpu_count: u32, memory: u64) -> Self {
        let mut conf = Self::new();
        conf.set(KEY_KERNEL, KERNEL_FILE);
        conf.set(KEY_INITRD, INITRD_FILE);
        conf.set(KEY_CMDLINE, DEFAULT_KERNEL_CMD_LINE);
        conf.set(KEY_CPU_COUNT, cpu_count.to_string());
        conf.set(KEY_MEMORY_SIZE, memory.to_string());
        conf.set(KEY_DISK, DISK_IMAGE_FILE);
        conf.set(KEY_CDROM, SEED_ISO_FILE);
        conf.set(KEY_NETWORK, DEFAULT_NETWORK_KIND);
        conf
    }

    /// Parse the flat format. Lines are split at the first `=`; empty lines
    /// and lines without `=` are ignored.
    pub fn parse(contents: &str) -> Self {
        let mut conf = Self::new();

        for line in contents.lines() {
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            conf.set(key, value);
        }

        conf
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the value of an existing key in place, or append a new one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_conf_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VmConf {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut conf = Self::new();
        for (key, value) in iter {
            conf.set(key, value);
        }
        conf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_machine_conf() {
        let conf = VmConf::for_machine(2, 2048);
        let text = conf.to_conf_string();

        assert!(text.contains("cpu-count=2\n"));
        assert!(text.contains("memory-size=2048\n"));
        assert!(text.contains("cmdline=console=hvc0 irqfixup root=/dev/vda\n"));
        assert_eq!(conf.get(KEY_NETWORK), Some("nat"));
        assert_eq!(conf.iter().next(), Some(("kernel", "vmlinux")));
        assert_eq!(conf.len(), 8);
    }

    #[test]
    fn test_round_trip() {
        let conf: VmConf = [
            ("kernel", "vmlinux"),
            ("cmdline", "console=hvc0 root=/dev/vda"),
            ("empty", ""),
            ("cpu-count", "4"),
        ]
        .into_iter()
        .collect();

        let parsed = VmConf::parse(&conf.to_conf_string());
        assert_eq!(parsed, conf);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let conf = VmConf::parse("kernel=vmlinux\n\nthis line is junk\ncpu-count=1\n");
        assert_eq!(conf.len(), 2);
        assert_eq!(conf.get("kernel"), Some("vmlinux"));
        assert_eq!(conf.get("cpu-count"), Some("1"));
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let conf = VmConf::parse("cmdline=console=hvc0 root=/dev/vda");
        assert_eq!(conf.get("cmdline"), Some("console=hvc0 root=/dev/vda"));
    }

    #[test]
    fn test_duplicate_key_keeps_position_and_last_value() {
        let conf = VmConf::parse("a=1\nb=2\na=3\n");
        let entries = conf.iter().collect::<Vec<_>>();
        assert_eq!(entries, vec![("a", "3"), ("b", "2")]);
    }
}
