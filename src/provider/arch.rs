use std::fmt;

use crate::errors::VmError;

/// Cpu architecture as named in cloud image urls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    Arm64,
}

impl Arch {
    pub fn from_machine(machine: &str) -> Result<Self, VmError> {
        match machine.trim() {
            "x86_64" | "amd64" => Ok(Arch::Amd64),
            "aarch64" | "arm64" => Ok(Arch::Arm64),
            other => Err(VmError::UnsupportedArch(other.to_string())),
        }
    }

    pub fn host() -> Result<Self, VmError> {
        let uname = nix::sys::utsname::uname()
            .map_err(|e| VmError::UnsupportedArch(format!("uname failed: {e}")))?;
        Self::from_machine(&uname.machine().to_string_lossy())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
