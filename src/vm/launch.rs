use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::vm::{MacAddress, VmConf, conf::KEY_NETWORK};

/// Fully assembled hypervisor invocation. Built once, then handed to the
/// session multiplexer by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct LaunchCommandBuilder {
    program: String,
    conf: Option<VmConf>,
    mac: Option<MacAddress>,
    working_dir: Option<PathBuf>,
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

impl LaunchCommand {
    pub fn builder(program: impl Into<String>) -> LaunchCommandBuilder {
        LaunchCommandBuilder {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The flags as one string, e.g. `--cpu-count='2' --network='02:..@nat'`.
    pub fn arg_string(&self) -> String {
        self.args.join(" ")
    }

    /// Shell line run inside the detached session.
    pub fn shell_line(&self) -> String {
        format!(
            "cd {} && {} {}",
            quote(&self.working_dir.to_string_lossy()),
            self.program,
            self.arg_string()
        )
    }
}

impl LaunchCommandBuilder {
    pub fn conf(mut self, conf: VmConf) -> Self {
        self.conf = Some(conf);
        self
    }

    pub fn mac(mut self, mac: MacAddress) -> Self {
        self.mac = Some(mac);
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<LaunchCommand> {
        let Some(conf) = self.conf else {
            bail!("launch command requires a vm configuration");
        };
        let Some(mac) = self.mac else {
            bail!("launch command requires a mac address");
        };
        let Some(working_dir) = self.working_dir else {
            bail!("launch command requires a working directory");
        };
        if self.program.is_empty() {
            bail!("launch command requires a hypervisor program");
        }

        let args = conf
            .iter()
            .map(|(key, value)| {
                if key == KEY_NETWORK {
                    format!("--{key}={}", quote(&format!("{mac}@{value}")))
                } else {
                    format!("--{key}={}", quote(value))
                }
            })
            .collect();

        Ok(LaunchCommand {
            program: self.program,
            args,
            working_dir,
        })
    }
}
