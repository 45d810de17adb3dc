use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use vmctl::{
    constants::{DEFAULT_CPU_COUNT, DEFAULT_PROVIDER, DEFAULT_SSH_PUBLIC_KEY_PATH},
    utils::size::{format_memory_mib, parse_memory_mib},
    vm::{CreateRequest, create},
};

use crate::{
    context::Context,
    ui::message::{message_info, message_warn},
};

#[derive(Clone, Debug, Args)]
pub struct CreateArgs {
    /// Provider supplying the boot assets
    #[arg(short = 'p', long = "provider", default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// Number of virtual cpus
    #[arg(
        short = 'c',
        long = "numberOfCpus",
        default_value_t = DEFAULT_CPU_COUNT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    cpu_count: u32,

    /// Memory in MiB (eg. 1024, 512M, 2G)
    #[arg(short = 'm', long = "memory", default_value = "1024", value_parser = parse_memory_mib)]
    memory: u64,

    /// Static address for the guest nic, dhcp when omitted (eg. 192.168.64.10/24)
    #[arg(short = 'i', long = "staticIpAddress")]
    static_ip_address: Option<String>,

    /// Public key installed for the guest user
    #[arg(short = 's', long = "sshPublicKeypath", default_value = DEFAULT_SSH_PUBLIC_KEY_PATH)]
    ssh_public_key_path: PathBuf,

    /// Name of the vm
    name: String,
}

impl From<CreateArgs> for CreateRequest {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            cpu_count: args.cpu_count,
            memory: args.memory,
            provider: args.provider,
            static_ip_address: args.static_ip_address,
            ssh_public_key_path: args.ssh_public_key_path,
        }
    }
}

pub async fn run_create(ctx: &Context, args: CreateArgs) -> Result<()> {
    let request = CreateRequest::from(args);
    let provisioner = ctx.provisioner();

    message_info(format!(
        "Creating vm {} ({} cpu, {} memory, {})",
        request.name,
        request.cpu_count,
        format_memory_mib(request.memory),
        request.provider
    ));

    let outcome = create(&ctx.registry, &request, &provisioner).await?;

    if outcome.report.provider.is_none() {
        message_warn(format!(
            "Available providers: {}",
            provisioner.providers().names().join(", ")
        ));
    }

    if outcome.report.missing.is_empty() {
        message_info(format!(
            "Vm {} is ready at {}",
            outcome.vm.name(),
            outcome.vm.path().display()
        ));
    } else {
        message_warn(format!(
            "Vm {} was created but is missing files:",
            outcome.vm.name()
        ));
        for path in &outcome.report.missing {
            message_warn(format!("  {}", path.display()));
        }
    }

    Ok(())
}
