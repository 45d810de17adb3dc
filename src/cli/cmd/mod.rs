pub mod create;
pub mod list;
pub mod machine;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::context::Context;

#[derive(Parser)]
#[command(name = "vmctl")]
#[command(about = "Create and run lightweight virtual machines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a vm, or refresh the assets of an existing one
    Create(create::CreateArgs),

    /// List vms (short: ls)
    #[command(alias = "ls")]
    List,

    /// Start a vm in a detached session
    Start(VmArgs),

    /// Shut a running vm down from the inside
    Stop(VmArgs),

    /// Open a shell on a running vm
    Ssh(VmArgs),

    /// Attach to the console session of a running vm
    Attach(VmArgs),

    /// Print the ip address of a running vm
    Ip(VmArgs),
}

#[derive(Clone, Debug, Args)]
pub struct VmArgs {
    /// Name of the vm
    name: String,
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let ctx = Context::load().await?;

    match cli.command {
        Command::Create(args) => create::run_create(&ctx, args).await,
        Command::List => list::run_list(&ctx).await,
        Command::Start(args) => machine::run_start(&ctx, args).await,
        Command::Stop(args) => machine::run_stop(&ctx, args).await,
        Command::Ssh(args) => machine::run_ssh(&ctx, args).await,
        Command::Attach(args) => machine::run_attach(&ctx, args).await,
        Command::Ip(args) => machine::run_ip(&ctx, args).await,
    }
}
