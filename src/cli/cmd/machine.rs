use anyhow::Result;
use vmctl::supervisor::StartOutcome;

use crate::{
    cmd::VmArgs,
    context::Context,
    ui::message::{message_info, message_output, message_warn},
};

pub async fn run_start(ctx: &Context, args: VmArgs) -> Result<()> {
    let vm = ctx.registry.vm(&args.name)?;

    match ctx.supervisor.start(&vm).await? {
        StartOutcome::Started => message_info(format!("Vm {} started", vm.name())),
        StartOutcome::NotConfirmed => message_warn(format!(
            "Vm {} was launched but its session exited, check {}",
            vm.name(),
            vm.conf_path().display()
        )),
    }

    Ok(())
}

pub async fn run_stop(ctx: &Context, args: VmArgs) -> Result<()> {
    let vm = ctx.registry.vm(&args.name)?;

    let output = ctx.supervisor.stop(&vm).await?;
    message_info(format!("Sent shutdown to vm {}", vm.name()));
    message_output(output);

    Ok(())
}

pub async fn run_ssh(ctx: &Context, args: VmArgs) -> Result<()> {
    let vm = ctx.registry.vm(&args.name)?;
    ctx.supervisor.ssh(&vm).await
}

pub async fn run_attach(ctx: &Context, args: VmArgs) -> Result<()> {
    let vm = ctx.registry.vm(&args.name)?;
    ctx.supervisor.attach(&vm).await
}

pub async fn run_ip(ctx: &Context, args: VmArgs) -> Result<()> {
    let vm = ctx.registry.vm(&args.name)?;

    let ip = ctx.supervisor.ip(&vm).await?;
    println!("{ip}");

    Ok(())
}
