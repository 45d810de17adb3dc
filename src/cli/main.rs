pub mod cmd;
pub mod context;
pub mod ui;

use tracing::Level;
use vmctl::utils::tracing::init_tracing;

use crate::ui::message::message_error;

#[tokio::main]
async fn main() {
    // a missing .env is fine, VMCTLDIR may come from the environment
    let _ = dotenvy::dotenv();
    init_tracing(Level::WARN);

    if let Err(e) = cmd::run_cli().await {
        message_error(format!("{e:#}"));
        std::process::exit(1);
    }
}
