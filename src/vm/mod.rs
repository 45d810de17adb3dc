pub mod conf;
pub mod create;
pub mod launch;
pub mod layout;
pub mod mac;

pub use conf::VmConf;
pub use create::{CreateOutcome, CreateRequest, create};
pub use launch::{LaunchCommand, LaunchCommandBuilder};
pub use layout::{Registry, VmDirectory};
pub use mac::MacAddress;
