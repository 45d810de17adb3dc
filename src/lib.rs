pub mod cache;
pub mod config;
pub mod constants;
pub mod errors;
pub mod host;
pub mod pipeline;
pub mod provider;
pub mod resolver;
pub mod supervisor;
pub mod utils;
pub mod vm;

#[cfg(test)]
pub(crate) mod test_support;
