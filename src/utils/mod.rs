pub mod fs;
pub mod size;
pub mod tracing;
