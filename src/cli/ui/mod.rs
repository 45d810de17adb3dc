pub mod message;
pub mod table;

pub const DEFAULT_WIDTH: u16 = 80;
pub const COLUMN_GAP: usize = 2;
pub const END_PADDING: usize = 1;
pub const MESSAGE_PADDING: usize = 3;
