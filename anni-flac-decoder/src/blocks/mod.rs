mod seek_table;
mod stream_info;

pub use seek_table::*;
pub use stream_info::*;
