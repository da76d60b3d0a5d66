mod swap;
mod table;

pub use swap::{Swap, SwapRow};
pub use table::Table;
