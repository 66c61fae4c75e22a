mod bar;
mod data;

pub use bar::{SpBar, MINIMUM_SP_AMOUNT};
pub use data::{SpData, WhammyRange};
