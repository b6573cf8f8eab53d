mod account;
mod generate;
mod generations;

pub use account::*;
pub use generate::*;
pub use generations::*;
