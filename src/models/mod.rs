pub mod account;
pub mod generation;
pub mod tool;

pub use account::Account;
pub use generation::{auto_title, GenerationRecord, NewGeneration, Tags};
pub use tool::{Tool, ToolKind};
