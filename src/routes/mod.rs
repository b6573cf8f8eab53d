pub mod auth;
pub mod generate;
pub mod generations;
pub mod pay;
pub mod tools;
