pub mod config;
pub mod engine;
pub mod hand;
pub mod message;
pub mod state;
