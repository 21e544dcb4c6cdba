pub mod config;
pub mod drive;
pub mod geometry;
pub mod messages;
pub mod runtime;
pub mod sim;
