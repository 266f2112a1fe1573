pub mod client;
pub mod dto;
pub mod handler;
pub mod prompt;
pub mod service;
