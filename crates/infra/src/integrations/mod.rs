//! External service integrations

pub mod openai;
