//! Library crate for readme-royale, exposing the game core, storage and dispatcher to the binary and tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;
