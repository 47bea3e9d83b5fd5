//! Core support for the Latte shader recompiler
//!
//! This crate provides the error taxonomy, configuration, and logging
//! infrastructure shared by the microcode decoder and the transpiler.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, LogLevel, LoggingConfig, ShaderConfig};
pub use error::{DecodeError, LatteError, Result, TranslateError};
