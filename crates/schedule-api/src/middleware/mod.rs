//! Middleware modules
//!
//! Contains request logging middleware.

pub mod logging;
