//! schedule-core: Schedule Service Core Library
//!
//! Session の型、ID アロケータ、並行アクセス可能なインメモリストア、
//! および設定の読み込みを提供します。

pub mod config;
pub mod error;
pub mod session;

pub use config::{Config, DeletePolicy, ServerConfig, StoreConfig};
pub use error::{Error, Result};
pub use session::{IdAllocator, Session, SessionStore};
