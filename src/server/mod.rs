//! Protocol facade
//!
//! - `AcpServer` - Agent discovery plus run create/read/resume/cancel/list
//! - `ServerConfig` - Execution and retention settings
//! - Request and response models, including the mode-shaped `RunResponse`

pub mod config;
pub mod models;
pub mod server;

pub use config::{ServerConfig, ENV_CANCEL_GRACE_MS, ENV_EVENT_BUFFER, ENV_MAX_COMPLETED_RUNS};
pub use models::{AgentsListResponse, RunCreateRequest, RunMode, RunResponse, RunResumeRequest};
pub use server::AcpServer;
