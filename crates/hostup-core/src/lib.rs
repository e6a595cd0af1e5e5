//! Hostup Core Library
//!
//! Provides the provisioning pipeline that brings a bare Linux host to a
//! state where the target application is built, owned by a dedicated
//! system account, and registered with systemd.

pub mod config;
pub mod context;
pub mod error;
pub mod fs;
pub mod host;
pub mod pipeline;
pub mod steps;
pub mod types;
pub mod unit;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigPolicy, ProvisionConfig, parse_config, parse_config_str};

    // Host ports
    pub use crate::context::ProvisionContext;
    pub use crate::host::{
        AccountDirectory, CommandOutput, CommandRunner, CommandSpec, Downloader, PrivilegeProbe,
    };

    // Pipeline
    pub use crate::error::ProvisionError;
    pub use crate::pipeline::{Pipeline, PipelineError, PipelineReport, PipelineState};
    pub use crate::steps::Step;
    pub use crate::types::{Stage, StepOutcome};
    pub use crate::unit::ServiceUnit;
}
