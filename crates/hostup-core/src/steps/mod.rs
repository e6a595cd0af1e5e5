//! Provisioning steps, one per pipeline stage.

pub mod account;
pub mod deploy;
pub mod native_lib;
pub mod packages;
pub mod privilege;
pub mod service;
pub mod toolchain;

pub use account::AccountStep;
pub use deploy::BuildDeployStep;
pub use native_lib::NativeLibStep;
pub use packages::PackagesStep;
pub use privilege::PrivilegeStep;
pub use service::ServiceStep;
pub use toolchain::ToolchainStep;

use crate::config::ProvisionConfig;
use crate::context::ProvisionContext;
use crate::error::ProvisionError;
use crate::types::{Stage, StepOutcome};

/// One system-mutation step of the pipeline.
pub trait Step: Send + Sync {
    fn stage(&self) -> Stage;

    fn run(
        &self,
        ctx: &ProvisionContext,
        config: &ProvisionConfig,
    ) -> Result<StepOutcome, ProvisionError>;
}

/// The seven steps in execution order.
pub fn default_steps() -> Vec<Box<dyn Step>> {
    vec![
        Box::new(PrivilegeStep),
        Box::new(PackagesStep),
        Box::new(NativeLibStep),
        Box::new(ToolchainStep),
        Box::new(AccountStep),
        Box::new(BuildDeployStep),
        Box::new(ServiceStep),
    ]
}
