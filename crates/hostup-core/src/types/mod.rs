//! Shared core types used across steps and the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One provisioning stage, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    PrivCheck,
    Deps,
    NativeLib,
    Toolchain,
    Account,
    BuildDeploy,
    Register,
}

impl Stage {
    /// All stages in execution order.
    pub const ORDER: [Stage; 7] = [
        Stage::PrivCheck,
        Stage::Deps,
        Stage::NativeLib,
        Stage::Toolchain,
        Stage::Account,
        Stage::BuildDeploy,
        Stage::Register,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::PrivCheck => "priv-check",
            Stage::Deps => "deps",
            Stage::NativeLib => "native-lib",
            Stage::Toolchain => "toolchain",
            Stage::Account => "account",
            Stage::BuildDeploy => "build-deploy",
            Stage::Register => "register",
        }
    }

    /// The stage that follows this one, or `None` for the last stage.
    pub fn next(self) -> Option<Stage> {
        let idx = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(idx + 1).copied()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful step did to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    /// The step mutated host state.
    Changed,
    /// Nothing on the host was mutated.
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_walks_stage_order() {
        assert_eq!(Stage::PrivCheck.next(), Some(Stage::Deps));
        assert_eq!(Stage::BuildDeploy.next(), Some(Stage::Register));
        assert_eq!(Stage::Register.next(), None);
    }
}
