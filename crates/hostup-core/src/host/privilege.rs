//! Effective privilege inspection.

pub trait PrivilegeProbe: Send + Sync {
    fn effective_uid(&self) -> u32;

    fn is_elevated(&self) -> bool {
        self.effective_uid() == 0
    }
}

/// Reads the effective uid of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct EffectiveUid;

impl PrivilegeProbe for EffectiveUid {
    fn effective_uid(&self) -> u32 {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() }
    }
}
