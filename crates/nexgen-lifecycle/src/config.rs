//! Lifecycle controller settings.

use nexgen_core::models::plan::DEFAULT_PLAN_ID;

#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Plan every auto-created subscription starts on.
    pub default_plan_id: u32,
    /// How many fresh codes to try before giving up on an approval.
    pub code_attempts: u32,
    /// Random bytes behind each tenant admin temporary password.
    pub temporary_password_bytes: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_plan_id: DEFAULT_PLAN_ID,
            code_attempts: 5,
            temporary_password_bytes: 18,
        }
    }
}
