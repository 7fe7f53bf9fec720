//! Role capability checks
//!
//! Token issuance and verification are handled by the external auth service;
//! by the time a request reaches the engine it carries a verified
//! [`Actor`]. Every lifecycle entry point runs an explicit role check before
//! touching any state, instead of relying on middleware ordering.

use shared::models::{Actor, Role};
use shared::{AppError, AppResult};

/// Require the actor to hold one of the allowed roles
pub fn require_role(actor: &Actor, allowed: &[Role]) -> AppResult<()> {
    if allowed.contains(&actor.role) {
        return Ok(());
    }
    Err(
        AppError::role_required("Access denied. You do not have the required role.")
            .with_detail("actor_id", actor.id.clone())
            .with_detail("actor_role", actor.role.as_str())
            .with_detail(
                "required",
                allowed
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join("|"),
            ),
    )
}
