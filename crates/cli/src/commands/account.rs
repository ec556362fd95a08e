//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! sw-cli --access-token "$TOKEN" account become-demo-admin
//! ```

use super::{CommandError, Context};

/// Grant the demo admin role to the signed-in caller.
///
/// Callers who already have dashboard access keep their role.
pub async fn become_demo_admin(ctx: &Context) -> Result<(), CommandError> {
    let role = ctx.state.account().become_demo_admin(ctx.caller()).await?;
    tracing::info!(%role, "Account role");
    Ok(())
}
