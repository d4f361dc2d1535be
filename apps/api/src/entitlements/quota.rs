//! Quota ledger. Bumps `free_usage` after a chargeable operation succeeded.
//!
//! Read-modify-write against the identity store. Two concurrent requests from
//! the same principal can both read N and both write N+1; that lost update is
//! accepted for soft metering.

use serde_json::Value;
use tracing::debug;

use super::resolver::{read_free_usage, FREE_USAGE_KEY};
use crate::identity::{IdentityError, Metadata, MetadataStore};

/// Increments `free_usage` by one unless the principal is premium.
/// Call only after the provider call succeeded and the creation was stored.
pub async fn charge_if_free(
    store: &dyn MetadataStore,
    principal_id: &str,
    is_premium: bool,
) -> Result<(), IdentityError> {
    if is_premium {
        return Ok(());
    }

    let current = read_free_usage(&store.get_metadata(principal_id).await?).unwrap_or(0);

    let mut update = Metadata::new();
    update.insert(FREE_USAGE_KEY.to_string(), Value::from(current + 1));
    store.set_metadata(principal_id, update).await?;

    debug!("free_usage for {principal_id}: {} -> {}", current, current + 1);
    Ok(())
}
