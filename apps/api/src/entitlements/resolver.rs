//! Entitlement resolver. Derives plan and free-usage for a principal.
//!
//! Resolution is write-on-read: a principal whose metadata lacks `plan` or
//! `free_usage` gets the defaults persisted before the snapshot is returned,
//! so later increments always start from a stored base.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::identity::{IdentityError, Metadata, MetadataStore};

/// Number of chargeable generations a free principal may run.
pub const FREE_USAGE_LIMIT: i64 = 10;

pub(crate) const PLAN_KEY: &str = "plan";
pub(crate) const FREE_USAGE_KEY: &str = "free_usage";
/// Older metadata shape: a boolean flag instead of `plan`.
const LEGACY_PREMIUM_KEY: &str = "is_premium";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }
}

/// Per-request snapshot. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub plan: Plan,
    pub free_usage: i64,
    pub is_premium: bool,
}

impl Entitlement {
    /// Free principals at or past the limit may not run chargeable operations.
    pub fn quota_exhausted(&self) -> bool {
        !self.is_premium && self.free_usage >= FREE_USAGE_LIMIT
    }

    pub fn remaining(&self) -> Option<i64> {
        if self.is_premium {
            None
        } else {
            Some((FREE_USAGE_LIMIT - self.free_usage).max(0))
        }
    }

    fn from_metadata(plan: Option<&str>, free_usage: i64, metadata: &Metadata) -> Self {
        let plan = match plan {
            Some("premium") => Plan::Premium,
            _ => Plan::Free,
        };
        let legacy_premium = metadata
            .get(LEGACY_PREMIUM_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Entitlement {
            plan,
            free_usage,
            is_premium: plan == Plan::Premium || legacy_premium,
        }
    }
}

/// Reads `free_usage` as a non-negative integer. Numeric strings are accepted
/// since older writers stored the counter as text.
pub(crate) fn read_free_usage(metadata: &Metadata) -> Option<i64> {
    match metadata.get(FREE_USAGE_KEY)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(|v| v.max(0)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(|v| v.max(0)),
        _ => None,
    }
}

fn read_plan(metadata: &Metadata) -> Option<&str> {
    metadata
        .get(PLAN_KEY)
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
}

/// Resolves the entitlement snapshot for a gating decision.
///
/// Identity store failures propagate; the caller must fail the request
/// rather than assume any plan.
pub async fn resolve(
    store: &dyn MetadataStore,
    principal_id: &str,
) -> Result<Entitlement, IdentityError> {
    let mut metadata = store.get_metadata(principal_id).await?;

    let stored_usage = read_free_usage(&metadata);
    let stored_plan = read_plan(&metadata).map(str::to_string);

    if stored_usage.is_none() || stored_plan.is_none() {
        let free_usage = stored_usage.unwrap_or(0);
        let plan = stored_plan.clone().unwrap_or_else(|| Plan::Free.as_str().to_string());
        metadata.insert(FREE_USAGE_KEY.to_string(), Value::from(free_usage));
        metadata.insert(PLAN_KEY.to_string(), Value::from(plan));
        store.set_metadata(principal_id, metadata.clone()).await?;
        info!("Initialized entitlement metadata for {principal_id}");
    }

    let free_usage = read_free_usage(&metadata).unwrap_or(0);
    let entitlement = Entitlement::from_metadata(read_plan(&metadata), free_usage, &metadata);
    Ok(entitlement)
}

/// Display-only read. Falls back to free/zero when the store is unreachable
/// and never writes. Must not be used to gate a chargeable operation.
pub async fn peek(store: &dyn MetadataStore, principal_id: &str) -> Entitlement {
    match store.get_metadata(principal_id).await {
        Ok(metadata) => {
            let free_usage = read_free_usage(&metadata).unwrap_or(0);
            Entitlement::from_metadata(read_plan(&metadata), free_usage, &metadata)
        }
        Err(e) => {
            warn!("Usage lookup failed for {principal_id}, reporting defaults: {e}");
            Entitlement {
                plan: Plan::Free,
                free_usage: 0,
                is_premium: false,
            }
        }
    }
}
