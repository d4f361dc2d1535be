// Entitlements: who may call what, and how much free-tier quota is left.
// All state lives in the identity provider's metadata bag (see identity::MetadataStore).

pub mod quota;
pub mod resolver;

pub use quota::charge_if_free;
pub use resolver::{peek, resolve, Entitlement, Plan, FREE_USAGE_LIMIT};
