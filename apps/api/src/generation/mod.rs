// Generation: the six AI operations behind one entitlement/staging skeleton.
// Text completion goes through llm_client; binary providers through providers.

pub mod extract;
pub mod handlers;
pub mod mediator;
pub mod operation;
