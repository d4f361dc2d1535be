// Creation Ledger: append-only record of generation results plus the like toggle.

pub mod handlers;
pub mod likes;
pub mod store;

pub use likes::toggle_like;
pub use store::{CreationStore, PgCreationStore};
