//! SurrealDB repository implementations.

mod contract;
mod document;
mod notification;
mod property;
mod user;

pub use contract::SurrealContractRepository;
pub use document::SurrealContractDocumentRepository;
pub use notification::SurrealNotificationDispatcher;
pub use property::SurrealPropertyStore;
pub use user::SurrealIdentityStore;
