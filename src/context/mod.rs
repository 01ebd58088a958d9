//! # Context resolution
//!
//! Clients may only filter, sort and include what the server allow-lists.
//! For every entity type the server registers ordered lists of context
//! handlers; a requested operation name is normalized
//! (`messages.recipient` becomes `messagesRecipient`) and resolved against
//! those lists, first match wins.
//!
//! ```rust,ignore
//! let contexts = ContextRegistry::builder()
//!     .filter("users", vec![user_filters, FilterContext::attributes(&["email"])])
//!     .sort("users", SortContext::timestamps())
//!     .with("users", ["messages", "messages.recipient"])
//!     .build();
//! ```
//!
//! Unknown names are ignored rather than rejected so that arbitrary client
//! input never fails a request or reveals which operations exist.

mod defaults;
mod handlers;
mod naming;
mod registry;

pub use handlers::{FilterContext, FilterOperation, SortContext, WithContext, WithEntry};
pub use naming::operation_key;
pub use registry::{ContextRegistry, ContextRegistryBuilder};
