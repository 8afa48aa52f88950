//! Contact discovery: protected data owners who granted the requester access.

mod discovery;
mod model;

pub use discovery::{ContactQuery, discover_contacts};
pub use model::Contact;
