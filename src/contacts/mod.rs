//! Clients: individual users linked to one professional.

pub mod error;
pub mod service;
pub mod types;

pub use error::ClientError;
pub use service::{create_client, delete_client, find_client, list_clients, update_client};
pub use types::{ClientOption, ClientSummary};
