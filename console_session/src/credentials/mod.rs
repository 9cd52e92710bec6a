mod errors;
mod store;
mod types;

pub use errors::CredentialError;
pub use store::{CredentialStorage, CredentialStore, InMemoryCredentialStorage};
pub use types::{Credential, UserProfile};
