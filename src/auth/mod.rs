//
//  bugz-cli
//  auth/mod.rs
//

//! Authentication: the on-disk token cache and the session layer that
//! attaches credentials to outgoing calls.

mod cache;
mod session;

pub use cache::CredentialCache;
pub use session::{AuthSession, Credentials};
