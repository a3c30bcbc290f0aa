//
//  bugz-cli
//  bugs/mod.rs
//

//! Payload builders for the bug-mutating and bug-querying RPC methods.

mod mutation;
mod search;

pub use mutation::MutationRequest;
pub use search::SearchQuery;
