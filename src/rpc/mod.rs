//
//  bugz-cli
//  rpc/mod.rs
//

//! XML-RPC plumbing: the value model, the wire codec, and the HTTP
//! transport behind the [`RpcTransport`] seam.

mod client;
mod value;

pub use client::{RpcTransport, XmlRpcClient};
pub use value::{format_request, parse_response, Struct, Value};
