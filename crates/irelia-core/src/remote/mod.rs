//! Access to the quota-constrained remote API.

mod http;
mod traits;

pub use http::{decode_payloads, extract_domain, HttpRemote};
pub use traits::{Collection, EndpointTemplate, FetchMode, RemoteClient};
