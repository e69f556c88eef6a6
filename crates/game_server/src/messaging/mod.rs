//! Message handling and routing for client-server communication.
//!
//! Binary frames are decoded with `sweeper_protocol` and dispatched to the
//! connection's session; the router decides whether the connection lives on.

pub mod router;
pub mod types;

pub use router::route_client_message;
pub use types::{ConnectionState, RouteOutcome, SessionBinding};
