//! Typed client for the survey RPC API.
//!
//! - [`RpcClient`]: `query`/`mutate` plus one wrapper per procedure
//! - [`PollForm`]: local validation of the poll creation form
//! - [`PollDashboard`]: the create/list/delete flow with re-fetching

mod dashboard;
mod error;
mod form;
mod rpc;
mod types;

pub use dashboard::PollDashboard;
pub use error::{ClientError, ClientResult};
pub use form::{ChoiceField, PollForm};
pub use rpc::RpcClient;
pub use types::{Choice, DeleteCount, Example, Greeting, Poll, SessionInfo, SessionUser};
