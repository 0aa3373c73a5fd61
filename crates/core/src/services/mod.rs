//! Services sitting between the procedure layer and the repositories.

pub mod auth;
pub mod choice;
pub mod example;
pub mod identity;
pub mod poll;
pub mod session;

pub use auth::AuthService;
pub use choice::ChoiceService;
pub use example::ExampleService;
pub use identity::{IdentityProvider, OAuthProvider, ProviderIdentity, ProviderTokens};
pub use poll::{CreatePollInput, PollService, PollWithChoices};
pub use session::{IssuedSession, Session, SessionService, SessionUser};
