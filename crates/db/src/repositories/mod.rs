//! Repositories wrapping sea-orm queries per entity.

mod account;
mod choice;
mod example;
mod poll;
mod session;
mod user;

pub use account::AccountRepository;
pub use choice::ChoiceRepository;
pub use example::ExampleRepository;
pub use poll::PollRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
