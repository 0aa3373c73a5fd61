//! Database entities.

pub mod account;
pub mod choice;
pub mod example;
pub mod poll;
pub mod session;
pub mod user;

pub use account::Entity as Account;
pub use choice::Entity as Choice;
pub use example::Entity as Example;
pub use poll::Entity as Poll;
pub use session::Entity as Session;
pub use user::Entity as User;
