//! The procedure registry.

pub mod auth;
pub mod choice;
pub mod example;
pub mod poll;

use crate::procedure::ProcedureRouter;

/// Every procedure the API serves, keyed `namespace.name`.
#[must_use]
pub fn registry() -> ProcedureRouter {
    ProcedureRouter::new()
        .nest("poll", poll::procedures())
        .nest("choice", choice::procedures())
        .nest("auth", auth::procedures())
        .nest("example", example::procedures())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::{Access, Kind};

    #[test]
    fn test_registry_paths_and_tags() {
        let registry = registry();

        assert_eq!(
            registry.paths(),
            [
                "auth.getSecretMessage",
                "choice.addVote",
                "example.getAll",
                "example.hello",
                "poll.addPoll",
                "poll.deletePoll",
                "poll.getAll",
                "poll.getById",
            ]
        );

        let protected = ["poll.getAll", "poll.deletePoll", "choice.addVote", "auth.getSecretMessage"];
        for path in registry.paths() {
            let requires_session = registry
                .get(path)
                .is_some_and(|p| matches!(p.access(), Access::RequiresSession(_)));
            assert_eq!(requires_session, protected.contains(&path), "{path}");
        }

        let mutations = ["poll.addPoll", "poll.deletePoll", "choice.addVote"];
        for path in mutations {
            assert!(registry.get(path).is_some_and(|p| p.kind() == Kind::Mutation));
        }
    }
}
