//! Example service.

use survey_common::AppResult;
use survey_db::{entities::example, repositories::ExampleRepository};

/// Illustrative pass-through service.
#[derive(Clone)]
pub struct ExampleService {
    example_repo: ExampleRepository,
}

impl ExampleService {
    /// Create a new example service.
    #[must_use]
    pub const fn new(example_repo: ExampleRepository) -> Self {
        Self { example_repo }
    }

    /// List all example rows.
    pub async fn list(&self) -> AppResult<Vec<example::Model>> {
        self.example_repo.find_all().await
    }

    /// Build a greeting. A signed-in email wins over the supplied text.
    #[must_use]
    pub fn greeting(text: Option<&str>, session_email: Option<&str>) -> String {
        let who = session_email.or(text).unwrap_or("world");
        format!("Hello {who}")
    }
}
