//! Poll creation form.
//!
//! The form is stricter than the server: it also requires a description
//! of at least 15 characters.

use std::collections::BTreeMap;

use serde::Serialize;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{ClientError, ClientResult};

/// One choice row in the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct ChoiceField {
    /// Choice label.
    #[validate(length(min = 1, message = "Choice is required"))]
    pub title: String,
}

/// The poll creation form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct PollForm {
    /// Poll title.
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    /// Short description shown under the title.
    #[validate(length(min = 15, message = "Please provide a short description of your poll"))]
    pub description: String,
    /// Choices in display order.
    #[validate(nested)]
    pub choices: Vec<ChoiceField>,
}

impl PollForm {
    /// A form with no choices yet.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            choices: Vec::new(),
        }
    }

    /// Insert a choice at the top of the list, the way "Add Choice" does.
    #[must_use]
    pub fn prepend_choice(mut self, title: impl Into<String>) -> Self {
        self.choices.insert(0, ChoiceField { title: title.into() });
        self
    }

    /// Append a choice.
    #[must_use]
    pub fn with_choice(mut self, title: impl Into<String>) -> Self {
        self.choices.push(ChoiceField { title: title.into() });
        self
    }

    /// Per-field messages, keyed `title`, `description`, `choices.N.title`.
    /// Empty when the form is valid.
    #[must_use]
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        if let Err(errors) = self.validate() {
            flatten(&errors, "", &mut out);
        }
        out
    }

    /// Validate, turning failures into [`ClientError::InvalidForm`].
    pub fn check(&self) -> ClientResult<()> {
        let errors = self.field_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ClientError::InvalidForm(errors))
        }
    }
}

fn flatten(errors: &ValidationErrors, prefix: &str, out: &mut BTreeMap<String, String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                let message = list
                    .iter()
                    .find_map(|e| e.message.as_ref().map(ToString::to_string))
                    .unwrap_or_else(|| format!("{path} is invalid"));
                out.insert(path, message);
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(inner, &format!("{path}.{index}"), out);
                }
            }
        }
    }
}
