//! Student records and identifier counters.

use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::types::StudentId;

/// Key of the global book counter in the public namespace.
pub const BOOK_COUNTER_KEY: &str = "BookConfig";

/// Key of an organization's student counter in its private namespace.
pub const STUDENT_COUNTER_KEY: &str = "StudentConfig";

/// A student registered by an organization.
///
/// Lives only in the registering organization's private namespace. Other
/// organizations learn of it exclusively through the content hash of its
/// encoded bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub org: Identity,
    pub student_id: StudentId,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl Student {
    pub fn new(org: Identity, student_id: StudentId, input: StudentInput) -> Self {
        Self {
            org,
            student_id,
            name: input.name,
            phone: input.phone,
            email: input.email,
        }
    }
}

// Personal fields stay out of logs and panic messages.
impl std::fmt::Debug for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Student")
            .field("org", &self.org)
            .field("student_id", &self.student_id)
            .finish_non_exhaustive()
    }
}

/// Private registration fields supplied out-of-band by the registering
/// organization.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInput {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Phone")]
    pub phone: String,
    #[serde(alias = "Email")]
    pub email: String,
}

impl StudentInput {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Debug for StudentInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StudentInput { .. }")
    }
}

/// A monotonically increasing identifier counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub count: u64,
}

impl Counter {
    /// Advance the counter and return the new value.
    pub fn advance(&mut self) -> u64 {
        self.count += 1;
        self.count
    }
}
