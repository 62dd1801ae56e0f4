//! Post category value object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The discussion category a post belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostCategory {
    /// General discussion.
    #[default]
    General,
    /// Advice from other parents.
    Advice,
    /// Schooling and education.
    Education,
    /// Therapy approaches and experiences.
    Therapies,
    /// Local services and resources.
    Resources,
}

impl PostCategory {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Advice => "advice",
            Self::Education => "education",
            Self::Therapies => "therapies",
            Self::Resources => "resources",
        }
    }

    /// Parses the stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(Self::General),
            "advice" => Some(Self::Advice),
            "education" => Some(Self::Education),
            "therapies" => Some(Self::Therapies),
            "resources" => Some(Self::Resources),
            _ => None,
        }
    }

    /// All categories.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [
            Self::General,
            Self::Advice,
            Self::Education,
            Self::Therapies,
            Self::Resources,
        ]
    }
}

impl fmt::Display for PostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
