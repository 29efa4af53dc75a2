//! Aesthetic roles and the aesthetic mapping record.
//!
//! An aesthetic mapping connects dataframe columns to the fixed set of
//! semantic roles the geometries understand. The set of roles is closed, so
//! the mapping is a record with one optional column per role rather than an
//! open string-keyed map: an unsupported role name is a compile error, not a
//! runtime lookup failure.

use serde::{Deserialize, Serialize};

/// The closed set of semantic plot dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reaction,
    Metabolite,
    Condition,
    Y,
    Ymin,
    Ymax,
    Color,
    Size,
    Stack,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 9] = [
        Role::Reaction,
        Role::Metabolite,
        Role::Condition,
        Role::Y,
        Role::Ymin,
        Role::Ymax,
        Role::Color,
        Role::Size,
        Role::Stack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reaction => "reaction",
            Role::Metabolite => "metabolite",
            Role::Condition => "condition",
            Role::Y => "y",
            Role::Ymin => "ymin",
            Role::Ymax => "ymax",
            Role::Color => "color",
            Role::Size => "size",
            Role::Stack => "stack",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mapping from dataframe columns to aesthetic roles.
///
/// Built through one builder method per role; roles that are never set stay
/// absent (they are dropped, not stored as null).
///
/// # Example
///
/// ```
/// use ggmet::{Aes, Role};
///
/// let aes = Aes::new().reaction("r").color("flux");
/// assert_eq!(aes.get(Role::Reaction), Some("r"));
/// assert_eq!(aes.get(Role::Y), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aes {
    reaction: Option<String>,
    metabolite: Option<String>,
    condition: Option<String>,
    y: Option<String>,
    ymin: Option<String>,
    ymax: Option<String>,
    color: Option<String>,
    size: Option<String>,
    stack: Option<String>,
}

impl Aes {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reaction(mut self, column: impl Into<String>) -> Self {
        self.reaction = Some(column.into());
        self
    }

    pub fn metabolite(mut self, column: impl Into<String>) -> Self {
        self.metabolite = Some(column.into());
        self
    }

    pub fn condition(mut self, column: impl Into<String>) -> Self {
        self.condition = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y = Some(column.into());
        self
    }

    pub fn ymin(mut self, column: impl Into<String>) -> Self {
        self.ymin = Some(column.into());
        self
    }

    pub fn ymax(mut self, column: impl Into<String>) -> Self {
        self.ymax = Some(column.into());
        self
    }

    pub fn color(mut self, column: impl Into<String>) -> Self {
        self.color = Some(column.into());
        self
    }

    pub fn size(mut self, column: impl Into<String>) -> Self {
        self.size = Some(column.into());
        self
    }

    pub fn stack(mut self, column: impl Into<String>) -> Self {
        self.stack = Some(column.into());
        self
    }

    /// Column mapped to `role`, if any.
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Reaction => self.reaction.as_deref(),
            Role::Metabolite => self.metabolite.as_deref(),
            Role::Condition => self.condition.as_deref(),
            Role::Y => self.y.as_deref(),
            Role::Ymin => self.ymin.as_deref(),
            Role::Ymax => self.ymax.as_deref(),
            Role::Color => self.color.as_deref(),
            Role::Size => self.size.as_deref(),
            Role::Stack => self.stack.as_deref(),
        }
    }

    /// Check if a role is mapped.
    pub fn contains(&self, role: Role) -> bool {
        self.get(role).is_some()
    }

    /// Iterate over the mapped roles and their columns.
    pub fn roles(&self) -> impl Iterator<Item = (Role, &str)> + '_ {
        Role::ALL
            .into_iter()
            .filter_map(move |role| self.get(role).map(|column| (role, column)))
    }

    /// True when no role is mapped.
    pub fn is_empty(&self) -> bool {
        self.roles().next().is_none()
    }
}
