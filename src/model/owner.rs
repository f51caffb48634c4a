use std::fmt;

/// Who owns an application: the authenticated account or an organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Owner {
    #[default]
    SelfAccount,
    Organization(String),
}

impl Owner {
    /// Absent or blank organization ids route to the calling account.
    pub fn from_organization(organization_id: Option<&str>) -> Self {
        match organization_id.map(str::trim) {
            Some(id) if !id.is_empty() => Owner::Organization(id.to_string()),
            _ => Owner::SelfAccount,
        }
    }

    pub fn organization_id(&self) -> Option<&str> {
        match self {
            Owner::SelfAccount => None,
            Owner::Organization(id) => Some(id),
        }
    }

    pub fn is_self(&self) -> bool {
        matches!(self, Owner::SelfAccount)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::SelfAccount => write!(f, "self"),
            Owner::Organization(id) => write!(f, "organization:{}", id),
        }
    }
}
