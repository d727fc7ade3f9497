use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SharedError;

/// Account role. Closed set; every permission decision goes through
/// [`Role::can`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reporter,
    Superadmin,
}

/// Something a request wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Submit an article for approval through the reporter form.
    SubmitArticle,
    /// Submit through the admin upload form.
    PublishAsAdmin,
    /// Edit an existing article.
    EditArticle,
    /// Approve, feature, unfeature and delete articles; see pending items.
    ModerateArticles,
    /// List, approve and delete reporter accounts.
    ManageReporters,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Reporter => "reporter",
            Role::Superadmin => "superadmin",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Reporter => &[SubmitArticle],
            Role::Admin => &[SubmitArticle, PublishAsAdmin, EditArticle],
            Role::Superadmin => &[
                SubmitArticle,
                PublishAsAdmin,
                EditArticle,
                ModerateArticles,
                ManageReporters,
            ],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "reporter" => Ok(Role::Reporter),
            "superadmin" => Ok(Role::Superadmin),
            other => Err(SharedError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Reporter, Role::Superadmin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("editor".parse::<Role>().is_err());
    }

    #[test]
    fn test_reporter_capabilities() {
        assert!(Role::Reporter.can(Capability::SubmitArticle));
        assert!(!Role::Reporter.can(Capability::PublishAsAdmin));
        assert!(!Role::Reporter.can(Capability::EditArticle));
        assert!(!Role::Reporter.can(Capability::ModerateArticles));
    }

    #[test]
    fn test_admin_cannot_moderate() {
        assert!(Role::Admin.can(Capability::EditArticle));
        assert!(!Role::Admin.can(Capability::ModerateArticles));
        assert!(!Role::Admin.can(Capability::ManageReporters));
    }

    #[test]
    fn test_superadmin_can_everything() {
        use Capability::*;
        for cap in [
            SubmitArticle,
            PublishAsAdmin,
            EditArticle,
            ModerateArticles,
            ManageReporters,
        ] {
            assert!(Role::Superadmin.can(cap));
        }
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Superadmin).unwrap(), "\"superadmin\"");
    }
}
