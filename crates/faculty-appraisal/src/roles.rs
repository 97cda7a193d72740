//! Portal roles and the dashboard shell each one is routed to.
//!
//! Role strings arrive from cookies and backend payloads in several spellings
//! ("Associate Dean", "associate-dean", "associate_dean"). They are mapped
//! through an explicit alias table; anything outside it is rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Paths any visitor may open regardless of role.
pub const PUBLIC_PATHS: [&str; 2] = ["/", "/forgot-password"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Director,
    Hod,
    Dean,
    AssociateDean,
    VerificationTeam,
    External,
    CollegeExternal,
    Faculty,
}

impl Role {
    pub const fn all() -> [Self; 9] {
        [
            Self::Admin,
            Self::Director,
            Self::Hod,
            Self::Dean,
            Self::AssociateDean,
            Self::VerificationTeam,
            Self::External,
            Self::CollegeExternal,
            Self::Faculty,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Director => "director",
            Self::Hod => "hod",
            Self::Dean => "dean",
            Self::AssociateDean => "associate_dean",
            Self::VerificationTeam => "verification_team",
            Self::External => "external",
            Self::CollegeExternal => "college_external",
            Self::Faculty => "faculty",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Director => "Director",
            Self::Hod => "Head of Department",
            Self::Dean => "Dean",
            Self::AssociateDean => "Associate Dean",
            Self::VerificationTeam => "Verification Team",
            Self::External => "External Reviewer",
            Self::CollegeExternal => "College External Reviewer",
            Self::Faculty => "Faculty",
        }
    }

    /// URL prefix owning every page of this role's shell.
    pub const fn path_prefix(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Director => "/director",
            Self::Hod => "/hod",
            Self::Dean => "/dean",
            Self::AssociateDean => "/associate-dean",
            Self::VerificationTeam => "/verification-team",
            Self::External => "/external",
            Self::CollegeExternal => "/college-external",
            Self::Faculty => "/faculty",
        }
    }

    pub fn dashboard_path(self) -> String {
        format!("{}/dashboard", self.path_prefix())
    }

    /// Whether this role may open `path`. Public paths are open to everyone and
    /// a path under another role's prefix is refused.
    pub fn permits_path(self, path: &str) -> bool {
        if PUBLIC_PATHS.contains(&path) {
            return true;
        }

        match Self::owner_of_path(path) {
            Some(owner) => owner == self,
            None => true,
        }
    }

    /// The role whose shell contains `path`, if any.
    pub fn owner_of_path(path: &str) -> Option<Self> {
        Self::all().into_iter().find(|role| {
            let prefix = role.path_prefix();
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .map(|rest| rest.starts_with('/'))
                    .unwrap_or(false)
        })
    }

    pub fn shell(self) -> DashboardShell {
        let prefix = self.path_prefix();
        let entry = |label: &'static str, page: &str| NavEntry {
            label,
            path: format!("{prefix}{page}"),
        };

        let mut navigation = vec![entry("Dashboard", "/dashboard")];
        match self {
            Self::Admin => navigation.push(entry("Users", "/users")),
            Self::Director => {
                navigation.push(entry("Faculty Forms", "/faculty-forms"));
                navigation.push(entry("Director Verification", "/director-verify"));
                navigation.push(entry("Assign External", "/assign-external"));
                navigation.push(entry("Add External", "/add-external"));
            }
            Self::AssociateDean => navigation.push(entry("Review", "/review")),
            Self::VerificationTeam => {
                navigation.push(entry("Verification Form", "/verification-form"))
            }
            Self::External | Self::CollegeExternal => {
                navigation.push(entry("Evaluate", "/evaluate"))
            }
            Self::Hod | Self::Dean => {
                navigation.push(entry("Appraisal Form", "/appraisal"));
                navigation.push(entry("Department Forms", "/faculty-forms"));
            }
            Self::Faculty => navigation.push(entry("Appraisal Form", "/appraisal")),
        }

        DashboardShell {
            role: self,
            title: format!("{} Dashboard", self.label()),
            home: self.dashboard_path(),
            navigation,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnrecognizedRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace([' ', '-'], "_");

        let role = match normalized.as_str() {
            "admin" | "administrator" => Self::Admin,
            "director" => Self::Director,
            "hod" | "head_of_department" => Self::Hod,
            "dean" => Self::Dean,
            "associate_dean" => Self::AssociateDean,
            "verification_team" | "verification" => Self::VerificationTeam,
            "external" | "external_reviewer" => Self::External,
            "college_external" => Self::CollegeExternal,
            "faculty" => Self::Faculty,
            _ => return Err(UnrecognizedRole(value.to_string())),
        };
        Ok(role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized role '{0}'")]
pub struct UnrecognizedRole(pub String);

/// What a role sees after login: its landing page and navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardShell {
    pub role: Role,
    pub title: String,
    pub home: String,
    pub navigation: Vec<NavEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub label: &'static str,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_spellings() {
        assert_eq!("Associate Dean".parse::<Role>(), Ok(Role::AssociateDean));
        assert_eq!("associate-dean".parse::<Role>(), Ok(Role::AssociateDean));
        assert_eq!(" HOD ".parse::<Role>(), Ok(Role::Hod));
        assert_eq!(
            "College External".parse::<Role>(),
            Ok(Role::CollegeExternal)
        );
    }

    #[test]
    fn rejects_substring_lookalikes() {
        assert!("event coordinator admin".parse::<Role>().is_err());
        assert!("superadmin".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn every_role_round_trips_through_its_wire_name() {
        for role in Role::all() {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn path_prefixes_do_not_shadow_each_other() {
        assert_eq!(
            Role::owner_of_path("/external/dashboard"),
            Some(Role::External)
        );
        assert_eq!(
            Role::owner_of_path("/college-external/dashboard"),
            Some(Role::CollegeExternal)
        );
        assert_eq!(Role::owner_of_path("/deanery"), None);
    }

    #[test]
    fn refuses_paths_owned_by_other_roles() {
        assert!(Role::Director.permits_path("/director/faculty-forms"));
        assert!(!Role::Faculty.permits_path("/director/faculty-forms"));
        assert!(Role::Faculty.permits_path("/"));
        assert!(Role::Faculty.permits_path("/forgot-password"));
    }

    #[test]
    fn shell_starts_at_dashboard() {
        let shell = Role::VerificationTeam.shell();
        assert_eq!(shell.home, "/verification-team/dashboard");
        assert_eq!(shell.navigation[0].path, shell.home);
        assert!(shell
            .navigation
            .iter()
            .all(|entry| Role::VerificationTeam.permits_path(&entry.path)));
    }
}
