use std::fmt;

/// Synthetic role id granting every privilege. Never stored in the role
/// table; recognized specially wherever role CSVs are parsed.
pub const ADMIN_ROLE_ID: i32 = 0;
pub const ADMIN_ROLE_NAME: &str = "Administrator";

/// Privilege ids recognized by the system.
pub const PRIVILEGE_ALL: i32 = 0;
pub const PRIVILEGE_EDIT_USERS: i32 = 1;
pub const PRIVILEGE_EDIT_ROLES: i32 = 2;
pub const PRIVILEGE_EDIT_ARTICLE: i32 = 3;
pub const PRIVILEGE_EDIT_ALL_ARTICLES: i32 = 4;
pub const PRIVILEGE_DELETE_ARTICLES: i32 = 5;
pub const PRIVILEGE_PUBLISH_ARTICLES: i32 = 6;
pub const PRIVILEGE_EDIT_CATEGORIES: i32 = 7;
pub const PRIVILEGE_EDIT_PAGES: i32 = 8;

/// A privilege catalog entry. The catalog is fixed at build time and is
/// not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Privilege {
    pub id: i32,
    pub title: &'static str,
    pub description: &'static str,
}

/// Every privilege the system recognizes. The "All Privileges" entry is
/// synthetic: it implicitly contains every other privilege and is granted
/// only through the administrator marker role.
pub const PRIVILEGE_CATALOG: &[Privilege] = &[
    Privilege {
        id: PRIVILEGE_ALL,
        title: "All Privileges",
        description: "Admins have all privileges defined in the system, plus a bit extra.",
    },
    Privilege {
        id: PRIVILEGE_EDIT_USERS,
        title: "Edit Users",
        description: "Enables the user to add users, activate/deactivate users, and manually change some information associated with accounts (email, username).",
    },
    Privilege {
        id: PRIVILEGE_EDIT_ROLES,
        title: "Edit Roles",
        description: "Enables the user to edit the permissions associated with user roles and define new roles. The user can assign roles to user accounts if they also have the \"Edit Users\" privilege.",
    },
    Privilege {
        id: PRIVILEGE_EDIT_ARTICLE,
        title: "Edit Article",
        description: "Enables a user to add new articles and edit/move unpublished articles that they own.",
    },
    Privilege {
        id: PRIVILEGE_EDIT_ALL_ARTICLES,
        title: "Edit All Articles",
        description: "Enables a user to add new articles and edit/move all unpublished articles.",
    },
    Privilege {
        id: PRIVILEGE_DELETE_ARTICLES,
        title: "Delete Articles",
        description: "Enables a user to delete any unpublished article.",
    },
    Privilege {
        id: PRIVILEGE_PUBLISH_ARTICLES,
        title: "Publish Articles",
        description: "Enables a user to publish/hide any article they are allowed to edit. Extends actions (edit, move, delete) to published articles.",
    },
    Privilege {
        id: PRIVILEGE_EDIT_CATEGORIES,
        title: "Edit Categories",
        description: "Enables a user to edit article categories. Article categories correspond directly to client website UI.",
    },
    Privilege {
        id: PRIVILEGE_EDIT_PAGES,
        title: "Edit Pages",
        description: "Enables a user to view and edit the settings on the \"Pages\" page to adjust non-article content on the website.",
    },
];

/// A role reference as it appears in an account's roles CSV.
///
/// The administrator marker is not a row in the role table, so every place
/// that interprets role ids matches on this enum rather than re-checking
/// the magic id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    AdminMarker,
    Persisted(i32),
}

impl Role {
    pub fn from_id(id: i32) -> Self {
        match id {
            ADMIN_ROLE_ID => Role::AdminMarker,
            other => Role::Persisted(other),
        }
    }
}

/// An ordered set of role ids: sorted ascending, deduplicated.
///
/// This is the single codec between the in-memory representation and the
/// CSV text stored in the `roles` columns. Parsing anywhere else is a bug.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleSet(Vec<i32>);

impl RoleSet {
    /// Build a set from arbitrary ids, deduplicating and sorting.
    pub fn from_ids(ids: impl IntoIterator<Item = i32>) -> Self {
        let mut ids: Vec<i32> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        RoleSet(ids)
    }

    /// Strict parse of a roles CSV. Returns the offending fragment when a
    /// value is not an integer.
    pub fn parse(csv: &str) -> Result<Self, String> {
        let mut ids = Vec::new();
        for fragment in csv.split(',') {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }
            match fragment.parse::<i32>() {
                Ok(id) => ids.push(id),
                Err(_) => return Err(fragment.to_string()),
            }
        }
        Ok(Self::from_ids(ids))
    }

    /// Permissive parse preserving order and duplicates. Fragments that are
    /// not integers are dropped; they can never match a catalog row anyway.
    pub fn parse_raw(csv: &str) -> Vec<i32> {
        csv.split(',')
            .filter_map(|fragment| fragment.trim().parse::<i32>().ok())
            .collect()
    }

    pub fn to_csv(&self) -> String {
        self.0
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn ids(&self) -> &[i32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: i32) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn contains_admin(&self) -> bool {
        self.contains(ADMIN_ROLE_ID)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_csv())
    }
}

/// The expansion of one roles CSV: ids as parsed, role names in id order,
/// and the deduplicated ascending union of the granted privilege ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedRoles {
    pub role_ids: Vec<i32>,
    pub role_names: Vec<String>,
    pub privileges: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ids_sorts_and_dedups() {
        let set = RoleSet::from_ids([3, 1, 3, 2, 1]);
        assert_eq!(set.ids(), &[1, 2, 3]);
        assert_eq!(set.to_csv(), "1,2,3");
    }

    #[test]
    fn parse_accepts_whitespace_and_empty_fragments() {
        let set = RoleSet::parse(" 2, 1 ,,2").unwrap();
        assert_eq!(set.ids(), &[1, 2]);
    }

    #[test]
    fn parse_rejects_non_numeric_fragments() {
        let err = RoleSet::parse("1,zebra,3").unwrap_err();
        assert_eq!(err, "zebra");
    }

    #[test]
    fn parse_empty_yields_empty_set() {
        let set = RoleSet::parse("").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.to_csv(), "");
    }

    #[test]
    fn parse_raw_keeps_order_and_duplicates() {
        assert_eq!(RoleSet::parse_raw("2,1,2"), vec![2, 1, 2]);
        assert_eq!(RoleSet::parse_raw("2,junk,1"), vec![2, 1]);
        assert!(RoleSet::parse_raw("").is_empty());
    }

    #[test]
    fn admin_marker_is_not_a_persisted_role() {
        assert_eq!(Role::from_id(ADMIN_ROLE_ID), Role::AdminMarker);
        assert_eq!(Role::from_id(4), Role::Persisted(4));
    }

    #[test]
    fn catalog_ids_are_unique_and_ascending() {
        for window in PRIVILEGE_CATALOG.windows(2) {
            assert!(window[0].id < window[1].id);
        }
    }
}
