use sea_orm::ConnectionTrait;

use crate::errors::UserError;
use crate::stores::RoleStore;
use crate::types::internal::roles::{
    ResolvedRoles, Role, RoleSet, ADMIN_ROLE_NAME, PRIVILEGE_ALL,
};

/// Expands stored role-id CSVs into role names and privilege snapshots.
///
/// Used at sign-in to build the privilege claim, and when rendering user
/// lists and history to turn ids into display names.
pub struct RoleResolver {
    roles: RoleStore,
}

impl RoleResolver {
    pub fn new() -> Self {
        Self {
            roles: RoleStore::new(),
        }
    }

    /// Resolve a batch of roles CSVs against one catalog fetch.
    ///
    /// Each output entry keeps the ids as parsed (order and duplicates
    /// intact) and carries the deduplicated ascending union of privilege
    /// ids. Ids absent from the catalog are skipped; the validator is the
    /// strict gate, not this path.
    pub async fn resolve_many(
        &self,
        conn: &impl ConnectionTrait,
        role_csvs: &[String],
    ) -> Result<Vec<ResolvedRoles>, UserError> {
        let catalog = self.roles.catalog(conn).await?;

        let mut output = Vec::with_capacity(role_csvs.len());
        for csv in role_csvs {
            if csv.trim().is_empty() {
                output.push(ResolvedRoles::default());
                continue;
            }

            let role_ids = RoleSet::parse_raw(csv);
            let mut role_names = Vec::new();
            let mut privileges: Vec<i32> = Vec::new();

            for &rid in &role_ids {
                match Role::from_id(rid) {
                    // The admin marker has no catalog row; it grants the
                    // all-privileges id directly.
                    Role::AdminMarker => {
                        role_names.push(ADMIN_ROLE_NAME.to_string());
                        if !privileges.contains(&PRIVILEGE_ALL) {
                            privileges.push(PRIVILEGE_ALL);
                        }
                    }
                    Role::Persisted(id) => {
                        if let Some(role) = catalog.iter().find(|r| r.id == id) {
                            role_names.push(role.name.clone());
                            for pid in RoleSet::parse_raw(&role.privileges) {
                                if !privileges.contains(&pid) {
                                    privileges.push(pid);
                                }
                            }
                        }
                    }
                }
            }

            privileges.sort_unstable();
            output.push(ResolvedRoles {
                role_ids,
                role_names,
                privileges,
            });
        }

        Ok(output)
    }

    /// Resolve a single roles CSV.
    pub async fn resolve_single(
        &self,
        conn: &impl ConnectionTrait,
        roles_csv: &str,
    ) -> Result<ResolvedRoles, UserError> {
        let mut resolved = self
            .resolve_many(conn, &[roles_csv.to_string()])
            .await?;
        Ok(resolved.pop().unwrap_or_default())
    }
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new()
    }
}
