use super::{AdminIdentity, AuthError, Role};

/// Extra list criteria forced by the caller's tenant scope. `None` fields
/// add no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantFilter {
    pub company_id: Option<String>,
    pub owner_id: Option<String>,
}

pub fn require_role<'a>(identity: &'a AdminIdentity, allowed: &[Role]) -> Result<&'a AdminIdentity, AuthError> {
    if allowed.contains(&identity.role()) {
        return Ok(identity);
    }

    tracing::debug!(
        admin_id = %identity.admin_id(),
        role = %identity.role(),
        "role requirement not met"
    );
    Err(AuthError::Forbidden {
        required: allowed.to_vec(),
    })
}

/// Whether `identity` may touch a resource tagged with these tenant
/// attributes. Same answer for read, update and delete.
pub fn check_permission(
    identity: &AdminIdentity,
    resource_company_id: Option<&str>,
    resource_store_id: Option<&str>,
) -> bool {
    match identity {
        AdminIdentity::SystemAdmin { .. } => true,
        AdminIdentity::CompanyAdmin { company_id, .. } => resource_company_id == Some(company_id.as_str()),
        // exact store match, sharing the company is not enough
        AdminIdentity::StoreUser { store_id, .. } => resource_store_id == Some(store_id.as_str()),
    }
}

/// Account-level access: the tenant check plus the store user's self scope.
pub fn can_access_account(
    identity: &AdminIdentity,
    account_id: &str,
    account_company_id: Option<&str>,
    account_store_id: Option<&str>,
) -> bool {
    if !check_permission(identity, account_company_id, account_store_id) {
        return false;
    }

    match identity {
        AdminIdentity::StoreUser { admin_id, .. } => admin_id == account_id,
        _ => true,
    }
}

pub fn derive_list_filter(identity: &AdminIdentity) -> TenantFilter {
    match identity {
        AdminIdentity::SystemAdmin { .. } => TenantFilter::default(),
        AdminIdentity::CompanyAdmin { company_id, .. } => TenantFilter {
            company_id: Some(company_id.clone()),
            owner_id: None,
        },
        AdminIdentity::StoreUser { admin_id, .. } => TenantFilter {
            company_id: None,
            owner_id: Some(admin_id.clone()),
        },
    }
}

pub fn ensure_not_self(identity: &AdminIdentity, target_account_id: &str) -> Result<(), AuthError> {
    if identity.admin_id() == target_account_id {
        return Err(AuthError::SelfDelete);
    }
    Ok(())
}

/// Constrains the content of an account write. `creating` selects the
/// create rule for the company id: on create the target company must be the
/// caller's own, on update it may only be omitted or left at the caller's own.
pub fn check_account_write(
    identity: &AdminIdentity,
    requested_role: Option<Role>,
    requested_company_id: Option<&str>,
    creating: bool,
) -> Result<(), AuthError> {
    match identity {
        AdminIdentity::SystemAdmin { .. } => Ok(()),
        AdminIdentity::CompanyAdmin { company_id, .. } => {
            if requested_role == Some(Role::SystemAdmin) {
                return Err(AuthError::Escalation(
                    "company administrators cannot grant the system_admin role".into(),
                ));
            }

            let foreign_company = match requested_company_id {
                Some(requested) => requested != company_id,
                None => creating,
            };
            if foreign_company {
                return Err(AuthError::Escalation(
                    "company administrators can only manage accounts of their own company".into(),
                ));
            }
            Ok(())
        }
        AdminIdentity::StoreUser { .. } => Err(AuthError::Forbidden {
            required: vec![Role::SystemAdmin, Role::CompanyAdmin],
        }),
    }
}
