use std::sync::Arc;

use uuid::Uuid;

use crate::authz::{
    can_access_account, check_account_write, derive_list_filter, ensure_not_self, require_role, AdminIdentity,
    AuthError, Role,
};
use crate::errors::{AppError, AppResult, FieldError};
use crate::jwt::TokenCodec;
use crate::models::account::{
    Account, AccountChanges, AccountCreateRequest, AccountFilter, AccountUpdateRequest, DbAccount, LoginResponse,
};
use crate::models::common::{Page, PageRequest};
use crate::store::AccountStore;
use crate::utils::{hash_password, utc_now, verify_password};
use crate::validation::is_valid_email;

const ACCOUNT_WRITERS: [Role; 2] = [Role::SystemAdmin, Role::CompanyAdmin];

/// Admin account management with tenant scoping.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, identity: &AdminIdentity, filter: AccountFilter, page: PageRequest) -> AppResult<Page<Account>> {
        let filter = filter.with_tenant(derive_list_filter(identity));
        let rows = self.store.list(&filter).await?;

        // the store may ignore parts of the filter, so every row is re-checked
        let visible = rows
            .into_iter()
            .filter(|row| {
                can_access_account(identity, &row.account_id, row.company_id.as_deref(), row.store_id.as_deref())
            })
            .map(Account::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(page.paginate(visible))
    }

    pub async fn get(&self, identity: &AdminIdentity, account_id: &str) -> AppResult<Account> {
        let row = self.fetch_accessible(identity, account_id).await?;
        row.try_into()
    }

    pub async fn create(&self, identity: &AdminIdentity, request: AccountCreateRequest) -> AppResult<Account> {
        require_role(identity, &ACCOUNT_WRITERS)?;
        check_account_write(identity, Some(request.role), request.company_id.as_deref(), true)?;

        let username = request.username.trim().to_string();
        let mut errors = Vec::new();
        if username.is_empty() {
            errors.push(FieldError::new("username", "required"));
        }
        if request.name.trim().is_empty() {
            errors.push(FieldError::new("name", "required"));
        }
        if !is_valid_email(&request.email) {
            errors.push(FieldError::new("email", "invalid email address"));
        }
        errors.extend(tenant_field_errors(
            request.role,
            request.company_id.as_deref(),
            request.store_id.as_deref(),
        ));
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        if self.store.find_by_username(&username).await?.is_some() {
            return Err(AppError::conflict(format!("username {username} is already taken")));
        }

        let now = utc_now();
        let row = DbAccount {
            account_id: Uuid::new_v4().to_string(),
            username,
            name: request.name,
            email: request.email,
            password_hash: hash_password(&request.password)?,
            role: request.role.as_str().to_string(),
            company_id: request.company_id,
            company_name: request.company_name,
            store_id: request.store_id,
            store_name: request.store_name,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        self.store.insert(&row).await?;

        tracing::info!(
            account_id = %row.account_id,
            role = %row.role,
            created_by = %identity.admin_id(),
            "account created"
        );
        row.try_into()
    }

    pub async fn update(
        &self,
        identity: &AdminIdentity,
        account_id: &str,
        request: AccountUpdateRequest,
    ) -> AppResult<Account> {
        require_role(identity, &ACCOUNT_WRITERS)?;
        check_account_write(identity, request.role, request.company_id.as_deref(), false)?;

        let existing = self.fetch_accessible(identity, account_id).await?;
        let existing_role: Role = existing
            .role
            .parse()
            .map_err(|_| AppError::internal(format!("account {account_id} has unknown role {}", existing.role)))?;

        let mut errors = Vec::new();
        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                errors.push(FieldError::new("name", "must not be empty"));
            }
        }
        if let Some(email) = &request.email {
            if !is_valid_email(email) {
                errors.push(FieldError::new("email", "invalid email address"));
            }
        }

        let role = request.role.unwrap_or(existing_role);
        let clear_tenant = role == Role::SystemAdmin && (existing.company_id.is_some() || existing.store_id.is_some());
        if role == Role::SystemAdmin {
            errors.extend(tenant_field_errors(role, request.company_id.as_deref(), request.store_id.as_deref()));
        } else {
            let company_id = request.company_id.as_deref().or(existing.company_id.as_deref());
            let store_id = request.store_id.as_deref().or(existing.store_id.as_deref());
            errors.extend(tenant_field_errors(role, company_id, store_id));
        }
        if !errors.is_empty() {
            return Err(AppError::validation(errors));
        }

        let password_hash = match request.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let changes = AccountChanges {
            name: request.name,
            email: request.email,
            password_hash,
            role: request.role,
            company_id: request.company_id,
            company_name: request.company_name,
            store_id: request.store_id,
            store_name: request.store_name,
            clear_tenant,
            updated_at: Some(utc_now()),
        };

        let updated = self
            .store
            .update(account_id, &changes)
            .await?
            .ok_or_else(|| AppError::not_found("account not found"))?;

        tracing::info!(account_id = %account_id, updated_by = %identity.admin_id(), "account updated");
        updated.try_into()
    }

    pub async fn delete(&self, identity: &AdminIdentity, account_id: &str) -> AppResult<()> {
        ensure_not_self(identity, account_id)?;
        self.fetch_accessible(identity, account_id).await?;

        if !self.store.delete(account_id).await? {
            return Err(AppError::not_found("account not found"));
        }

        tracing::info!(account_id = %account_id, deleted_by = %identity.admin_id(), "account deleted");
        Ok(())
    }

    /// Verifies credentials, records the login and issues an admin token.
    pub async fn login(&self, codec: &TokenCodec, username: &str, password: &str) -> AppResult<LoginResponse> {
        let invalid = || AppError::unauthorized("invalid username or password");

        let row = self.store.find_by_username(username).await?.ok_or_else(invalid)?;
        if !verify_password(password, &row.password_hash)? {
            tracing::info!(username = %username, "admin login rejected");
            return Err(invalid());
        }

        let role: Role = row
            .role
            .parse()
            .map_err(|_| AppError::internal(format!("account {} has unknown role {}", row.account_id, row.role)))?;
        let identity = AdminIdentity::new(row.account_id.clone(), role, row.company_id.clone(), row.store_id.clone())
            .map_err(|err| AppError::internal(format!("account {} is inconsistent: {err}", row.account_id)))?;
        let token = codec.issue_admin_token(&identity)?;

        let now = utc_now();
        self.store.record_login(&row.account_id, now).await?;

        let mut admin: Account = row.try_into()?;
        admin.last_login_at = Some(now);

        tracing::info!(account_id = %admin.account_id, role = %admin.role, "admin logged in");
        Ok(LoginResponse { token, admin })
    }

    /// Existence first, then tenant access.
    async fn fetch_accessible(&self, identity: &AdminIdentity, account_id: &str) -> AppResult<DbAccount> {
        let row = self
            .store
            .get(account_id)
            .await?
            .ok_or_else(|| AppError::not_found("account not found"))?;

        if !can_access_account(identity, &row.account_id, row.company_id.as_deref(), row.store_id.as_deref()) {
            tracing::debug!(
                admin_id = %identity.admin_id(),
                account_id = %account_id,
                "account outside tenant scope"
            );
            return Err(AuthError::TenantMismatch.into());
        }
        Ok(row)
    }
}

fn tenant_field_errors(role: Role, company_id: Option<&str>, store_id: Option<&str>) -> Vec<FieldError> {
    let present = |value: Option<&str>| value.is_some_and(|v| !v.trim().is_empty());
    let mut errors = Vec::new();

    match role {
        Role::SystemAdmin => {
            if company_id.is_some() {
                errors.push(FieldError::new("companyId", "must not be set for system_admin"));
            }
            if store_id.is_some() {
                errors.push(FieldError::new("storeId", "must not be set for system_admin"));
            }
        }
        Role::CompanyAdmin => {
            if !present(company_id) {
                errors.push(FieldError::new("companyId", "required for company_admin"));
            }
        }
        Role::StoreUser => {
            if !present(company_id) {
                errors.push(FieldError::new("companyId", "required for store_user"));
            }
            if !present(store_id) {
                errors.push(FieldError::new("storeId", "required for store_user"));
            }
        }
    }
    errors
}
