//! Account repository: the chart-of-accounts registry.

use std::collections::HashMap;

use backoffice_core::ledger::{AccountInfo, AccountPatch, AccountType, LedgerError, LedgerService};
use backoffice_shared::AccountCodeMap;
use backoffice_shared::types::{AccountId, BusinessId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::entities::{accounts, gl_entries};
use crate::error::StoreError;

/// Code of the owner's equity account in the seeded chart.
pub const OWNER_EQUITY_CODE: &str = "3000";

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Chart-of-accounts code, unique per business.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// System accounts are created by onboarding.
    pub is_system: bool,
}

/// Chart-of-accounts lookups and maintenance.
pub struct AccountRepository;

impl AccountRepository {
    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns `EmptyAccountField` or `DuplicateAccountCode`.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, StoreError> {
        LedgerService::validate_new_account(&input.code, &input.name)?;
        let code = input.code.trim().to_string();

        if Self::find_by_code(conn, business_id, &code).await?.is_some() {
            return Err(LedgerError::DuplicateAccountCode(code).into());
        }

        let now = chrono::Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            business_id: Set(business_id.into_inner()),
            code: Set(code),
            name: Set(input.name.trim().to_string()),
            account_type: Set(input.account_type.into()),
            is_system: Set(input.is_system),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let account = account.insert(conn).await?;
        tracing::info!(business_id = %business_id, code = %account.code, "account created");
        Ok(account)
    }

    /// Applies a typed patch to an account.
    ///
    /// Code and type are frozen once ledger lines reference the account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `DuplicateAccountCode`, or a patch
    /// validation error.
    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        account_id: AccountId,
        patch: AccountPatch,
    ) -> Result<accounts::Model, StoreError> {
        let account = accounts::Entity::find_by_id(account_id.into_inner())
            .filter(accounts::Column::BusinessId.eq(business_id.into_inner()))
            .one(conn)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;

        if patch.is_empty() {
            return Ok(account);
        }

        let has_entries = Self::has_entries(conn, account_id).await?;
        LedgerService::validate_account_patch(&to_info(&account), &patch, has_entries)?;

        if let Some(code) = &patch.code
            && *code != account.code
        {
            let taken = accounts::Entity::find()
                .filter(accounts::Column::BusinessId.eq(business_id.into_inner()))
                .filter(accounts::Column::Code.eq(code.as_str()))
                .filter(accounts::Column::Id.ne(account.id))
                .count(conn)
                .await?;
            if taken > 0 {
                return Err(LedgerError::DuplicateAccountCode(code.clone()).into());
            }
        }

        let now = chrono::Utc::now().into();
        let mut active: accounts::ActiveModel = account.into();
        if let Some(code) = patch.code {
            active.code = Set(code);
        }
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(account_type) = patch.account_type {
            active.account_type = Set(account_type.into());
        }
        active.updated_at = Set(now);

        Ok(active.update(conn).await?)
    }

    /// Finds an account by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        code: &str,
    ) -> Result<Option<AccountInfo>, StoreError> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::BusinessId.eq(business_id.into_inner()))
            .filter(accounts::Column::Code.eq(code))
            .one(conn)
            .await?;
        Ok(account.as_ref().map(to_info))
    }

    /// Resolves a set of codes in one query. Unknown codes are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_codes<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        codes: &[&str],
    ) -> Result<HashMap<String, AccountInfo>, StoreError> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = accounts::Entity::find()
            .filter(accounts::Column::BusinessId.eq(business_id.into_inner()))
            .filter(accounts::Column::Code.is_in(codes.iter().copied()))
            .all(conn)
            .await?;
        Ok(rows.iter().map(|a| (a.code.clone(), to_info(a))).collect())
    }

    /// Lists the chart of accounts ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
    ) -> Result<Vec<accounts::Model>, StoreError> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::BusinessId.eq(business_id.into_inner()))
            .order_by_asc(accounts::Column::Code)
            .all(conn)
            .await?)
    }

    /// Returns true if any ledger line references the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn has_entries<C: ConnectionTrait>(
        conn: &C,
        account_id: AccountId,
    ) -> Result<bool, StoreError> {
        let count = gl_entries::Entity::find()
            .filter(gl_entries::Column::AccountId.eq(account_id.into_inner()))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    /// Creates the onboarding chart for a business. Existing codes are skipped,
    /// so running it twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn seed_default_chart<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        codes: &AccountCodeMap,
    ) -> Result<Vec<accounts::Model>, StoreError> {
        let chart = default_chart(codes);
        let wanted: Vec<&str> = chart.iter().map(|(code, _, _)| code.as_str()).collect();
        let existing = Self::find_by_codes(conn, business_id, &wanted).await?;

        let mut created = Vec::new();
        for (code, name, account_type) in chart {
            if existing.contains_key(&code) {
                continue;
            }
            let input = CreateAccountInput {
                code,
                name: name.to_string(),
                account_type,
                is_system: true,
            };
            created.push(Self::create(conn, business_id, input).await?);
        }
        tracing::debug!(business_id = %business_id, created = created.len(), "default chart seeded");
        Ok(created)
    }
}

/// Accounts every business starts with, keyed by the configured codes.
#[must_use]
pub fn default_chart(codes: &AccountCodeMap) -> Vec<(String, &'static str, AccountType)> {
    vec![
        (codes.cash.clone(), "Cash on Hand", AccountType::Asset),
        (codes.bank.clone(), "Bank", AccountType::Asset),
        (codes.accounts_receivable.clone(), "Accounts Receivable", AccountType::Asset),
        (codes.inventory.clone(), "Inventory", AccountType::Asset),
        (codes.sales_tax_payable.clone(), "Sales Tax Payable", AccountType::Liability),
        (OWNER_EQUITY_CODE.to_string(), "Owner's Equity", AccountType::Equity),
        (codes.sales_revenue.clone(), "Sales Revenue", AccountType::Income),
        (codes.cost_of_goods_sold.clone(), "Cost of Goods Sold", AccountType::Expense),
    ]
}

pub(crate) fn to_info(model: &accounts::Model) -> AccountInfo {
    AccountInfo {
        id: AccountId::from_uuid(model.id),
        code: model.code.clone(),
        name: model.name.clone(),
        account_type: model.account_type.into(),
    }
}

/// Dedup helper for code lookups.
pub(crate) fn distinct_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = codes.into_iter().collect();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_chart_uses_configured_codes() {
        let mut codes = AccountCodeMap::default();
        codes.cash = "1001".to_string();
        let chart = default_chart(&codes);
        assert!(chart.iter().any(|(c, _, t)| c == "1001" && *t == AccountType::Asset));
        assert!(chart.iter().any(|(c, _, t)| c == OWNER_EQUITY_CODE && *t == AccountType::Equity));
    }

    #[test]
    fn test_default_chart_codes_are_unique() {
        let chart = default_chart(&AccountCodeMap::default());
        let unique: HashSet<_> = chart.iter().map(|(c, _, _)| c.as_str()).collect();
        assert_eq!(unique.len(), chart.len());
    }

    #[test]
    fn test_distinct_codes() {
        assert_eq!(distinct_codes(["4000", "1100", "4000"]), vec!["1100", "4000"]);
    }
}
