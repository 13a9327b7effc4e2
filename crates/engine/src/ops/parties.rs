use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Account, Client, EngineError, MoneyCents, NewAccountCmd, NewClientCmd, NewVendorCmd,
    ResultEngine, Vendor, accounts, clients, invoices,
    util::{normalize_optional_text, normalize_required_name, require_non_negative},
    vendors,
};

use super::Engine;

pub(crate) fn require_company(company_id: &str) -> ResultEngine<String> {
    let trimmed = company_id.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(
            "company id must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

impl Engine {
    pub(crate) async fn require_account_str(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        account_id: &str,
    ) -> ResultEngine<accounts::Model> {
        accounts::Entity::find_by_id(account_id.to_string())
            .filter(accounts::Column::CompanyId.eq(company_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account {account_id}")))
    }

    pub(crate) async fn require_account(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<accounts::Model> {
        self.require_account_str(db_tx, company_id, &account_id.to_string())
            .await
    }

    pub(crate) async fn require_client_str(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        client_id: &str,
    ) -> ResultEngine<clients::Model> {
        clients::Entity::find_by_id(client_id.to_string())
            .filter(clients::Column::CompanyId.eq(company_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("client {client_id}")))
    }

    pub(crate) async fn require_client(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        client_id: Uuid,
    ) -> ResultEngine<clients::Model> {
        self.require_client_str(db_tx, company_id, &client_id.to_string())
            .await
    }

    pub(crate) async fn require_vendor_str(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        vendor_id: &str,
    ) -> ResultEngine<vendors::Model> {
        vendors::Entity::find_by_id(vendor_id.to_string())
            .filter(vendors::Column::CompanyId.eq(company_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("vendor {vendor_id}")))
    }

    pub(crate) async fn require_vendor(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        vendor_id: Uuid,
    ) -> ResultEngine<vendors::Model> {
        self.require_vendor_str(db_tx, company_id, &vendor_id.to_string())
            .await
    }

    pub(crate) async fn require_invoice_str(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        invoice_id: &str,
    ) -> ResultEngine<invoices::Model> {
        invoices::Entity::find_by_id(invoice_id.to_string())
            .filter(invoices::Column::CompanyId.eq(company_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("invoice {invoice_id}")))
    }

    /// Creates an account. Only credit cards may open below zero.
    pub async fn new_account(&self, cmd: NewAccountCmd) -> ResultEngine<Account> {
        let company_id = require_company(&cmd.company_id)?;
        let name = normalize_required_name(&cmd.name, "account")?;
        if !cmd.kind.allows_overdraft() {
            require_non_negative(cmd.opening_balance_minor, "opening balance")?;
        }
        let account = Account::new(
            company_id,
            name,
            cmd.kind,
            MoneyCents::new(cmd.opening_balance_minor),
        );
        account
            .to_active_model(Utc::now())
            .insert(&self.database)
            .await?;
        tracing::info!("account {} ({}) created", account.name, account.id);
        Ok(account)
    }

    pub async fn new_client(&self, cmd: NewClientCmd) -> ResultEngine<Client> {
        let company_id = require_company(&cmd.company_id)?;
        let name = normalize_required_name(&cmd.name, "client")?;
        require_non_negative(cmd.credit_limit_minor, "credit limit")?;
        let client = Client::new(
            company_id,
            name,
            normalize_optional_text(cmd.category.as_deref()),
            MoneyCents::new(cmd.credit_limit_minor),
            MoneyCents::new(cmd.opening_balance_minor),
        );
        client
            .to_active_model(Utc::now())
            .insert(&self.database)
            .await?;
        tracing::info!("client {} ({}) created", client.name, client.id);
        Ok(client)
    }

    pub async fn new_vendor(&self, cmd: NewVendorCmd) -> ResultEngine<Vendor> {
        let company_id = require_company(&cmd.company_id)?;
        let name = normalize_required_name(&cmd.name, "vendor")?;
        let vendor = Vendor::new(company_id, name, cmd.opening_balance);
        vendor
            .to_active_model(Utc::now())
            .insert(&self.database)
            .await?;
        tracing::info!("vendor {} ({}) created", vendor.name, vendor.id);
        Ok(vendor)
    }

    pub async fn account(&self, company_id: &str, account_id: Uuid) -> ResultEngine<Account> {
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let model = engine.require_account(db_tx, &company_id, account_id).await?;
                Account::try_from(model)
            })
        })
        .await
    }

    pub async fn client(&self, company_id: &str, client_id: Uuid) -> ResultEngine<Client> {
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let model = engine.require_client(db_tx, &company_id, client_id).await?;
                Client::try_from(model)
            })
        })
        .await
    }

    pub async fn vendor(&self, company_id: &str, vendor_id: Uuid) -> ResultEngine<Vendor> {
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let model = engine.require_vendor(db_tx, &company_id, vendor_id).await?;
                Vendor::try_from(model)
            })
        })
        .await
    }

    /// All accounts of a company, by name.
    pub async fn accounts(&self, company_id: &str) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id))
            .order_by_asc(accounts::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    pub async fn clients(&self, company_id: &str) -> ResultEngine<Vec<Client>> {
        clients::Entity::find()
            .filter(clients::Column::CompanyId.eq(company_id))
            .order_by_asc(clients::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Client::try_from)
            .collect()
    }

    pub async fn vendors(&self, company_id: &str) -> ResultEngine<Vec<Vendor>> {
        vendors::Entity::find()
            .filter(vendors::Column::CompanyId.eq(company_id))
            .order_by_asc(vendors::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Vendor::try_from)
            .collect()
    }
}
