use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    AdvanceReturn, AdvanceReturnCmd, AdvanceReturnPatch, EngineError, MoneyCents, Party,
    ResultEngine, Series, advance_returns,
    util::{apply_optional_text_patch, normalize_optional_text, require_positive},
};

use super::{Engine, parties::require_company, projections::ProjectionChanges};

impl Engine {
    /// Hands advance credit back.
    ///
    /// - [`Party::Client`]: the agency refunds client credit; the client
    ///   balance and the account both decrease.
    /// - [`Party::Vendor`]: the vendor refunds prepaid money; the vendor
    ///   balance moves toward Due and the account increases.
    pub async fn create_advance_return(
        &self,
        cmd: AdvanceReturnCmd,
    ) -> ResultEngine<AdvanceReturn> {
        let company_id = require_company(&cmd.company_id)?;
        require_positive(cmd.amount_minor, "amount")?;

        let voucher_no = self
            .next_voucher(Series::AdvanceReturn, &company_id)
            .await?;
        let advance_return = AdvanceReturn {
            id: Uuid::new_v4(),
            company_id,
            voucher_no,
            party: cmd.party,
            amount: MoneyCents::new(cmd.amount_minor),
            account_id: cmd.account_id,
            return_date: cmd.return_date,
            note: normalize_optional_text(cmd.note.as_deref()),
        };
        let created_at = Utc::now();

        self.with_tx(|engine, db_tx| {
            let advance_return = advance_return.clone();
            Box::pin(async move {
                advance_return
                    .to_active_model(created_at)
                    .insert(db_tx)
                    .await?;
                let mut changes = ProjectionChanges::default();
                engine
                    .apply_advance_return(db_tx, &advance_return, &mut changes)
                    .await?;
                engine
                    .persist_changes(db_tx, &advance_return.company_id, &changes)
                    .await
            })
        })
        .await?;

        tracing::info!(
            company_id = %advance_return.company_id,
            amount_minor = advance_return.amount.cents(),
            "advance return {} for {} {}",
            advance_return.voucher_no,
            advance_return.party.kind_str(),
            advance_return.party.id()
        );
        Ok(advance_return)
    }

    /// Edits amount, account, date or note. The party is fixed.
    pub async fn update_advance_return(
        &self,
        company_id: &str,
        return_id: Uuid,
        patch: AdvanceReturnPatch,
    ) -> ResultEngine<AdvanceReturn> {
        let company_id = require_company(company_id)?;
        if let Some(amount) = patch.amount_minor {
            require_positive(amount, "amount")?;
        }

        let advance_return = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                let patch = patch.clone();
                Box::pin(async move {
                    let model = engine
                        .require_advance_return(db_tx, &company_id, return_id)
                        .await?;
                    let old = AdvanceReturn::try_from(model.clone())?;
                    let updated = AdvanceReturn {
                        amount: patch.amount_minor.map(MoneyCents::new).unwrap_or(old.amount),
                        account_id: patch.account_id.unwrap_or(old.account_id),
                        return_date: patch.return_date.unwrap_or(old.return_date),
                        note: apply_optional_text_patch(old.note.clone(), patch.note.as_deref()),
                        ..old.clone()
                    };

                    let mut changes = ProjectionChanges::default();
                    reverse_advance_return(&old, &mut changes);
                    engine
                        .apply_advance_return(db_tx, &updated, &mut changes)
                        .await?;
                    updated
                        .to_active_model(model.created_at)
                        .update(db_tx)
                        .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    Ok(updated)
                })
            })
            .await?;

        tracing::info!("advance return {} updated", advance_return.voucher_no);
        Ok(advance_return)
    }

    pub async fn delete_advance_return(
        &self,
        company_id: &str,
        return_id: Uuid,
    ) -> ResultEngine<()> {
        let company_id = require_company(company_id)?;
        let voucher_no = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                Box::pin(async move {
                    let model = engine
                        .require_advance_return(db_tx, &company_id, return_id)
                        .await?;
                    let old = AdvanceReturn::try_from(model)?;
                    let mut changes = ProjectionChanges::default();
                    reverse_advance_return(&old, &mut changes);
                    advance_returns::Entity::delete_by_id(old.id.to_string())
                        .exec(db_tx)
                        .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    Ok(old.voucher_no)
                })
            })
            .await?;

        tracing::info!("advance return {voucher_no} deleted");
        Ok(())
    }

    pub async fn advance_return(
        &self,
        company_id: &str,
        return_id: Uuid,
    ) -> ResultEngine<AdvanceReturn> {
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let model = engine
                    .require_advance_return(db_tx, &company_id, return_id)
                    .await?;
                AdvanceReturn::try_from(model)
            })
        })
        .await
    }

    async fn require_advance_return(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        return_id: Uuid,
    ) -> ResultEngine<advance_returns::Model> {
        advance_returns::Entity::find_by_id(return_id.to_string())
            .filter(advance_returns::Column::CompanyId.eq(company_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("advance return {return_id}")))
    }

    async fn apply_advance_return(
        &self,
        db_tx: &DatabaseTransaction,
        advance_return: &AdvanceReturn,
        changes: &mut ProjectionChanges,
    ) -> ResultEngine<()> {
        let company_id = advance_return.company_id.as_str();
        let amount = advance_return.amount.cents();
        self.require_account(db_tx, company_id, advance_return.account_id)
            .await?;
        match advance_return.party {
            Party::Client(client_id) => {
                self.require_client(db_tx, company_id, client_id).await?;
                changes.client(client_id, -amount);
                changes.account_outflow(advance_return.account_id, amount);
            }
            Party::Vendor(vendor_id) => {
                self.require_vendor(db_tx, company_id, vendor_id).await?;
                changes.vendor(vendor_id, -amount);
                changes.account_inflow(advance_return.account_id, amount);
            }
        }
        Ok(())
    }
}

fn reverse_advance_return(advance_return: &AdvanceReturn, changes: &mut ProjectionChanges) {
    let amount = advance_return.amount.cents();
    match advance_return.party {
        Party::Client(client_id) => {
            changes.client(client_id, amount);
            changes.account_reversal(advance_return.account_id, amount);
        }
        Party::Vendor(vendor_id) => {
            changes.vendor(vendor_id, amount);
            changes.account_reversal(advance_return.account_id, -amount);
        }
    }
}
