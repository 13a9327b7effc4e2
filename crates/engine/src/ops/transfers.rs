use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    BalanceTransfer, ChargeBearer, EngineError, MoneyCents, ResultEngine, Series, TransferCmd,
    TransferPatch,
    balance_transfers::{self, transfer_legs},
    util::{
        apply_optional_text_patch, normalize_optional_text, parse_uuid, require_non_negative,
        require_positive,
    },
};

use super::{Engine, parties::require_company, projections::ProjectionChanges};

/// Transfer fields an edit may change.
#[derive(Clone, Debug)]
struct TransferTerms {
    from_account_id: Uuid,
    to_account_id: Uuid,
    amount: i64,
    charge: i64,
    bearer: ChargeBearer,
    transfer_date: NaiveDate,
    note: Option<String>,
}

fn validate_terms(terms: &TransferTerms) -> ResultEngine<()> {
    if terms.from_account_id == terms.to_account_id {
        return Err(EngineError::Validation(
            "source and destination accounts must differ".to_string(),
        ));
    }
    require_positive(terms.amount, "amount")?;
    require_non_negative(terms.charge, "transfer charge")?;
    if terms.bearer == ChargeBearer::Receiver && terms.charge > terms.amount {
        return Err(EngineError::Validation(
            "transfer charge must not exceed amount".to_string(),
        ));
    }
    terms
        .amount
        .checked_add(terms.charge)
        .ok_or_else(|| EngineError::Validation("transfer total overflows".to_string()))?;
    Ok(())
}

impl Engine {
    /// Moves money between two accounts of the same company.
    ///
    /// With [`ChargeBearer::Receiver`] the source loses `amount` and the
    /// destination gains `amount - charge`; with [`ChargeBearer::Sender`]
    /// the source loses `amount + charge` and the destination gains `amount`.
    pub async fn transfer_balance(&self, cmd: TransferCmd) -> ResultEngine<BalanceTransfer> {
        let company_id = require_company(&cmd.company_id)?;
        let terms = TransferTerms {
            from_account_id: cmd.from_account_id,
            to_account_id: cmd.to_account_id,
            amount: cmd.amount_minor,
            charge: cmd.transfer_charge_minor,
            bearer: cmd.charge_bearer,
            transfer_date: cmd.transfer_date,
            note: normalize_optional_text(cmd.note.as_deref()),
        };
        validate_terms(&terms)?;

        let voucher_no = self
            .next_voucher(Series::BalanceTransfer, &company_id)
            .await?;
        let transfer = BalanceTransfer {
            id: Uuid::new_v4(),
            company_id: company_id.clone(),
            voucher_no,
            from_account_id: terms.from_account_id,
            to_account_id: terms.to_account_id,
            amount: MoneyCents::new(terms.amount),
            transfer_charge: MoneyCents::new(terms.charge),
            charge_bearer: terms.bearer,
            transfer_date: terms.transfer_date,
            note: terms.note.clone(),
        };
        let created_at = Utc::now();

        self.with_tx(|engine, db_tx| {
            let transfer = transfer.clone();
            let terms = terms.clone();
            Box::pin(async move {
                transfer.to_active_model(created_at).insert(db_tx).await?;
                let mut changes = ProjectionChanges::default();
                engine
                    .apply_transfer(db_tx, &transfer.company_id, &terms, &mut changes)
                    .await?;
                engine
                    .persist_changes(db_tx, &transfer.company_id, &changes)
                    .await
            })
        })
        .await?;

        tracing::info!(
            company_id = %transfer.company_id,
            amount_minor = transfer.amount.cents(),
            charge_minor = transfer.transfer_charge.cents(),
            "balance transfer {} from {} to {}",
            transfer.voucher_no,
            transfer.from_account_id,
            transfer.to_account_id
        );
        Ok(transfer)
    }

    pub async fn update_transfer(
        &self,
        company_id: &str,
        transfer_id: Uuid,
        patch: TransferPatch,
    ) -> ResultEngine<BalanceTransfer> {
        let company_id = require_company(company_id)?;
        let transfer = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                let patch = patch.clone();
                Box::pin(async move {
                    let model = engine
                        .require_transfer(db_tx, &company_id, transfer_id)
                        .await?;
                    let old = BalanceTransfer::try_from(model.clone())?;
                    let terms = TransferTerms {
                        from_account_id: patch.from_account_id.unwrap_or(old.from_account_id),
                        to_account_id: patch.to_account_id.unwrap_or(old.to_account_id),
                        amount: patch.amount_minor.unwrap_or(old.amount.cents()),
                        charge: patch
                            .transfer_charge_minor
                            .unwrap_or(old.transfer_charge.cents()),
                        bearer: patch.charge_bearer.unwrap_or(old.charge_bearer),
                        transfer_date: patch.transfer_date.unwrap_or(old.transfer_date),
                        note: apply_optional_text_patch(old.note.clone(), patch.note.as_deref()),
                    };
                    validate_terms(&terms)?;

                    let mut changes = ProjectionChanges::default();
                    reverse_transfer(&model, &mut changes)?;
                    engine
                        .apply_transfer(db_tx, &company_id, &terms, &mut changes)
                        .await?;

                    let updated = BalanceTransfer {
                        from_account_id: terms.from_account_id,
                        to_account_id: terms.to_account_id,
                        amount: MoneyCents::new(terms.amount),
                        transfer_charge: MoneyCents::new(terms.charge),
                        charge_bearer: terms.bearer,
                        transfer_date: terms.transfer_date,
                        note: terms.note.clone(),
                        ..old
                    };
                    updated
                        .to_active_model(model.created_at)
                        .update(db_tx)
                        .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    Ok(updated)
                })
            })
            .await?;

        tracing::info!("balance transfer {} updated", transfer.voucher_no);
        Ok(transfer)
    }

    pub async fn delete_transfer(&self, company_id: &str, transfer_id: Uuid) -> ResultEngine<()> {
        let company_id = require_company(company_id)?;
        let voucher_no = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                Box::pin(async move {
                    let model = engine
                        .require_transfer(db_tx, &company_id, transfer_id)
                        .await?;
                    let mut changes = ProjectionChanges::default();
                    reverse_transfer(&model, &mut changes)?;
                    balance_transfers::Entity::delete_by_id(model.id.clone())
                        .exec(db_tx)
                        .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    Ok(model.voucher_no)
                })
            })
            .await?;

        tracing::info!("balance transfer {voucher_no} deleted");
        Ok(())
    }

    pub async fn balance_transfer(
        &self,
        company_id: &str,
        transfer_id: Uuid,
    ) -> ResultEngine<BalanceTransfer> {
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let model = engine
                    .require_transfer(db_tx, &company_id, transfer_id)
                    .await?;
                BalanceTransfer::try_from(model)
            })
        })
        .await
    }

    async fn require_transfer(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        transfer_id: Uuid,
    ) -> ResultEngine<balance_transfers::Model> {
        balance_transfers::Entity::find_by_id(transfer_id.to_string())
            .filter(balance_transfers::Column::CompanyId.eq(company_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("balance transfer {transfer_id}")))
    }

    async fn apply_transfer(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        terms: &TransferTerms,
        changes: &mut ProjectionChanges,
    ) -> ResultEngine<()> {
        self.require_account(db_tx, company_id, terms.from_account_id)
            .await?;
        self.require_account(db_tx, company_id, terms.to_account_id)
            .await?;
        let legs = transfer_legs(terms.amount, terms.charge, terms.bearer);
        changes.account_outflow(terms.from_account_id, legs.debit_from);
        changes.account_inflow(terms.to_account_id, legs.credit_to);
        Ok(())
    }
}

fn reverse_transfer(
    model: &balance_transfers::Model,
    changes: &mut ProjectionChanges,
) -> ResultEngine<()> {
    let legs = model.legs()?;
    let from = parse_uuid(&model.from_account_id, "account")?;
    let to = parse_uuid(&model.to_account_id, "account")?;
    changes.account_reversal(from, legs.debit_from);
    changes.account_reversal(to, -legs.credit_to);
    Ok(())
}
