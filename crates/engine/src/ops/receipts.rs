use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    AllocationLine, CreateReceiptCmd, EngineError, MoneyReceipt, ReceiptAllocation, ReceiptPatch,
    ResultEngine, Series,
    allocation::{self, AllocationMode, OpenItem, RequestedLine},
    invoices,
    money_receipts::{self, ReceiptTerms},
    receipt_allocations,
    util::{
        apply_optional_text_patch, normalize_optional_text, parse_uuid, require_non_negative,
        require_positive,
    },
};

use super::{Engine, parties::require_company, projections::ProjectionChanges};

fn validate_terms(terms: &ReceiptTerms, lines: &[AllocationLine]) -> ResultEngine<()> {
    require_positive(terms.amount, "amount")?;
    require_non_negative(terms.discount, "discount")?;
    if terms.discount > terms.amount {
        return Err(EngineError::Validation(
            "discount must not exceed amount".to_string(),
        ));
    }
    allocation::validate_lines(
        terms.payment_to.allocation_mode(),
        &requested(lines),
        terms.amount - terms.discount,
        "invoice",
    )
}

fn requested(lines: &[AllocationLine]) -> Vec<RequestedLine> {
    lines
        .iter()
        .map(|line| RequestedLine {
            id: line.invoice_id.to_string(),
            amount: line.amount_minor,
        })
        .collect()
}

impl Engine {
    /// Records a money receipt and applies it to the client's invoices.
    ///
    /// The client and the receiving account are credited with the full
    /// `amount`; `amount - discount` is spread over invoices according to
    /// `payment_to`.
    pub async fn create_receipt(&self, cmd: CreateReceiptCmd) -> ResultEngine<MoneyReceipt> {
        let company_id = require_company(&cmd.company_id)?;
        let terms = ReceiptTerms {
            amount: cmd.amount_minor,
            discount: cmd.discount_minor,
            payment_to: cmd.payment_to,
            account_id: cmd.account_id,
            payment_date: cmd.payment_date,
            note: normalize_optional_text(cmd.note.as_deref()),
        };
        validate_terms(&terms, &cmd.allocations)?;

        let voucher_no = self
            .next_voucher(Series::MoneyReceipt, &company_id)
            .await?;
        let receipt_id = Uuid::new_v4();
        let client_id = cmd.client_id;
        let lines = cmd.allocations;
        let created_at = Utc::now();

        let receipt = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                let voucher_no = voucher_no.clone();
                let terms = terms.clone();
                let lines = lines.clone();
                Box::pin(async move {
                    engine.require_client(db_tx, &company_id, client_id).await?;
                    money_receipts::active_model(
                        receipt_id,
                        &company_id,
                        &voucher_no,
                        client_id,
                        &terms,
                        created_at,
                    )
                    .insert(db_tx)
                    .await?;

                    let mut changes = ProjectionChanges::default();
                    engine
                        .apply_receipt(
                            db_tx,
                            &company_id,
                            receipt_id,
                            client_id,
                            &terms,
                            &lines,
                            &mut changes,
                        )
                        .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    engine.load_receipt(db_tx, &company_id, receipt_id).await
                })
            })
            .await?;

        tracing::info!(
            company_id = %receipt.company_id,
            amount_minor = receipt.amount.cents(),
            "money receipt {} created for client {}",
            receipt.voucher_no,
            receipt.client_id
        );
        Ok(receipt)
    }

    /// Edits a receipt: the stored effect is reversed and the patched one
    /// applied in the same transaction. Id, voucher number and client stay.
    pub async fn update_receipt(
        &self,
        company_id: &str,
        receipt_id: Uuid,
        patch: ReceiptPatch,
    ) -> ResultEngine<MoneyReceipt> {
        let company_id = require_company(company_id)?;
        let receipt = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                let patch = patch.clone();
                Box::pin(async move {
                    let model = engine.require_receipt(db_tx, &company_id, receipt_id).await?;
                    let client_id = parse_uuid(&model.client_id, "client")?;
                    let old = model.terms()?;
                    let old_lines = engine.receipt_lines(db_tx, receipt_id).await?;

                    let terms = ReceiptTerms {
                        amount: patch.amount_minor.unwrap_or(old.amount),
                        discount: patch.discount_minor.unwrap_or(old.discount),
                        payment_to: patch.payment_to.unwrap_or(old.payment_to),
                        account_id: patch.account_id.unwrap_or(old.account_id),
                        payment_date: patch.payment_date.unwrap_or(old.payment_date),
                        note: apply_optional_text_patch(old.note.clone(), patch.note.as_deref()),
                    };
                    let lines = match patch.allocations {
                        Some(lines) => lines,
                        None if terms.payment_to.allocation_mode().takes_explicit_lines() => {
                            old_lines
                        }
                        None => Vec::new(),
                    };
                    validate_terms(&terms, &lines)?;

                    let mut changes = ProjectionChanges::default();
                    engine
                        .reverse_receipt(db_tx, &company_id, &model, &mut changes)
                        .await?;
                    engine
                        .apply_receipt(
                            db_tx,
                            &company_id,
                            receipt_id,
                            client_id,
                            &terms,
                            &lines,
                            &mut changes,
                        )
                        .await?;
                    money_receipts::active_model(
                        receipt_id,
                        &company_id,
                        &model.voucher_no,
                        client_id,
                        &terms,
                        model.created_at,
                    )
                    .update(db_tx)
                    .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    engine.load_receipt(db_tx, &company_id, receipt_id).await
                })
            })
            .await?;

        tracing::info!("money receipt {} updated", receipt.voucher_no);
        Ok(receipt)
    }

    /// Reverses a receipt's effect and deletes it with its allocations.
    pub async fn delete_receipt(&self, company_id: &str, receipt_id: Uuid) -> ResultEngine<()> {
        let company_id = require_company(company_id)?;
        let voucher_no = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                Box::pin(async move {
                    let model = engine.require_receipt(db_tx, &company_id, receipt_id).await?;
                    let mut changes = ProjectionChanges::default();
                    engine
                        .reverse_receipt(db_tx, &company_id, &model, &mut changes)
                        .await?;
                    money_receipts::Entity::delete_by_id(model.id.clone())
                        .exec(db_tx)
                        .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    Ok(model.voucher_no)
                })
            })
            .await?;

        tracing::info!("money receipt {voucher_no} deleted");
        Ok(())
    }

    pub async fn money_receipt(
        &self,
        company_id: &str,
        receipt_id: Uuid,
    ) -> ResultEngine<MoneyReceipt> {
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move { engine.load_receipt(db_tx, &company_id, receipt_id).await })
        })
        .await
    }

    async fn require_receipt(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        receipt_id: Uuid,
    ) -> ResultEngine<money_receipts::Model> {
        money_receipts::Entity::find_by_id(receipt_id.to_string())
            .filter(money_receipts::Column::CompanyId.eq(company_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("money receipt {receipt_id}")))
    }

    async fn load_receipt(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        receipt_id: Uuid,
    ) -> ResultEngine<MoneyReceipt> {
        let model = self.require_receipt(db_tx, company_id, receipt_id).await?;
        let mut receipt = MoneyReceipt::try_from(model)?;
        receipt.allocations = receipt_allocations::Entity::find()
            .filter(receipt_allocations::Column::MoneyReceiptId.eq(receipt_id.to_string()))
            .order_by_asc(receipt_allocations::Column::Id)
            .all(db_tx)
            .await?
            .into_iter()
            .map(ReceiptAllocation::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(receipt)
    }

    async fn receipt_lines(
        &self,
        db_tx: &DatabaseTransaction,
        receipt_id: Uuid,
    ) -> ResultEngine<Vec<AllocationLine>> {
        receipt_allocations::Entity::find()
            .filter(receipt_allocations::Column::MoneyReceiptId.eq(receipt_id.to_string()))
            .all(db_tx)
            .await?
            .into_iter()
            .map(|row| {
                Ok(AllocationLine {
                    invoice_id: parse_uuid(&row.invoice_id, "invoice")?,
                    amount_minor: row.applied_amount,
                })
            })
            .collect()
    }

    /// Plans the allocations of a receipt, inserts them and records every
    /// projection delta.
    #[allow(clippy::too_many_arguments)]
    async fn apply_receipt(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        receipt_id: Uuid,
        client_id: Uuid,
        terms: &ReceiptTerms,
        lines: &[AllocationLine],
        changes: &mut ProjectionChanges,
    ) -> ResultEngine<()> {
        self.require_account(db_tx, company_id, terms.account_id)
            .await?;

        let mode = terms.payment_to.allocation_mode();
        let requested = requested(lines);
        let open = self
            .open_invoices(db_tx, company_id, client_id, mode, &requested, changes)
            .await?;
        let plan = allocation::plan(mode, terms.amount - terms.discount, &requested, &open)?;

        for (invoice_id, applied) in &plan {
            receipt_allocations::active_model(
                company_id, receipt_id, invoice_id, client_id, *applied,
            )
            .insert(db_tx)
            .await?;
            changes.invoice_received(invoice_id, *applied);
        }
        changes.client(client_id, terms.amount);
        changes.account_inflow(terms.account_id, terms.amount);
        Ok(())
    }

    async fn reverse_receipt(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        model: &money_receipts::Model,
        changes: &mut ProjectionChanges,
    ) -> ResultEngine<()> {
        let allocations = receipt_allocations::Entity::find()
            .filter(receipt_allocations::Column::MoneyReceiptId.eq(model.id.as_str()))
            .filter(receipt_allocations::Column::CompanyId.eq(company_id))
            .all(db_tx)
            .await?;
        for row in &allocations {
            changes.invoice_received(&row.invoice_id, -row.applied_amount);
        }
        receipt_allocations::Entity::delete_many()
            .filter(receipt_allocations::Column::MoneyReceiptId.eq(model.id.as_str()))
            .exec(db_tx)
            .await?;

        let client_id = parse_uuid(&model.client_id, "client")?;
        let account_id = parse_uuid(&model.account_id, "account")?;
        changes.client(client_id, -model.amount);
        changes.account_reversal(account_id, -model.amount);
        Ok(())
    }

    /// Invoices a receipt may settle, with their remaining due as seen after
    /// the changes already planned in this transaction.
    ///
    /// FIFO order is invoice date, then creation time, then invoice number.
    async fn open_invoices(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        client_id: Uuid,
        mode: AllocationMode,
        requested: &[RequestedLine],
        changes: &ProjectionChanges,
    ) -> ResultEngine<Vec<OpenItem>> {
        let models = match mode {
            AllocationMode::Unallocated => return Ok(Vec::new()),
            AllocationMode::Fifo => {
                invoices::Entity::find()
                    .filter(invoices::Column::CompanyId.eq(company_id))
                    .filter(invoices::Column::ClientId.eq(client_id.to_string()))
                    .order_by_asc(invoices::Column::InvoiceDate)
                    .order_by_asc(invoices::Column::CreatedAt)
                    .order_by_asc(invoices::Column::InvoiceNo)
                    .all(db_tx)
                    .await?
            }
            AllocationMode::Exact | AllocationMode::Clamped => {
                let mut models = Vec::with_capacity(requested.len());
                for line in requested {
                    let model = self
                        .require_invoice_str(db_tx, company_id, &line.id)
                        .await?;
                    if model.client_id != client_id.to_string() {
                        return Err(EngineError::NotFound(format!(
                            "invoice {} for this client",
                            model.invoice_no
                        )));
                    }
                    models.push(model);
                }
                models
            }
        };

        Ok(models
            .into_iter()
            .map(|model| {
                let remaining = model.remaining_due() - changes.pending_invoice(&model.id);
                OpenItem {
                    label: format!("invoice {}", model.invoice_no),
                    id: model.id,
                    remaining,
                }
            })
            .filter(|item| mode != AllocationMode::Fifo || item.remaining > 0)
            .collect())
    }
}
