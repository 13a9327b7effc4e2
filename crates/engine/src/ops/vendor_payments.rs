use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    AllocationLine, CreateVendorPaymentCmd, EngineError, ResultEngine, Series, VendorAllocation,
    VendorPayment, VendorPaymentPatch,
    allocation::{self, AllocationMode, OpenItem, RequestedLine},
    invoice_vendor_costs, invoices,
    util::{
        apply_optional_text_patch, normalize_optional_text, parse_uuid, require_non_negative,
        require_positive,
    },
    vendor_allocations::{self, NewVendorAllocation},
    vendor_payments::{self, VendorPaymentTerms},
};

use super::{Engine, parties::require_company, projections::ProjectionChanges};

fn validate_terms(terms: &VendorPaymentTerms, lines: &[AllocationLine]) -> ResultEngine<()> {
    require_positive(terms.amount, "amount")?;
    require_non_negative(terms.vendor_ait, "vendor AIT")?;
    let total = terms
        .amount
        .checked_add(terms.vendor_ait)
        .ok_or_else(|| EngineError::Validation("total amount overflows".to_string()))?;
    let requested: Vec<RequestedLine> = lines
        .iter()
        .map(|line| RequestedLine {
            id: line.invoice_id.to_string(),
            amount: line.amount_minor,
        })
        .collect();
    allocation::validate_lines(
        terms.payment_to.allocation_mode(),
        &requested,
        total,
        "invoice",
    )
}

impl Engine {
    /// Records a payment to a vendor and settles the vendor's cost lines.
    ///
    /// `amount + vendor_ait` moves the vendor toward Advance; `amount` leaves
    /// the paying account, which must hold it unless it is a credit card.
    pub async fn create_vendor_payment(
        &self,
        cmd: CreateVendorPaymentCmd,
    ) -> ResultEngine<VendorPayment> {
        let company_id = require_company(&cmd.company_id)?;
        let terms = VendorPaymentTerms {
            amount: cmd.amount_minor,
            vendor_ait: cmd.vendor_ait_minor,
            payment_to: cmd.payment_to,
            account_id: cmd.account_id,
            payment_date: cmd.payment_date,
            note: normalize_optional_text(cmd.note.as_deref()),
        };
        validate_terms(&terms, &cmd.allocations)?;

        let voucher_no = self
            .next_voucher(Series::VendorPayment, &company_id)
            .await?;
        let payment_id = Uuid::new_v4();
        let vendor_id = cmd.vendor_id;
        let lines = cmd.allocations;
        let created_at = Utc::now();

        let payment = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                let voucher_no = voucher_no.clone();
                let terms = terms.clone();
                let lines = lines.clone();
                Box::pin(async move {
                    engine.require_vendor(db_tx, &company_id, vendor_id).await?;
                    vendor_payments::active_model(
                        payment_id,
                        &company_id,
                        &voucher_no,
                        vendor_id,
                        &terms,
                        created_at,
                    )
                    .insert(db_tx)
                    .await?;

                    let mut changes = ProjectionChanges::default();
                    engine
                        .apply_vendor_payment(
                            db_tx,
                            &company_id,
                            payment_id,
                            vendor_id,
                            &terms,
                            &lines,
                            &mut changes,
                        )
                        .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    engine
                        .load_vendor_payment(db_tx, &company_id, payment_id)
                        .await
                })
            })
            .await?;

        tracing::info!(
            company_id = %payment.company_id,
            amount_minor = payment.amount.cents(),
            vendor_ait_minor = payment.vendor_ait.cents(),
            "vendor payment {} created for vendor {}",
            payment.voucher_no,
            payment.vendor_id
        );
        Ok(payment)
    }

    /// Edits a vendor payment by reversing and re-applying it.
    pub async fn update_vendor_payment(
        &self,
        company_id: &str,
        payment_id: Uuid,
        patch: VendorPaymentPatch,
    ) -> ResultEngine<VendorPayment> {
        let company_id = require_company(company_id)?;
        let payment = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                let patch = patch.clone();
                Box::pin(async move {
                    let model = engine
                        .require_vendor_payment(db_tx, &company_id, payment_id)
                        .await?;
                    let vendor_id = parse_uuid(&model.vendor_id, "vendor")?;
                    let old = model.terms()?;
                    let old_lines = engine.vendor_payment_lines(db_tx, payment_id).await?;

                    let terms = VendorPaymentTerms {
                        amount: patch.amount_minor.unwrap_or(old.amount),
                        vendor_ait: patch.vendor_ait_minor.unwrap_or(old.vendor_ait),
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
                        .reverse_vendor_payment(db_tx, &company_id, &model, &mut changes)
                        .await?;
                    engine
                        .apply_vendor_payment(
                            db_tx,
                            &company_id,
                            payment_id,
                            vendor_id,
                            &terms,
                            &lines,
                            &mut changes,
                        )
                        .await?;
                    vendor_payments::active_model(
                        payment_id,
                        &company_id,
                        &model.voucher_no,
                        vendor_id,
                        &terms,
                        model.created_at,
                    )
                    .update(db_tx)
                    .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    engine
                        .load_vendor_payment(db_tx, &company_id, payment_id)
                        .await
                })
            })
            .await?;

        tracing::info!("vendor payment {} updated", payment.voucher_no);
        Ok(payment)
    }

    pub async fn delete_vendor_payment(
        &self,
        company_id: &str,
        payment_id: Uuid,
    ) -> ResultEngine<()> {
        let company_id = require_company(company_id)?;
        let voucher_no = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                Box::pin(async move {
                    let model = engine
                        .require_vendor_payment(db_tx, &company_id, payment_id)
                        .await?;
                    let mut changes = ProjectionChanges::default();
                    engine
                        .reverse_vendor_payment(db_tx, &company_id, &model, &mut changes)
                        .await?;
                    vendor_payments::Entity::delete_by_id(model.id.clone())
                        .exec(db_tx)
                        .await?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    Ok(model.voucher_no)
                })
            })
            .await?;

        tracing::info!("vendor payment {voucher_no} deleted");
        Ok(())
    }

    pub async fn vendor_payment(
        &self,
        company_id: &str,
        payment_id: Uuid,
    ) -> ResultEngine<VendorPayment> {
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                engine
                    .load_vendor_payment(db_tx, &company_id, payment_id)
                    .await
            })
        })
        .await
    }

    async fn require_vendor_payment(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        payment_id: Uuid,
    ) -> ResultEngine<vendor_payments::Model> {
        vendor_payments::Entity::find_by_id(payment_id.to_string())
            .filter(vendor_payments::Column::CompanyId.eq(company_id))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("vendor payment {payment_id}")))
    }

    async fn load_vendor_payment(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        payment_id: Uuid,
    ) -> ResultEngine<VendorPayment> {
        let model = self
            .require_vendor_payment(db_tx, company_id, payment_id)
            .await?;
        let mut payment = VendorPayment::try_from(model)?;
        payment.allocations = vendor_allocations::Entity::find()
            .filter(vendor_allocations::Column::VendorPaymentId.eq(payment_id.to_string()))
            .order_by_asc(vendor_allocations::Column::Id)
            .all(db_tx)
            .await?
            .into_iter()
            .map(VendorAllocation::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(payment)
    }

    async fn vendor_payment_lines(
        &self,
        db_tx: &DatabaseTransaction,
        payment_id: Uuid,
    ) -> ResultEngine<Vec<AllocationLine>> {
        vendor_allocations::Entity::find()
            .filter(vendor_allocations::Column::VendorPaymentId.eq(payment_id.to_string()))
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

    #[allow(clippy::too_many_arguments)]
    async fn apply_vendor_payment(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        payment_id: Uuid,
        vendor_id: Uuid,
        terms: &VendorPaymentTerms,
        lines: &[AllocationLine],
        changes: &mut ProjectionChanges,
    ) -> ResultEngine<()> {
        self.require_account(db_tx, company_id, terms.account_id)
            .await?;

        let mode = terms.payment_to.allocation_mode();
        let costs = self
            .open_vendor_costs(db_tx, company_id, vendor_id, mode, lines)
            .await?;

        // Explicit lines name invoices; the planner works on cost line ids.
        let requested: Vec<RequestedLine> = lines
            .iter()
            .filter_map(|line| {
                let invoice_id = line.invoice_id.to_string();
                costs
                    .iter()
                    .find(|(cost, _)| cost.invoice_id == invoice_id)
                    .map(|(cost, _)| RequestedLine {
                        id: cost.id.clone(),
                        amount: line.amount_minor,
                    })
            })
            .collect();
        let open: Vec<OpenItem> = costs
            .iter()
            .map(|(cost, invoice_no)| OpenItem {
                id: cost.id.clone(),
                label: format!("vendor cost on invoice {invoice_no}"),
                remaining: cost.remaining() - changes.pending_cost(&cost.id),
            })
            .filter(|item| mode != AllocationMode::Fifo || item.remaining > 0)
            .collect();

        let plan = allocation::plan(mode, terms.total(), &requested, &open)?;
        for (cost_id, applied) in &plan {
            let Some((cost, _)) = costs.iter().find(|(cost, _)| &cost.id == cost_id) else {
                return Err(EngineError::NotFound(format!("vendor cost {cost_id}")));
            };
            vendor_allocations::ActiveModel::from(NewVendorAllocation {
                company_id,
                vendor_payment_id: payment_id,
                cost,
                applied_amount: *applied,
            })
            .insert(db_tx)
            .await?;
            changes.cost_paid(cost_id, *applied);
        }

        changes.vendor(vendor_id, terms.total());
        changes.account_outflow(terms.account_id, terms.amount);
        Ok(())
    }

    async fn reverse_vendor_payment(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        model: &vendor_payments::Model,
        changes: &mut ProjectionChanges,
    ) -> ResultEngine<()> {
        let allocations = vendor_allocations::Entity::find()
            .filter(vendor_allocations::Column::VendorPaymentId.eq(model.id.as_str()))
            .filter(vendor_allocations::Column::CompanyId.eq(company_id))
            .all(db_tx)
            .await?;
        for row in &allocations {
            changes.cost_paid(&row.cost_id, -row.applied_amount);
        }
        vendor_allocations::Entity::delete_many()
            .filter(vendor_allocations::Column::VendorPaymentId.eq(model.id.as_str()))
            .exec(db_tx)
            .await?;

        let vendor_id = parse_uuid(&model.vendor_id, "vendor")?;
        let account_id = parse_uuid(&model.account_id, "account")?;
        changes.vendor(vendor_id, -model.total_amount);
        changes.account_reversal(account_id, model.amount);
        Ok(())
    }

    /// The vendor's cost lines a payment may settle, paired with their
    /// invoice number, in FIFO order (invoice date, creation, number).
    ///
    /// For explicit modes only the named invoices are returned, and an
    /// invoice without a cost line for this vendor is not found.
    async fn open_vendor_costs(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        vendor_id: Uuid,
        mode: AllocationMode,
        lines: &[AllocationLine],
    ) -> ResultEngine<Vec<(invoice_vendor_costs::Model, String)>> {
        if mode == AllocationMode::Unallocated {
            return Ok(Vec::new());
        }

        let mut rows: Vec<(invoice_vendor_costs::Model, invoices::Model)> =
            invoice_vendor_costs::Entity::find()
                .find_also_related(invoices::Entity)
                .filter(invoice_vendor_costs::Column::CompanyId.eq(company_id))
                .filter(invoice_vendor_costs::Column::VendorId.eq(vendor_id.to_string()))
                .all(db_tx)
                .await?
                .into_iter()
                .filter_map(|(cost, invoice)| invoice.map(|invoice| (cost, invoice)))
                .collect();

        if mode.takes_explicit_lines() {
            let mut picked = Vec::with_capacity(lines.len());
            for line in lines {
                let invoice_id = line.invoice_id.to_string();
                let position = rows
                    .iter()
                    .position(|(cost, _)| cost.invoice_id == invoice_id)
                    .ok_or_else(|| {
                        EngineError::NotFound(format!(
                            "vendor cost for invoice {invoice_id} and vendor {vendor_id}"
                        ))
                    })?;
                picked.push(rows.swap_remove(position));
            }
            rows = picked;
        } else {
            rows.sort_by(|(a_cost, a_inv), (b_cost, b_inv)| {
                (a_inv.invoice_date, a_inv.created_at, &a_inv.invoice_no, &a_cost.id).cmp(&(
                    b_inv.invoice_date,
                    b_inv.created_at,
                    &b_inv.invoice_no,
                    &b_cost.id,
                ))
            });
        }

        Ok(rows
            .into_iter()
            .map(|(cost, invoice)| (cost, invoice.invoice_no))
            .collect())
    }
}
