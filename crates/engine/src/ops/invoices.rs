use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    CreateInvoiceCmd, EngineError, Invoice, InvoicePatch, InvoiceStatus, MoneyCents, ResultEngine,
    Series, VendorCost, invoice_vendor_costs,
    invoices::{self, NewInvoice},
    util::{
        apply_optional_text_patch, normalize_optional_text, parse_uuid, require_non_negative,
        require_positive,
    },
};

use super::{
    Engine,
    parties::require_company,
    projections::{ProjectionChanges, ensure_updated},
};

fn validate_create(cmd: &CreateInvoiceCmd) -> ResultEngine<()> {
    require_non_negative(cmd.net_total_minor, "net total")?;
    let mut vendors = HashSet::with_capacity(cmd.vendor_costs.len());
    for line in &cmd.vendor_costs {
        require_positive(line.cost_minor, "vendor cost")?;
        if !vendors.insert(line.vendor_id) {
            return Err(EngineError::Validation(format!(
                "duplicate cost line for vendor {}",
                line.vendor_id
            )));
        }
    }
    Ok(())
}

impl Engine {
    /// Issues an invoice to a client and books its vendor costs.
    ///
    /// The client moves toward Due by `net_total`; every vendor cost line
    /// moves its vendor toward Due by `cost`.
    pub async fn create_invoice(&self, cmd: CreateInvoiceCmd) -> ResultEngine<Invoice> {
        let company_id = require_company(&cmd.company_id)?;
        validate_create(&cmd)?;

        let invoice_no = self.next_voucher(Series::Invoice, &company_id).await?;
        let invoice_id = Uuid::new_v4();
        let created_at = Utc::now();

        let invoice = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                let invoice_no = invoice_no.clone();
                let cmd = cmd.clone();
                Box::pin(async move {
                    engine
                        .require_client(db_tx, &company_id, cmd.client_id)
                        .await?;
                    invoices::ActiveModel::from(NewInvoice {
                        id: invoice_id,
                        company_id: &company_id,
                        invoice_no: &invoice_no,
                        client_id: cmd.client_id,
                        invoice_date: cmd.invoice_date,
                        net_total: cmd.net_total_minor,
                        note: normalize_optional_text(cmd.note.as_deref()),
                        created_at,
                    })
                    .insert(db_tx)
                    .await?;

                    let mut changes = ProjectionChanges::default();
                    for line in &cmd.vendor_costs {
                        engine
                            .require_vendor(db_tx, &company_id, line.vendor_id)
                            .await?;
                        invoice_vendor_costs::new_active_model(
                            &company_id,
                            invoice_id,
                            line.vendor_id,
                            line.cost_minor,
                            created_at,
                        )
                        .insert(db_tx)
                        .await?;
                        changes.vendor(line.vendor_id, -line.cost_minor);
                    }
                    changes.client(cmd.client_id, -cmd.net_total_minor);
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    engine.load_invoice(db_tx, &company_id, invoice_id).await
                })
            })
            .await?;

        tracing::info!(
            company_id = %invoice.company_id,
            net_total_minor = invoice.net_total.cents(),
            "invoice {} created for client {}",
            invoice.invoice_no,
            invoice.client_id
        );
        Ok(invoice)
    }

    /// Edits an invoice's total, date or note.
    ///
    /// The client balance follows the change in total. A total below what
    /// has already been received is rejected.
    pub async fn update_invoice(
        &self,
        company_id: &str,
        invoice_id: Uuid,
        patch: InvoicePatch,
    ) -> ResultEngine<Invoice> {
        let company_id = require_company(company_id)?;
        if let Some(total) = patch.net_total_minor {
            require_non_negative(total, "net total")?;
        }

        let invoice = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                let patch = patch.clone();
                Box::pin(async move {
                    let model = engine
                        .require_invoice_str(db_tx, &company_id, &invoice_id.to_string())
                        .await?;
                    let net_total = patch.net_total_minor.unwrap_or(model.net_total);
                    if net_total < model.received_amount {
                        return Err(EngineError::Validation(format!(
                            "net total {} is below the received amount {}",
                            MoneyCents::new(net_total),
                            MoneyCents::new(model.received_amount)
                        )));
                    }
                    let status = InvoiceStatus::derive(
                        MoneyCents::new(model.received_amount),
                        MoneyCents::new(net_total),
                    );
                    let invoice_date = patch.invoice_date.unwrap_or(model.invoice_date);
                    let note = apply_optional_text_patch(model.note.clone(), patch.note.as_deref());

                    let result = invoices::Entity::update_many()
                        .col_expr(invoices::Column::NetTotal, Expr::value(net_total))
                        .col_expr(invoices::Column::Status, Expr::value(status.as_str()))
                        .col_expr(invoices::Column::InvoiceDate, Expr::value(invoice_date))
                        .col_expr(invoices::Column::Note, Expr::value(note))
                        .col_expr(invoices::Column::Version, Expr::value(model.version + 1))
                        .filter(invoices::Column::Id.eq(model.id.as_str()))
                        .filter(invoices::Column::Version.eq(model.version))
                        .exec(db_tx)
                        .await?;
                    ensure_updated(result.rows_affected, "invoice", &model.id)?;

                    let mut changes = ProjectionChanges::default();
                    let client_id = parse_uuid(&model.client_id, "client")?;
                    changes.client(client_id, model.net_total - net_total);
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    engine.load_invoice(db_tx, &company_id, invoice_id).await
                })
            })
            .await?;

        tracing::info!("invoice {} updated", invoice.invoice_no);
        Ok(invoice)
    }

    /// Deletes an invoice that has no money applied to it, reversing the
    /// client and vendor effects.
    pub async fn delete_invoice(&self, company_id: &str, invoice_id: Uuid) -> ResultEngine<()> {
        let company_id = require_company(company_id)?;
        let invoice_no = self
            .with_tx(|engine, db_tx| {
                let company_id = company_id.clone();
                Box::pin(async move {
                    let model = engine
                        .require_invoice_str(db_tx, &company_id, &invoice_id.to_string())
                        .await?;
                    if model.received_amount != 0 {
                        return Err(EngineError::Validation(format!(
                            "invoice {} has receipts applied",
                            model.invoice_no
                        )));
                    }
                    let costs = invoice_vendor_costs::Entity::find()
                        .filter(invoice_vendor_costs::Column::InvoiceId.eq(model.id.as_str()))
                        .all(db_tx)
                        .await?;
                    if costs.iter().any(|cost| cost.paid_amount != 0) {
                        return Err(EngineError::Validation(format!(
                            "invoice {} has vendor payments applied",
                            model.invoice_no
                        )));
                    }

                    let mut changes = ProjectionChanges::default();
                    for cost in &costs {
                        changes.vendor(parse_uuid(&cost.vendor_id, "vendor")?, cost.cost);
                    }
                    changes.client(parse_uuid(&model.client_id, "client")?, model.net_total);

                    invoice_vendor_costs::Entity::delete_many()
                        .filter(invoice_vendor_costs::Column::InvoiceId.eq(model.id.as_str()))
                        .exec(db_tx)
                        .await?;
                    let result = invoices::Entity::delete_many()
                        .filter(invoices::Column::Id.eq(model.id.as_str()))
                        .filter(invoices::Column::Version.eq(model.version))
                        .exec(db_tx)
                        .await?;
                    ensure_updated(result.rows_affected, "invoice", &model.id)?;
                    engine.persist_changes(db_tx, &company_id, &changes).await?;
                    Ok(model.invoice_no)
                })
            })
            .await?;

        tracing::info!("invoice {invoice_no} deleted");
        Ok(())
    }

    pub async fn invoice(&self, company_id: &str, invoice_id: Uuid) -> ResultEngine<Invoice> {
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move { engine.load_invoice(db_tx, &company_id, invoice_id).await })
        })
        .await
    }

    async fn load_invoice(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        invoice_id: Uuid,
    ) -> ResultEngine<Invoice> {
        let model = self
            .require_invoice_str(db_tx, company_id, &invoice_id.to_string())
            .await?;
        let mut invoice = Invoice::try_from(model)?;
        invoice.vendor_costs = invoice_vendor_costs::Entity::find()
            .filter(invoice_vendor_costs::Column::InvoiceId.eq(invoice_id.to_string()))
            .order_by_asc(invoice_vendor_costs::Column::CreatedAt)
            .order_by_asc(invoice_vendor_costs::Column::Id)
            .all(db_tx)
            .await?
            .into_iter()
            .map(VendorCost::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(invoice)
    }
}
