use std::collections::BTreeMap;

use chrono::NaiveDate;
use sea_orm::{QueryFilter, prelude::*};

use crate::{
    CollectionLine, Collections, MoneyCents, ProfitLoss, ResultEngine, accounts,
    balance_transfers, invoice_vendor_costs, invoices, money_receipts,
    util::{checked_apply, checked_total, parse_uuid},
    vendor_payments,
};

use super::{
    Engine,
    ledger::{in_range, validate_range},
    parties::require_company,
};

impl Engine {
    /// Profit and loss over invoices dated in `[from, to]`.
    ///
    /// Purchases are the vendor costs booked on those invoices. Discounts,
    /// vendor AIT and transfer charges are taken from events dated in the
    /// same range.
    pub async fn profit_loss(
        &self,
        company_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<ProfitLoss> {
        validate_range(from, to)?;
        let company_id = require_company(company_id)?;
        self.with_tx(|_, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let invoices_in_range: Vec<invoices::Model> = invoices::Entity::find()
                    .filter(invoices::Column::CompanyId.eq(company_id.as_str()))
                    .all(db_tx)
                    .await?
                    .into_iter()
                    .filter(|invoice| in_range(invoice.invoice_date, from, to))
                    .collect();
                let sales = checked_total(invoices_in_range.iter().map(|i| i.net_total), "sales")?;

                let invoice_ids: Vec<String> =
                    invoices_in_range.iter().map(|i| i.id.clone()).collect();
                let costs = invoice_vendor_costs::Entity::find()
                    .filter(invoice_vendor_costs::Column::CompanyId.eq(company_id.as_str()))
                    .filter(invoice_vendor_costs::Column::InvoiceId.is_in(invoice_ids))
                    .all(db_tx)
                    .await?;
                let purchases = checked_total(costs.iter().map(|cost| cost.cost), "purchases")?;

                let receipts = money_receipts::Entity::find()
                    .filter(money_receipts::Column::CompanyId.eq(company_id.as_str()))
                    .all(db_tx)
                    .await?;
                let discounts = checked_total(
                    receipts
                        .iter()
                        .filter(|receipt| in_range(receipt.payment_date, from, to))
                        .map(|receipt| receipt.discount),
                    "discounts",
                )?;

                let payments = vendor_payments::Entity::find()
                    .filter(vendor_payments::Column::CompanyId.eq(company_id.as_str()))
                    .all(db_tx)
                    .await?;
                let vendor_ait = checked_total(
                    payments
                        .iter()
                        .filter(|payment| in_range(payment.payment_date, from, to))
                        .map(|payment| payment.vendor_ait),
                    "vendor AIT",
                )?;

                let transfers = balance_transfers::Entity::find()
                    .filter(balance_transfers::Column::CompanyId.eq(company_id.as_str()))
                    .all(db_tx)
                    .await?;
                let transfer_charges = checked_total(
                    transfers
                        .iter()
                        .filter(|transfer| in_range(transfer.transfer_date, from, to))
                        .map(|transfer| transfer.transfer_charge),
                    "transfer charges",
                )?;

                let gross_profit = checked_apply(sales, -purchases, "gross profit")?;
                let net_profit = checked_total(
                    [gross_profit, -discounts, -transfer_charges],
                    "net profit",
                )?;
                Ok(ProfitLoss {
                    from,
                    to,
                    sales: MoneyCents::new(sales),
                    purchases: MoneyCents::new(purchases),
                    discounts: MoneyCents::new(discounts),
                    vendor_ait: MoneyCents::new(vendor_ait),
                    transfer_charges: MoneyCents::new(transfer_charges),
                    gross_profit: MoneyCents::new(gross_profit),
                    net_profit: MoneyCents::new(net_profit),
                })
            })
        })
        .await
    }

    /// Money receipts dated in `[from, to]`, grouped by receiving account.
    pub async fn collections(
        &self,
        company_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<Collections> {
        validate_range(from, to)?;
        let company_id = require_company(company_id)?;
        self.with_tx(|_, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let names: BTreeMap<String, String> = accounts::Entity::find()
                    .filter(accounts::Column::CompanyId.eq(company_id.as_str()))
                    .all(db_tx)
                    .await?
                    .into_iter()
                    .map(|account| (account.id, account.name))
                    .collect();

                let mut per_account: BTreeMap<String, (u64, i64)> = BTreeMap::new();
                for receipt in money_receipts::Entity::find()
                    .filter(money_receipts::Column::CompanyId.eq(company_id.as_str()))
                    .all(db_tx)
                    .await?
                    .into_iter()
                    .filter(|receipt| in_range(receipt.payment_date, from, to))
                {
                    let entry = per_account.entry(receipt.account_id).or_default();
                    entry.0 += 1;
                    entry.1 = checked_apply(entry.1, receipt.amount, "collections")?;
                }

                let mut lines = Vec::with_capacity(per_account.len());
                for (account_id, (receipts, total)) in per_account {
                    lines.push(CollectionLine {
                        account_id: parse_uuid(&account_id, "account")?,
                        account_name: names.get(&account_id).cloned().unwrap_or_default(),
                        receipts,
                        total: MoneyCents::new(total),
                    });
                }
                lines.sort_by(|a, b| a.account_name.cmp(&b.account_name));
                let total = MoneyCents::new(checked_total(
                    lines.iter().map(|line| line.total.cents()),
                    "collections",
                )?);

                Ok(Collections {
                    from,
                    to,
                    lines,
                    total,
                })
            })
        })
        .await
    }
}
