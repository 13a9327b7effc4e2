//! Ledger reconstruction from raw events.
//!
//! Stored projections are never read here: every balance is the subject's
//! opening balance plus the signed sum of its events.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Ledger, LedgerRow, MoneyCents, PaymentTo, ResultEngine, VendorPaymentTo,
    advance_returns, balance_transfers, invoice_vendor_costs, invoices, money_receipts,
    util::{checked_apply, checked_total},
    vendor_payments,
};

use super::Engine;

/// Which column raises the subject's balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Orientation {
    /// Clients: receipts (credit) raise the balance toward Advance.
    CreditIncreases,
    /// Vendors and accounts: payments to the vendor, or money into the
    /// account (debit), raise the balance.
    DebitIncreases,
}

impl Orientation {
    fn effect(self, event: &LedgerEvent) -> i64 {
        match self {
            Self::CreditIncreases => event.credit - event.debit,
            Self::DebitIncreases => event.debit - event.credit,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LedgerEvent {
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub voucher_no: String,
    pub id: String,
    pub description: String,
    pub debit: i64,
    pub credit: i64,
}

impl LedgerEvent {
    fn sort_key(&self) -> (NaiveDate, DateTime<Utc>, (&str, u64), &str) {
        (
            self.date,
            self.created_at,
            voucher_key(&self.voucher_no),
            &self.id,
        )
    }
}

/// Series prefix and sequence number of a voucher, so `MR-1000000` sorts
/// after `MR-999999`.
fn voucher_key(voucher_no: &str) -> (&str, u64) {
    match voucher_no.rsplit_once('-') {
        Some((series, seq)) => match seq.parse() {
            Ok(seq) => (series, seq),
            Err(_) => (voucher_no, 0),
        },
        None => (voucher_no, 0),
    }
}

pub(crate) fn validate_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(EngineError::Validation(format!(
            "date range start {from} is after end {to}"
        )));
    }
    Ok(())
}

pub(crate) fn in_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
}

/// Balance after every event, regardless of date.
pub(crate) fn closing_balance(
    opening: i64,
    orientation: Orientation,
    events: &[LedgerEvent],
) -> ResultEngine<i64> {
    let movement = checked_total(
        events.iter().map(|event| orientation.effect(event)),
        "ledger balance",
    )?;
    checked_apply(opening, movement, "ledger balance")
}

/// Folds events into a statement for `[from, to]`.
///
/// Events dated before `from` are absorbed into the opening balance; events
/// after `to` are ignored.
pub(crate) fn build_ledger(
    subject_id: Uuid,
    opening: i64,
    orientation: Orientation,
    mut events: Vec<LedgerEvent>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ResultEngine<Ledger> {
    events.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut running = opening;
    let mut opening_balance = opening;
    let mut rows = Vec::new();
    for event in events {
        if from.is_some_and(|from| event.date < from) {
            opening_balance =
                checked_apply(opening_balance, orientation.effect(&event), "ledger balance")?;
            running = opening_balance;
            continue;
        }
        if !in_range(event.date, from, to) {
            continue;
        }
        running = checked_apply(running, orientation.effect(&event), "ledger balance")?;
        rows.push(LedgerRow {
            date: event.date,
            voucher_no: event.voucher_no,
            description: event.description,
            debit: MoneyCents::new(event.debit),
            credit: MoneyCents::new(event.credit),
            running_balance: MoneyCents::new(running),
        });
    }

    Ok(Ledger {
        subject_id,
        from,
        to,
        opening_balance: MoneyCents::new(opening_balance),
        rows,
        closing_balance: MoneyCents::new(running),
    })
}

fn receipt_description(payment_to: &str, discount: i64) -> String {
    let target = PaymentTo::try_from(payment_to)
        .map(PaymentTo::as_str)
        .unwrap_or(payment_to);
    if discount > 0 {
        format!(
            "Money receipt ({target}), discount {}",
            MoneyCents::new(discount)
        )
    } else {
        format!("Money receipt ({target})")
    }
}

fn vendor_payment_description(payment_to: &str, ait: i64) -> String {
    let target = VendorPaymentTo::try_from(payment_to)
        .map(VendorPaymentTo::as_str)
        .unwrap_or(payment_to);
    if ait > 0 {
        format!("Vendor payment ({target}), AIT {}", MoneyCents::new(ait))
    } else {
        format!("Vendor payment ({target})")
    }
}

impl Engine {
    /// Client statement: invoices are debits, receipts are credits, advance
    /// returns to the client are debits. Positive balance is Advance.
    pub async fn client_ledger(
        &self,
        company_id: &str,
        client_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<Ledger> {
        validate_range(from, to)?;
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let client = engine.require_client(db_tx, &company_id, client_id).await?;
                let events = engine.client_events(db_tx, &company_id, client_id).await?;
                build_ledger(
                    client_id,
                    client.opening_balance,
                    Orientation::CreditIncreases,
                    events,
                    from,
                    to,
                )
            })
        })
        .await
    }

    /// Vendor statement: payments are debits, invoice costs and vendor
    /// refunds are credits. Positive balance is Advance.
    pub async fn vendor_ledger(
        &self,
        company_id: &str,
        vendor_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<Ledger> {
        validate_range(from, to)?;
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let vendor = engine.require_vendor(db_tx, &company_id, vendor_id).await?;
                let events = engine.vendor_events(db_tx, &company_id, vendor_id).await?;
                build_ledger(
                    vendor_id,
                    vendor.opening_balance,
                    Orientation::DebitIncreases,
                    events,
                    from,
                    to,
                )
            })
        })
        .await
    }

    /// Account statement: inflows are debits, outflows credits.
    pub async fn account_ledger(
        &self,
        company_id: &str,
        account_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<Ledger> {
        validate_range(from, to)?;
        let company_id = company_id.to_string();
        self.with_tx(|engine, db_tx| {
            let company_id = company_id.clone();
            Box::pin(async move {
                let account = engine
                    .require_account(db_tx, &company_id, account_id)
                    .await?;
                let events = engine
                    .account_events(db_tx, &company_id, account_id)
                    .await?;
                build_ledger(
                    account_id,
                    account.opening_balance,
                    Orientation::DebitIncreases,
                    events,
                    from,
                    to,
                )
            })
        })
        .await
    }

    pub(crate) async fn client_events(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        client_id: Uuid,
    ) -> ResultEngine<Vec<LedgerEvent>> {
        let client_id = client_id.to_string();
        let mut events = Vec::new();

        for invoice in invoices::Entity::find()
            .filter(invoices::Column::CompanyId.eq(company_id))
            .filter(invoices::Column::ClientId.eq(client_id.as_str()))
            .all(db_tx)
            .await?
        {
            events.push(LedgerEvent {
                date: invoice.invoice_date,
                created_at: invoice.created_at,
                voucher_no: invoice.invoice_no,
                id: invoice.id,
                description: "Invoice".to_string(),
                debit: invoice.net_total,
                credit: 0,
            });
        }

        for receipt in money_receipts::Entity::find()
            .filter(money_receipts::Column::CompanyId.eq(company_id))
            .filter(money_receipts::Column::ClientId.eq(client_id.as_str()))
            .all(db_tx)
            .await?
        {
            events.push(LedgerEvent {
                date: receipt.payment_date,
                created_at: receipt.created_at,
                description: receipt_description(&receipt.payment_to, receipt.discount),
                voucher_no: receipt.voucher_no,
                id: receipt.id,
                debit: 0,
                credit: receipt.amount,
            });
        }

        for advance_return in advance_returns::Entity::find()
            .filter(advance_returns::Column::CompanyId.eq(company_id))
            .filter(advance_returns::Column::PartyKind.eq("client"))
            .filter(advance_returns::Column::PartyId.eq(client_id.as_str()))
            .all(db_tx)
            .await?
        {
            events.push(LedgerEvent {
                date: advance_return.return_date,
                created_at: advance_return.created_at,
                voucher_no: advance_return.voucher_no,
                id: advance_return.id,
                description: "Advance return".to_string(),
                debit: advance_return.amount,
                credit: 0,
            });
        }

        Ok(events)
    }

    pub(crate) async fn vendor_events(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        vendor_id: Uuid,
    ) -> ResultEngine<Vec<LedgerEvent>> {
        let vendor_id = vendor_id.to_string();
        let mut events = Vec::new();

        for payment in vendor_payments::Entity::find()
            .filter(vendor_payments::Column::CompanyId.eq(company_id))
            .filter(vendor_payments::Column::VendorId.eq(vendor_id.as_str()))
            .all(db_tx)
            .await?
        {
            events.push(LedgerEvent {
                date: payment.payment_date,
                created_at: payment.created_at,
                description: vendor_payment_description(&payment.payment_to, payment.vendor_ait),
                voucher_no: payment.voucher_no,
                id: payment.id,
                debit: payment.total_amount,
                credit: 0,
            });
        }

        for (cost, invoice) in invoice_vendor_costs::Entity::find()
            .find_also_related(invoices::Entity)
            .filter(invoice_vendor_costs::Column::CompanyId.eq(company_id))
            .filter(invoice_vendor_costs::Column::VendorId.eq(vendor_id.as_str()))
            .all(db_tx)
            .await?
        {
            let invoice = invoice
                .ok_or_else(|| EngineError::NotFound(format!("invoice {}", cost.invoice_id)))?;
            events.push(LedgerEvent {
                date: invoice.invoice_date,
                created_at: invoice.created_at,
                voucher_no: invoice.invoice_no,
                id: cost.id,
                description: "Invoice cost".to_string(),
                debit: 0,
                credit: cost.cost,
            });
        }

        for advance_return in advance_returns::Entity::find()
            .filter(advance_returns::Column::CompanyId.eq(company_id))
            .filter(advance_returns::Column::PartyKind.eq("vendor"))
            .filter(advance_returns::Column::PartyId.eq(vendor_id.as_str()))
            .all(db_tx)
            .await?
        {
            events.push(LedgerEvent {
                date: advance_return.return_date,
                created_at: advance_return.created_at,
                voucher_no: advance_return.voucher_no,
                id: advance_return.id,
                description: "Advance refund".to_string(),
                debit: 0,
                credit: advance_return.amount,
            });
        }

        Ok(events)
    }

    pub(crate) async fn account_events(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: &str,
        account_id: Uuid,
    ) -> ResultEngine<Vec<LedgerEvent>> {
        let account_id = account_id.to_string();
        let mut events = Vec::new();

        for receipt in money_receipts::Entity::find()
            .filter(money_receipts::Column::CompanyId.eq(company_id))
            .filter(money_receipts::Column::AccountId.eq(account_id.as_str()))
            .all(db_tx)
            .await?
        {
            events.push(LedgerEvent {
                date: receipt.payment_date,
                created_at: receipt.created_at,
                description: receipt_description(&receipt.payment_to, receipt.discount),
                voucher_no: receipt.voucher_no,
                id: receipt.id,
                debit: receipt.amount,
                credit: 0,
            });
        }

        for payment in vendor_payments::Entity::find()
            .filter(vendor_payments::Column::CompanyId.eq(company_id))
            .filter(vendor_payments::Column::AccountId.eq(account_id.as_str()))
            .all(db_tx)
            .await?
        {
            events.push(LedgerEvent {
                date: payment.payment_date,
                created_at: payment.created_at,
                description: vendor_payment_description(&payment.payment_to, payment.vendor_ait),
                voucher_no: payment.voucher_no,
                id: payment.id,
                debit: 0,
                credit: payment.amount,
            });
        }

        for transfer in balance_transfers::Entity::find()
            .filter(balance_transfers::Column::CompanyId.eq(company_id))
            .filter(
                balance_transfers::Column::FromAccountId
                    .eq(account_id.as_str())
                    .or(balance_transfers::Column::ToAccountId.eq(account_id.as_str())),
            )
            .all(db_tx)
            .await?
        {
            let legs = transfer.legs()?;
            let (description, debit, credit) = if transfer.from_account_id == account_id {
                ("Transfer out", 0, legs.debit_from)
            } else {
                ("Transfer in", legs.credit_to, 0)
            };
            events.push(LedgerEvent {
                date: transfer.transfer_date,
                created_at: transfer.created_at,
                voucher_no: transfer.voucher_no,
                id: transfer.id,
                description: description.to_string(),
                debit,
                credit,
            });
        }

        for advance_return in advance_returns::Entity::find()
            .filter(advance_returns::Column::CompanyId.eq(company_id))
            .filter(advance_returns::Column::AccountId.eq(account_id.as_str()))
            .all(db_tx)
            .await?
        {
            let (description, debit, credit) = if advance_return.party_kind == "vendor" {
                ("Advance refund from vendor", advance_return.amount, 0)
            } else {
                ("Advance return to client", 0, advance_return.amount)
            };
            events.push(LedgerEvent {
                date: advance_return.return_date,
                created_at: advance_return.created_at,
                voucher_no: advance_return.voucher_no,
                id: advance_return.id,
                description: description.to_string(),
                debit,
                credit,
            });
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(day: u32, voucher: &str, debit: i64, credit: i64) -> LedgerEvent {
        LedgerEvent {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            created_at: DateTime::<Utc>::from_timestamp(day as i64, 0).unwrap(),
            voucher_no: voucher.to_string(),
            id: voucher.to_string(),
            description: String::new(),
            debit,
            credit,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn events_before_range_fold_into_opening() {
        let events = vec![
            event(10, "MR-000002", 0, 300),
            event(1, "INV-000001", 1_000, 0),
            event(20, "INV-000002", 500, 0),
        ];
        let ledger = build_ledger(
            Uuid::nil(),
            0,
            Orientation::CreditIncreases,
            events,
            Some(date(5)),
            Some(date(15)),
        )
        .unwrap();
        assert_eq!(ledger.opening_balance, MoneyCents::new(-1_000));
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows[0].voucher_no, "MR-000002");
        assert_eq!(ledger.closing_balance, MoneyCents::new(-700));
    }

    #[test]
    fn unbounded_ledger_matches_closing_balance() {
        let events = vec![
            event(3, "VP-000001", 2_000, 0),
            event(1, "INV-000001", 0, 1_500),
        ];
        let closing = closing_balance(100, Orientation::DebitIncreases, &events).unwrap();
        let ledger = build_ledger(
            Uuid::nil(),
            100,
            Orientation::DebitIncreases,
            events,
            None,
            None,
        )
        .unwrap();
        assert_eq!(ledger.closing_balance.cents(), closing);
        assert_eq!(ledger.rows[0].voucher_no, "INV-000001");
        assert_eq!(ledger.rows[0].running_balance, MoneyCents::new(-1_400));
        assert_eq!(closing, 600);
    }

    #[test]
    fn same_day_events_order_by_creation_then_voucher() {
        let mut a = event(1, "MR-000002", 0, 1);
        let mut b = event(1, "MR-000001", 0, 1);
        a.created_at = b.created_at;
        b.id = "z".to_string();
        let ledger = build_ledger(
            Uuid::nil(),
            0,
            Orientation::CreditIncreases,
            vec![a, b],
            None,
            None,
        )
        .unwrap();
        assert_eq!(ledger.rows[0].voucher_no, "MR-000001");
    }

    #[test]
    fn voucher_tiebreak_compares_sequence_numbers() {
        let mut wide = event(1, "MR-1000000", 0, 1);
        let narrow = event(1, "MR-999999", 0, 1);
        wide.created_at = narrow.created_at;
        let ledger = build_ledger(
            Uuid::nil(),
            0,
            Orientation::CreditIncreases,
            vec![wide, narrow],
            None,
            None,
        )
        .unwrap();
        assert_eq!(ledger.rows[0].voucher_no, "MR-999999");
        assert_eq!(ledger.rows[1].voucher_no, "MR-1000000");
    }

    #[test]
    fn overflowing_history_is_an_error() {
        let events = vec![event(1, "MR-000001", 0, i64::MAX), event(2, "MR-000002", 0, 1)];
        assert!(matches!(
            closing_balance(0, Orientation::CreditIncreases, &events),
            Err(EngineError::Validation(_))
        ));
        assert!(
            build_ledger(
                Uuid::nil(),
                0,
                Orientation::CreditIncreases,
                events,
                None,
                None
            )
            .is_err()
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(validate_range(Some(date(2)), Some(date(1))).is_err());
        assert!(validate_range(Some(date(1)), None).is_ok());
    }
}
