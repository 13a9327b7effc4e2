//! Allocation planning.
//!
//! Pure functions that decide how much of a payment lands on which open
//! item (an invoice for receipts, a vendor cost line for vendor payments).
//! The engine feeds them the open items as seen inside the current database
//! transaction and persists whatever plan comes back.

use std::collections::HashSet;

use crate::{EngineError, ResultEngine};

/// How a payment is spread across open items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AllocationMode {
    /// Nothing is allocated; the whole amount becomes credit.
    Unallocated,
    /// Oldest open items first, until the pool is exhausted.
    Fifo,
    /// Caller-specified amounts; any amount above an item's remaining due is
    /// rejected.
    Exact,
    /// Caller-specified amounts, each capped at the item's remaining due.
    Clamped,
}

impl AllocationMode {
    pub(crate) fn takes_explicit_lines(self) -> bool {
        matches!(self, Self::Exact | Self::Clamped)
    }
}

/// An item that can still receive money, in settlement order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct OpenItem {
    pub id: String,
    pub label: String,
    pub remaining: i64,
}

/// A requested `(item id, amount)` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RequestedLine {
    pub id: String,
    pub amount: i64,
}

/// Checks the shape of explicit lines before anything is read or written.
pub(crate) fn validate_lines(
    mode: AllocationMode,
    lines: &[RequestedLine],
    pool: i64,
    item_label: &str,
) -> ResultEngine<()> {
    if mode.takes_explicit_lines() {
        if mode == AllocationMode::Exact && lines.is_empty() {
            return Err(EngineError::Validation(format!(
                "at least one {item_label} allocation is required"
            )));
        }
    } else if !lines.is_empty() {
        return Err(EngineError::Validation(format!(
            "{item_label} allocations are not accepted for this payment target"
        )));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    let mut total: i64 = 0;
    for line in lines {
        if line.amount <= 0 {
            return Err(EngineError::Validation(format!(
                "allocation for {item_label} {} must be > 0",
                line.id
            )));
        }
        if !seen.insert(line.id.as_str()) {
            return Err(EngineError::Validation(format!(
                "duplicate allocation for {item_label} {}",
                line.id
            )));
        }
        total = total
            .checked_add(line.amount)
            .ok_or_else(|| EngineError::Validation("allocation total overflows".to_string()))?;
    }
    if total > pool {
        return Err(EngineError::Validation(format!(
            "allocations total {total} exceeds allocatable amount {pool}"
        )));
    }
    Ok(())
}

/// Produces the `(item id, applied amount)` plan. Never returns zero lines
/// and never pushes an item past its remaining due.
pub(crate) fn plan(
    mode: AllocationMode,
    pool: i64,
    requested: &[RequestedLine],
    open: &[OpenItem],
) -> ResultEngine<Vec<(String, i64)>> {
    match mode {
        AllocationMode::Unallocated => Ok(Vec::new()),
        AllocationMode::Fifo => {
            let mut left = pool;
            let mut out = Vec::new();
            for item in open {
                if left <= 0 {
                    break;
                }
                if item.remaining <= 0 {
                    continue;
                }
                let take = left.min(item.remaining);
                out.push((item.id.clone(), take));
                left -= take;
            }
            Ok(out)
        }
        AllocationMode::Exact => requested
            .iter()
            .map(|line| {
                let item = find(open, &line.id)?;
                if line.amount > item.remaining {
                    return Err(EngineError::AllocationExceedsDue(format!(
                        "{} has {} remaining, {} requested",
                        item.label,
                        item.remaining.max(0),
                        line.amount
                    )));
                }
                Ok((item.id.clone(), line.amount))
            })
            .collect(),
        AllocationMode::Clamped => {
            let mut out = Vec::new();
            for line in requested {
                let item = find(open, &line.id)?;
                let take = line.amount.min(item.remaining);
                if take > 0 {
                    out.push((item.id.clone(), take));
                }
            }
            Ok(out)
        }
    }
}

fn find<'a>(open: &'a [OpenItem], id: &str) -> ResultEngine<&'a OpenItem> {
    open.iter()
        .find(|item| item.id == id)
        .ok_or_else(|| EngineError::NotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: &str, remaining: i64) -> OpenItem {
        OpenItem {
            id: id.to_string(),
            label: format!("invoice {id}"),
            remaining,
        }
    }

    fn line(id: &str, amount: i64) -> RequestedLine {
        RequestedLine {
            id: id.to_string(),
            amount,
        }
    }

    #[test]
    fn fifo_fills_oldest_first_and_keeps_remainder() {
        let open = [item("a", 300), item("b", 0), item("c", 500)];
        let plan = plan(AllocationMode::Fifo, 600, &[], &open).unwrap();
        assert_eq!(plan, vec![("a".to_string(), 300), ("c".to_string(), 300)]);
    }

    #[test]
    fn exact_rejects_overpayment() {
        let open = [item("a", 300)];
        let err = plan(AllocationMode::Exact, 1000, &[line("a", 301)], &open).unwrap_err();
        assert!(matches!(err, EngineError::AllocationExceedsDue(_)));
    }

    #[test]
    fn clamped_caps_each_line() {
        let open = [item("a", 300), item("b", 0)];
        let plan = plan(
            AllocationMode::Clamped,
            1000,
            &[line("a", 450), line("b", 100)],
            &open,
        )
        .unwrap();
        assert_eq!(plan, vec![("a".to_string(), 300)]);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let err = plan(AllocationMode::Exact, 100, &[line("zzz", 10)], &[]).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn validate_lines_rules() {
        assert!(validate_lines(AllocationMode::Exact, &[], 100, "invoice").is_err());
        assert!(validate_lines(AllocationMode::Fifo, &[line("a", 1)], 100, "invoice").is_err());
        assert!(
            validate_lines(
                AllocationMode::Exact,
                &[line("a", 10), line("a", 5)],
                100,
                "invoice"
            )
            .is_err()
        );
        assert!(validate_lines(AllocationMode::Clamped, &[line("a", 0)], 100, "invoice").is_err());
        assert!(validate_lines(AllocationMode::Exact, &[line("a", 101)], 100, "invoice").is_err());
        assert!(validate_lines(AllocationMode::Clamped, &[], 100, "invoice").is_ok());
        assert!(validate_lines(AllocationMode::Unallocated, &[], 100, "invoice").is_ok());
    }

    proptest! {
        #[test]
        fn fifo_never_overpays_or_exceeds_pool(
            pool in 0i64..100_000,
            remaining in proptest::collection::vec(0i64..10_000, 0..12),
        ) {
            let open: Vec<OpenItem> = remaining
                .iter()
                .enumerate()
                .map(|(i, r)| item(&i.to_string(), *r))
                .collect();
            let plan = plan(AllocationMode::Fifo, pool, &[], &open).unwrap();
            let total: i64 = plan.iter().map(|(_, amount)| amount).sum();
            prop_assert!(total <= pool);
            for (id, amount) in &plan {
                let open_item = open.iter().find(|o| &o.id == id).unwrap();
                prop_assert!(*amount > 0);
                prop_assert!(*amount <= open_item.remaining);
            }
            let capacity: i64 = remaining.iter().sum();
            prop_assert_eq!(total, pool.min(capacity));
        }
    }
}
