use sea_orm::{ConnectionTrait, Statement};

use crate::{EngineError, ResultEngine, Series};

use super::{Engine, parties::require_company};

const NEXT_SEQ_SQL: &str = "INSERT INTO counters (counter_key, seq) VALUES (?, 1) \
     ON CONFLICT(counter_key) DO UPDATE SET seq = seq + 1 \
     RETURNING seq";

impl Engine {
    /// Issues the next voucher number of `series` for `company_id`.
    ///
    /// The increment is one upsert statement committed on its own, so two
    /// concurrent callers never observe the same value. A number issued for
    /// an event that later fails is simply skipped.
    pub async fn next_voucher(&self, series: Series, company_id: &str) -> ResultEngine<String> {
        let key = series.counter_key(&require_company(company_id)?);
        let seq = self
            .with_tx(|_, db_tx| {
                let key = key.clone();
                Box::pin(async move {
                    let backend = db_tx.get_database_backend();
                    let row = db_tx
                        .query_one(Statement::from_sql_and_values(
                            backend,
                            NEXT_SEQ_SQL,
                            vec![key.clone().into()],
                        ))
                        .await?
                        .ok_or_else(|| {
                            EngineError::ConcurrentModification(format!(
                                "counter {key} returned no row"
                            ))
                        })?;
                    let seq: i64 = row.try_get("", "seq")?;
                    Ok(seq)
                })
            })
            .await?;
        Ok(series.format(seq))
    }
}
