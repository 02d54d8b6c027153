use crate::db::{Repository, TxQuery};
use crate::domain::{
    sort_transactions_deterministic, CostBasisMethod, Position, RealizedSale, Transaction, UserId,
};
use crate::engine::{
    compute_realized, reconstruct, Filters, RealizedError, ReplayError, StablecoinSet,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Runs the full derivation pipeline for one user: load the organic
/// ledger, replay it into positions, compute realized records, and
/// commit everything atomically.
#[derive(Clone)]
pub struct Recalculator {
    repo: Arc<Repository>,
    stablecoins: StablecoinSet,
    default_method: CostBasisMethod,
}

#[derive(Debug)]
pub struct RecalcSummary {
    pub positions: Vec<Position>,
    pub synthetic_emitted: usize,
    pub realized_records: usize,
    pub skipped_sales: u32,
    pub method: CostBasisMethod,
}

#[derive(Debug, Error)]
pub enum RecalcError {
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Realized(#[from] RealizedError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl Recalculator {
    pub fn new(
        repo: Arc<Repository>,
        stablecoins: StablecoinSet,
        default_method: CostBasisMethod,
    ) -> Self {
        Self {
            repo,
            stablecoins,
            default_method,
        }
    }

    pub fn default_method(&self) -> CostBasisMethod {
        self.default_method
    }

    pub fn stablecoins(&self) -> &StablecoinSet {
        &self.stablecoins
    }

    /// Recalculate the user's derived state from the organic log.
    ///
    /// Synthetic credits emitted by the replay are folded into the
    /// realized computation (so stablecoin lots exist at their credited
    /// cost) and persisted alongside positions and realized records in
    /// one database transaction.
    pub async fn recalculate(
        &self,
        user: &UserId,
        method: Option<CostBasisMethod>,
    ) -> Result<RecalcSummary, RecalcError> {
        let method = method.unwrap_or(self.default_method);

        // Stored synthetic rows are excluded so replay output is a pure
        // function of the organic log.
        let organic = self.repo.query_transactions(user, &TxQuery::default()).await?;

        let outcome = reconstruct(&organic, &self.stablecoins)?;

        let mut full: Vec<Transaction> = organic;
        full.extend(outcome.synthetic.iter().cloned());
        // Stable sort keeps each credit directly after the sale that
        // produced it, since they share a timestamp.
        sort_transactions_deterministic(&mut full);

        let report = compute_realized(&full, method, &Filters::default())?;
        let realized: Vec<RealizedSale> = report
            .symbols
            .into_iter()
            .flat_map(|s| s.sales)
            .collect();

        self.repo
            .commit_recalculation(
                user,
                &outcome.positions,
                &outcome.synthetic,
                method,
                &realized,
            )
            .await?;

        info!(
            user = user.as_str(),
            positions = outcome.positions.len(),
            synthetic = outcome.synthetic.len(),
            realized = realized.len(),
            skipped_sales = report.skipped_sales,
            method = %method,
            "Recalculation committed"
        );

        Ok(RecalcSummary {
            positions: outcome.positions,
            synthetic_emitted: outcome.synthetic.len(),
            realized_records: realized.len(),
            skipped_sales: report.skipped_sales,
            method,
        })
    }

    /// Append a transaction to the log and recalculate.
    ///
    /// Returns whether the row was new alongside the recalculation
    /// summary. A duplicate key still triggers a recalculation so the
    /// derived state is guaranteed fresh after the call.
    pub async fn append_and_recalculate(
        &self,
        user: &UserId,
        tx: &Transaction,
    ) -> Result<(bool, RecalcSummary), RecalcError> {
        let inserted = self.repo.insert_transaction(tx).await?;
        let summary = self.recalculate(user, None).await?;
        Ok((inserted, summary))
    }

    /// Delete a transaction from the log and recalculate.
    ///
    /// Returns whether a row was removed. Deleting an organic sale also
    /// strands any synthetic credit it produced; the fresh replay no
    /// longer emits that credit, and stored synthetic rows are never
    /// replay input, so the stale row is inert until the next emission
    /// overwrites it.
    pub async fn delete_and_recalculate(
        &self,
        user: &UserId,
        tx_key: &str,
    ) -> Result<(bool, RecalcSummary), RecalcError> {
        let deleted = self.repo.delete_transaction(user, tx_key).await?;
        let summary = self.recalculate(user, None).await?;
        Ok((deleted, summary))
    }
}
