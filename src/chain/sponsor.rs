//! Resource credit delegation.
//!
//! # Responsibilities
//! - Size each transaction's credit limit from the operator's live balance
//! - Mint the single-use payee keypair that co-authorizes the spend
//!
//! # Design Decisions
//! - The limit is an integer fraction of the operator's available credits
//!   (`rc / rc_limit_divisor`), so a burst of in-flight transactions can
//!   never pledge the whole balance at once.
//! - The payee keypair is generated per delegation and discarded after
//!   signing. Nothing about it persists, so a leaked transaction grants
//!   no authority beyond itself.

use tracing::debug;

use super::keys::Keypair;
use super::rpc::LedgerRpc;
use super::types::{ChainError, ChainResult};

/// A one-shot grant of operator credits to a single transaction.
pub struct Delegation {
    payee: Keypair,
    rc_limit: u64,
}

impl Delegation {
    /// Queries the operator's balance and prepares a delegation for one
    /// transaction. Fails when the computed limit would be zero.
    pub async fn prepare(
        rpc: &dyn LedgerRpc,
        operator: &Keypair,
        rc_limit_divisor: u64,
    ) -> ChainResult<Self> {
        let operator_address = operator.address();
        let available = rpc.account_rc(&operator_address).await?;
        let rc_limit = available / rc_limit_divisor;
        if rc_limit == 0 {
            return Err(ChainError::Build(format!(
                "operator {} has insufficient credits: {} available, divisor {}",
                operator_address, available, rc_limit_divisor
            )));
        }

        let payee = Keypair::generate();
        debug!(
            payee = %payee.address(),
            rc_limit,
            available,
            "prepared credit delegation"
        );

        Ok(Self { payee, rc_limit })
    }

    pub fn payee_address(&self) -> String {
        self.payee.address()
    }

    pub fn rc_limit(&self) -> u64 {
        self.rc_limit
    }

    /// Payee co-signature over a transaction digest.
    pub fn co_sign(&self, digest: &[u8; 32]) -> String {
        self.payee.sign_digest(digest)
    }

    #[cfg(test)]
    pub(crate) fn payee_verifying_key(&self) -> ed25519_dalek::VerifyingKey {
        self.payee.verifying_key()
    }
}

impl std::fmt::Debug for Delegation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegation")
            .field("payee", &self.payee.address())
            .field("rc_limit", &self.rc_limit)
            .finish()
    }
}
