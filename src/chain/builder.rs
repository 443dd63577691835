//! Transaction assembly and signing.
//!
//! # Responsibilities
//! - Turn a list of operations into a fully signed transaction
//! - Attach a fresh credit delegation to every build
//!
//! # Data Flow
//! ```text
//! operations
//!   -> Delegation::prepare (balance query, fresh payee)
//!   -> header { chain_id, payer, payee, rc_limit, nonce }
//!   -> digest = SHA-256(canonical JSON of header + operations)
//!   -> signatures = [payee, operator] over digest
//!   -> Transaction { id = hex(digest), ... }
//! ```

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::keys::Keypair;
use super::rpc::LedgerRpc;
use super::sponsor::Delegation;
use super::types::{ChainError, ChainResult, Operation, Transaction, TransactionHeader};

/// Builds and signs transactions on behalf of the operator.
pub struct TxBuilder {
    rpc: Arc<dyn LedgerRpc>,
    operator: Keypair,
    chain_id: String,
    rc_limit_divisor: u64,
}

impl TxBuilder {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        operator: Keypair,
        chain_id: String,
        rc_limit_divisor: u64,
    ) -> Self {
        Self {
            rpc,
            operator,
            chain_id,
            rc_limit_divisor,
        }
    }

    pub fn operator_address(&self) -> String {
        self.operator.address()
    }

    /// Assembles a signed transaction around the given operations.
    ///
    /// Every call produces a distinct transaction: the delegation mints a
    /// new payee and the header carries a random nonce.
    pub async fn build_signed(&self, operations: Vec<Operation>) -> ChainResult<Transaction> {
        let delegation =
            Delegation::prepare(self.rpc.as_ref(), &self.operator, self.rc_limit_divisor).await?;

        let header = TransactionHeader {
            chain_id: self.chain_id.clone(),
            payer: self.operator.address(),
            payee: delegation.payee_address(),
            rc_limit: delegation.rc_limit(),
            nonce: fastrand::u64(..),
        };

        let digest = transaction_digest(&header, &operations)?;
        let signatures = vec![delegation.co_sign(&digest), self.operator.sign_digest(&digest)];

        let transaction = Transaction {
            id: hex::encode(digest),
            header,
            operations,
            signatures,
        };
        debug!(
            transaction = %transaction.id,
            operations = transaction.operations.len(),
            rc_limit = transaction.header.rc_limit,
            "built signed transaction"
        );
        Ok(transaction)
    }
}

impl std::fmt::Debug for TxBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxBuilder")
            .field("operator", &self.operator.address())
            .field("chain_id", &self.chain_id)
            .field("rc_limit_divisor", &self.rc_limit_divisor)
            .finish()
    }
}

/// Digest both parties sign: SHA-256 over the canonical JSON encoding of
/// the header and operations. Field order is fixed by the struct layout.
pub(crate) fn transaction_digest(
    header: &TransactionHeader,
    operations: &[Operation],
) -> ChainResult<[u8; 32]> {
    #[derive(Serialize)]
    struct SigningPayload<'a> {
        header: &'a TransactionHeader,
        operations: &'a [Operation],
    }

    let encoded = serde_json::to_vec(&SigningPayload { header, operations })
        .map_err(|e| ChainError::Build(format!("failed to encode transaction: {}", e)))?;
    Ok(Sha256::digest(&encoded).into())
}
