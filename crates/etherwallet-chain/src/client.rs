//! The chain client seam.

use std::future::Future;

use etherwallet_types::{Address, ChainParameters, Result, TxHash, U256};

/// Read and broadcast access to an EVM chain.
///
/// Implementations must apply their own request timeout. Transient
/// transport failures surface as `NetworkError` (retryable by the
/// caller), undecodable replies as `MalformedResponse`, and node-side
/// refusals as `Rejected`. Implementations never retry internally.
pub trait ChainClient: Send + Sync {
    /// Next nonce for `address`, counting transactions still in the pool.
    fn pending_nonce(&self, address: &Address) -> impl Future<Output = Result<u64>> + Send;

    /// Gas price the node currently suggests, in wei.
    fn suggest_gas_price(&self) -> impl Future<Output = Result<U256>> + Send;

    /// Replay-protection chain identifier.
    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Latest confirmed balance of `address`, in wei.
    fn balance_of(&self, address: &Address) -> impl Future<Output = Result<U256>> + Send;

    /// Submits a signed, encoded transaction and returns its hash.
    fn broadcast(&self, signed_tx: &[u8]) -> impl Future<Output = Result<TxHash>> + Send;

    /// Fetches everything needed to build a transaction from `address`.
    ///
    /// Always queries the node; the result must not be cached across
    /// signing attempts.
    fn chain_parameters(
        &self,
        address: &Address,
    ) -> impl Future<Output = Result<ChainParameters>> + Send {
        async move {
            let chain_id = self.chain_id().await?;
            let suggested_gas_price = self.suggest_gas_price().await?;
            let pending_nonce = self.pending_nonce(address).await?;
            Ok(ChainParameters {
                chain_id,
                suggested_gas_price,
                pending_nonce,
            })
        }
    }
}
