// Minting: encode `mintTo(address,string)` and hand it to the wallet.

use alloy_primitives::Address;
use alloy_sol_types::{sol, SolCall};
use tracing::{debug, info};

use crate::config::MintConfig;
use crate::error::ContractCallError;
use crate::types::{ContentLocator, TransactionIdentifier, WalletAddress};
use crate::wallet::{TransactionRequest, WalletClient};

sol! {
    /// Nonpayable; returns the new token id.
    function mintTo(address to, string uri) external returns (uint256);
}

/// Anything that can mint a token pointing at `uri` for `to`.
pub trait TokenMinter {
    fn mint_to(
        &self,
        to: &WalletAddress,
        uri: &ContentLocator,
    ) -> Result<TransactionIdentifier, ContractCallError>;
}

/// ABI calldata for `mintTo(to, uri)`.
pub fn encode_mint_call(to: Address, uri: &str) -> Vec<u8> {
    mintToCall {
        to,
        uri: uri.to_string(),
    }
    .abi_encode()
}

/// Submits mint calls for one fixed contract through a wallet.
///
/// No idempotency: calling twice with the same inputs mints twice.
pub struct Minter<W> {
    wallet: W,
    contract: Address,
    chain_id: u64,
}

impl<W: WalletClient> Minter<W> {
    pub fn new(wallet: W, config: &MintConfig) -> Self {
        Self {
            wallet,
            contract: config.contract_address,
            chain_id: config.chain_id,
        }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }
}

impl<W: WalletClient> TokenMinter for Minter<W> {
    fn mint_to(
        &self,
        to: &WalletAddress,
        uri: &ContentLocator,
    ) -> Result<TransactionIdentifier, ContractCallError> {
        if uri.is_empty() {
            return Err(ContractCallError::EmptyLocator);
        }

        // The user may have switched networks since connecting.
        let actual = self.wallet.chain_id()?;
        if actual != self.chain_id {
            return Err(ContractCallError::WrongChain {
                expected: self.chain_id,
                actual,
            });
        }

        let tx = TransactionRequest {
            chain_id: self.chain_id,
            to: self.contract,
            data: encode_mint_call(to.address(), uri.as_str()),
        };
        debug!(contract = %self.contract, %to, %uri, "submitting mintTo");
        let hash = self.wallet.send_transaction(&tx)?;
        info!(tx = %hash, %to, "mint submitted");
        Ok(hash)
    }
}
