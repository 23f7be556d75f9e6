// Wallet connection over JSON-RPC. The wallet owns the keys: it picks the
// account, asks the user to sign and broadcasts. We only send requests
// and read back results.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use alloy_primitives::{hex, Address, U64};
use anyhow::Context;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::MintConfig;
use crate::error::{ContractCallError, TransportError};
use crate::types::{TransactionIdentifier, WalletAddress};

/// A state-changing call to submit through the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Chain the transaction must be signed for; the wallet refuses a
    /// mismatch with its active network.
    pub chain_id: u64,
    pub to: Address,
    pub data: Vec<u8>,
}

/// The external component that holds keys, signs and broadcasts.
pub trait WalletClient {
    /// Accounts the user has authorised, first one is the active account.
    fn request_accounts(&self) -> Result<Vec<WalletAddress>, ContractCallError>;

    fn chain_id(&self) -> Result<u64, ContractCallError>;

    /// Hand a transaction to the wallet, sent from the connected account.
    /// Returns once it is accepted for broadcast, without waiting for
    /// inclusion.
    fn send_transaction(
        &self,
        tx: &TransactionRequest,
    ) -> Result<TransactionIdentifier, ContractCallError>;

    /// Pick the active account after checking the wallet is on the
    /// expected chain.
    fn connect(&self, expected_chain: u64) -> Result<WalletAddress, ContractCallError> {
        let actual = self.chain_id()?;
        if actual != expected_chain {
            return Err(ContractCallError::WrongChain {
                expected: expected_chain,
                actual,
            });
        }
        self.request_accounts()?
            .into_iter()
            .next()
            .ok_or(ContractCallError::NoAccount)
    }
}

#[derive(Deserialize, Debug)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize, Debug)]
struct RpcError {
    code: i64,
    message: String,
}

/// Wallet reached through an EIP-1193 style JSON-RPC endpoint, for example
/// the local port a desktop wallet exposes.
pub struct JsonRpcWallet {
    client: Client,
    url: String,
    next_id: AtomicU64,
    account: Mutex<Option<Address>>,
}

impl JsonRpcWallet {
    pub fn new(config: &MintConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(JsonRpcWallet {
            client,
            url: config.wallet_rpc_url.clone(),
            next_id: AtomicU64::new(1),
            account: Mutex::new(None),
        })
    }

    fn call(&self, method: &str, params: Value) -> Result<Value, ContractCallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(%method, id, url = %self.url, "wallet request");
        let res = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(TransportError::from)?;
        let status = res.status();
        let text = res.text().map_err(TransportError::from)?;

        let reply: RpcResponse = serde_json::from_str(&text)
            .map_err(|_| ContractCallError::InvalidResponse(format!("{status}: {text}")))?;
        if let Some(err) = reply.error {
            warn!(%method, code = err.code, message = %err.message, "wallet returned error");
            return Err(ContractCallError::Rejected {
                code: err.code,
                message: err.message,
            });
        }
        reply
            .result
            .ok_or_else(|| ContractCallError::InvalidResponse(format!("no result for {method}")))
    }

    fn remembered_account(&self) -> Option<Address> {
        self.account.lock().ok().and_then(|guard| *guard)
    }
}

impl WalletClient for JsonRpcWallet {
    fn request_accounts(&self) -> Result<Vec<WalletAddress>, ContractCallError> {
        let value = self.call("eth_requestAccounts", json!([]))?;
        let raw: Vec<String> = serde_json::from_value(value)
            .map_err(|e| ContractCallError::InvalidResponse(e.to_string()))?;
        let accounts = raw
            .iter()
            .map(|s| {
                s.parse::<WalletAddress>()
                    .map_err(|_| ContractCallError::InvalidResponse(format!("bad account {s}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let (Some(first), Ok(mut guard)) = (accounts.first(), self.account.lock()) {
            *guard = Some(first.address());
        }
        Ok(accounts)
    }

    fn chain_id(&self) -> Result<u64, ContractCallError> {
        let value = self.call("eth_chainId", json!([]))?;
        let raw = value
            .as_str()
            .ok_or_else(|| ContractCallError::InvalidResponse(value.to_string()))?;
        parse_quantity(raw)
            .ok_or_else(|| ContractCallError::InvalidResponse(format!("bad chain id {raw}")))
    }

    fn send_transaction(
        &self,
        tx: &TransactionRequest,
    ) -> Result<TransactionIdentifier, ContractCallError> {
        let mut params = json!({
            "to": tx.to.to_string(),
            "data": hex::encode_prefixed(&tx.data),
            "chainId": format!("{:#x}", tx.chain_id),
        });
        if let Some(from) = self.remembered_account() {
            params["from"] = json!(from.to_string());
        }

        let value = self.call("eth_sendTransaction", json!([params]))?;
        let hash = value
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ContractCallError::InvalidResponse(value.to_string()))?;
        info!(tx = hash, "transaction submitted");
        Ok(TransactionIdentifier::from(hash.to_string()))
    }
}

/// Hex quantity such as `0x1cbc67c35a`.
fn parse_quantity(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    U64::from_str_radix(digits, 16).ok().map(|q| q.to::<u64>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const ACCOUNT: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn wallet_for(server: &mockito::ServerGuard) -> JsonRpcWallet {
        let mut config = MintConfig::with_defaults("jwt", Address::ZERO);
        config.wallet_rpc_url = server.url();
        JsonRpcWallet::new(&config).unwrap()
    }

    fn rpc_mock(server: &mut mockito::ServerGuard, method: &str, reply: Value) -> mockito::Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply.to_string())
            .create()
    }

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x1cbc67c35a"), Some(123_420_001_114));
        assert_eq!(parse_quantity("0x1"), Some(1));
        assert_eq!(parse_quantity("12"), None);
        assert_eq!(parse_quantity("0x1ffffffffffffffff"), None);
    }

    #[test]
    fn connect_checks_chain_and_picks_first_account() {
        let mut server = mockito::Server::new();
        let _chain = rpc_mock(&mut server, "eth_chainId", json!({"jsonrpc":"2.0","id":1,"result":"0x1cbc67c35a"}));
        let _accounts = rpc_mock(&mut server, "eth_requestAccounts", json!({"jsonrpc":"2.0","id":2,"result":[ACCOUNT]}));

        let address = wallet_for(&server).connect(123_420_001_114).unwrap();
        assert_eq!(address, ACCOUNT.parse().unwrap());
    }

    #[test]
    fn connect_refuses_other_chain() {
        let mut server = mockito::Server::new();
        let _chain = rpc_mock(&mut server, "eth_chainId", json!({"jsonrpc":"2.0","id":1,"result":"0x1"}));

        let err = wallet_for(&server).connect(123_420_001_114).unwrap_err();
        assert!(matches!(
            err,
            ContractCallError::WrongChain { expected: 123_420_001_114, actual: 1 }
        ));
    }

    #[test]
    fn connect_without_accounts_fails() {
        let mut server = mockito::Server::new();
        let _chain = rpc_mock(&mut server, "eth_chainId", json!({"jsonrpc":"2.0","id":1,"result":"0x1"}));
        let _accounts = rpc_mock(&mut server, "eth_requestAccounts", json!({"jsonrpc":"2.0","id":2,"result":[]}));

        let err = wallet_for(&server).connect(1).unwrap_err();
        assert!(matches!(err, ContractCallError::NoAccount));
    }

    #[test]
    fn send_uses_connected_account_as_sender() {
        let mut server = mockito::Server::new();
        let _accounts = rpc_mock(&mut server, "eth_requestAccounts", json!({"jsonrpc":"2.0","id":1,"result":[ACCOUNT]}));
        let send = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "method": "eth_sendTransaction" })),
                Matcher::Regex(r#""data":"0x0102""#.into()),
                Matcher::Regex(format!(r#""from":"(?i){ACCOUNT}""#)),
                Matcher::Regex(r#""chainId":"0x1cbc67c35a""#.into()),
            ]))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":2,"result":"0xdeadbeef"}"#)
            .create();

        let wallet = wallet_for(&server);
        wallet.request_accounts().unwrap();
        let tx = wallet
            .send_transaction(&TransactionRequest {
                chain_id: 123_420_001_114,
                to: Address::ZERO,
                data: vec![1, 2],
            })
            .unwrap();

        send.assert();
        assert_eq!(tx.as_str(), "0xdeadbeef");
    }

    #[test]
    fn user_rejection_is_propagated() {
        let mut server = mockito::Server::new();
        let _send = rpc_mock(
            &mut server,
            "eth_sendTransaction",
            json!({"jsonrpc":"2.0","id":1,"error":{"code":4001,"message":"User rejected the request."}}),
        );

        let err = wallet_for(&server)
            .send_transaction(&TransactionRequest {
                chain_id: 1,
                to: Address::ZERO,
                data: vec![],
            })
            .unwrap_err();
        match err {
            ContractCallError::Rejected { code, message } => {
                assert_eq!(code, 4001);
                assert!(message.contains("rejected"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn garbage_reply_is_invalid_response() {
        let mut server = mockito::Server::new();
        let _gateway = server
            .mock("POST", "/")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create();

        let err = wallet_for(&server).chain_id().unwrap_err();
        assert!(matches!(err, ContractCallError::InvalidResponse(_)));
    }
}
