// Library root
// -----------
// This crate exposes the library surface for the `campnft` CLI. The binary
// (`main.rs`) wires these modules together and runs the interactive menu.
//
// Module responsibilities:
// - `config`: Loads the pinning token, contract address and wallet endpoint
//   once at start-up and hands them to the components explicitly.
// - `upload`: Pins a file on IPFS through the Pinata HTTP API.
// - `wallet`: Talks to the signing wallet over JSON-RPC (accounts, chain
//   id, transaction submission).
// - `mint`: Encodes the `mintTo` call and submits it through the wallet.
// - `controller`: The upload-then-mint state machine the UI drives.
// - `ui`: Terminal menu flows built on `dialoguer` and `indicatif`.
//
// The upload and mint steps sit behind small traits so the controller can
// be exercised with fakes and the UI could be replaced later.
pub mod config;
pub mod controller;
pub mod error;
pub mod mint;
pub mod types;
pub mod ui;
pub mod upload;
pub mod wallet;
