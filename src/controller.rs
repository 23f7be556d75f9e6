// Upload-then-mint flow. One sequence at a time: `mint` takes `&mut self`
// and runs both steps to completion before returning.

use tracing::{error, info};

use crate::error::FlowError;
use crate::mint::TokenMinter;
use crate::types::{SelectedFile, TransactionIdentifier, WalletAddress};
use crate::upload::FileUploader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    FileSelected,
    Uploading,
    Minting,
    Success(TransactionIdentifier),
    Failed,
}

impl FlowState {
    pub fn is_busy(&self) -> bool {
        matches!(self, FlowState::Uploading | FlowState::Minting)
    }

    /// Whether the mint action may be offered at all in this state.
    pub fn trigger_enabled(&self) -> bool {
        !self.is_busy()
    }
}

/// Holds the selected file and wallet address and drives the two steps.
pub struct MintFlow<U, M> {
    uploader: U,
    minter: M,
    state: FlowState,
    file: Option<SelectedFile>,
    address: Option<WalletAddress>,
}

impl<U: FileUploader, M: TokenMinter> MintFlow<U, M> {
    pub fn new(uploader: U, minter: M) -> Self {
        Self {
            uploader,
            minter,
            state: FlowState::Idle,
            file: None,
            address: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn address(&self) -> Option<&WalletAddress> {
        self.address.as_ref()
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    pub fn minter(&self) -> &M {
        &self.minter
    }

    /// Transaction of the last successful sequence, if the flow is still
    /// showing it.
    pub fn last_transaction(&self) -> Option<&TransactionIdentifier> {
        match &self.state {
            FlowState::Success(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn connect(&mut self, address: WalletAddress) {
        self.address = Some(address);
    }

    pub fn disconnect(&mut self) {
        self.address = None;
    }

    /// Replace the selection. Also the manual reset out of Success/Failed.
    pub fn select_file(&mut self, file: SelectedFile) {
        if self.state.is_busy() {
            return;
        }
        self.file = Some(file);
        self.state = FlowState::FileSelected;
    }

    pub fn clear_file(&mut self) {
        if self.state.is_busy() {
            return;
        }
        self.file = None;
        self.state = FlowState::Idle;
    }

    pub fn can_mint(&self) -> bool {
        self.state.trigger_enabled() && self.file.is_some() && self.address.is_some()
    }

    /// Upload the selected file, then mint a token pointing at it.
    ///
    /// `observe` sees every state the flow enters. The specific error is
    /// logged here and returned; callers only need to show a generic
    /// failure notice.
    pub fn mint<F>(&mut self, mut observe: F) -> Result<TransactionIdentifier, FlowError>
    where
        F: FnMut(&FlowState),
    {
        let (file, address) = match (&self.file, &self.address) {
            (Some(file), Some(address)) if self.state.trigger_enabled() => (file, address),
            _ => return Err(FlowError::NotReady),
        };

        enter(&mut self.state, FlowState::Uploading, &mut observe);
        let minter = &self.minter;
        let state = &mut self.state;
        let outcome = self
            .uploader
            .upload(file)
            .map_err(FlowError::from)
            .and_then(|locator| {
                enter(state, FlowState::Minting, &mut observe);
                minter.mint_to(address, &locator).map_err(FlowError::from)
            });

        match outcome {
            Ok(tx) => {
                info!(%tx, file = file.name(), "mint flow finished");
                enter(&mut self.state, FlowState::Success(tx.clone()), &mut observe);
                Ok(tx)
            }
            Err(err) => {
                error!(error = %err, file = file.name(), "mint flow failed");
                enter(&mut self.state, FlowState::Failed, &mut observe);
                Err(err)
            }
        }
    }
}

fn enter<F: FnMut(&FlowState)>(state: &mut FlowState, next: FlowState, observe: &mut F) {
    *state = next;
    observe(state);
}
