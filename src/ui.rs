// UI layer: an interactive menu using `dialoguer`, with an `indicatif`
// spinner while the upload and mint steps run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use crate::config::MintConfig;
use crate::controller::{FlowState, MintFlow};
use crate::mint::{Minter, TokenMinter};
use crate::types::SelectedFile;
use crate::upload::FileUploader;
use crate::wallet::WalletClient;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Connect,
    Disconnect,
    SelectImage,
    RemoveImage,
    Mint,
    CopyHash,
    ViewOnExplorer,
    Exit,
}

/// Menu entries valid for the current flow.
fn menu_actions<U, M>(flow: &MintFlow<U, M>) -> Vec<(&'static str, Action)>
where
    U: FileUploader,
    M: TokenMinter,
{
    let mut actions = Vec::new();
    if flow.address().is_none() {
        actions.push(("Connect wallet", Action::Connect));
    } else {
        actions.push(("Disconnect wallet", Action::Disconnect));
    }
    actions.push(("Select image", Action::SelectImage));
    if flow.selected_file().is_some() {
        actions.push(("Remove image", Action::RemoveImage));
    }
    if flow.can_mint() {
        actions.push(("Mint NFT", Action::Mint));
    }
    if flow.last_transaction().is_some() {
        actions.push(("Copy transaction hash", Action::CopyHash));
        actions.push(("View on Blockscout", Action::ViewOnExplorer));
    }
    actions.push(("Exit", Action::Exit));
    actions
}

/// Main interactive menu. Only actions valid in the current state are
/// listed, so "Mint NFT" disappears while a wallet or image is missing.
pub fn main_menu<U, W>(mut flow: MintFlow<U, Minter<W>>, config: &MintConfig) -> Result<()>
where
    U: FileUploader,
    W: WalletClient,
{
    println!("{}", "NFT Minting".bold());
    println!("Upload an image to mint your NFT\n");

    // Kept alive for the whole session: on X11 the copied text is served by
    // this handle and disappears once it is dropped.
    let mut clipboard: Option<arboard::Clipboard> = None;

    loop {
        print_status(&flow);

        let actions = menu_actions(&flow);

        let labels: Vec<&str> = actions.iter().map(|(label, _)| *label).collect();
        let selection = Select::new().items(&labels).default(0).interact()?;

        match actions[selection].1 {
            Action::Connect => {
                let spinner = spinner("Connecting wallet...")?;
                let connected = flow.minter().wallet().connect(config.chain_id);
                spinner.finish_and_clear();
                match connected {
                    Ok(address) => {
                        println!("Connected {}", address);
                        flow.connect(address);
                    }
                    Err(e) => println!("{} {}", "Wallet connection failed:".red(), e),
                }
            }
            Action::Disconnect => flow.disconnect(),
            Action::SelectImage => match pick_image()? {
                Some(path) => match SelectedFile::from_path(&path) {
                    Ok(file) => {
                        print_preview(&file);
                        flow.select_file(file);
                    }
                    Err(e) => println!("{} {:#}", "Could not open image:".red(), e),
                },
                None => println!("No image selected."),
            },
            Action::RemoveImage => flow.clear_file(),
            Action::Mint => handle_mint(&mut flow)?,
            Action::CopyHash => {
                if let Some(tx) = flow.last_transaction() {
                    match copy_to_clipboard(&mut clipboard, tx.as_str()) {
                        Ok(()) => println!("Transaction hash copied."),
                        Err(e) => {
                            warn!(error = %e, "clipboard unavailable");
                            println!("Clipboard unavailable, hash: {}", tx);
                        }
                    }
                }
            }
            Action::ViewOnExplorer => {
                if let Some(tx) = flow.last_transaction() {
                    let url = tx.explorer_url(&config.explorer_url);
                    if let Err(e) = open::that(&url) {
                        warn!(error = %e, %url, "failed to open browser");
                        println!("Open {} in your browser.", url);
                    }
                }
            }
            Action::Exit => break,
        }
    }
    Ok(())
}

/// Run one upload+mint sequence with a spinner following the flow state.
fn handle_mint<U, W>(flow: &mut MintFlow<U, Minter<W>>) -> Result<()>
where
    U: FileUploader,
    W: WalletClient,
{
    let spinner = spinner("Minting...")?;
    let result = flow.mint(|state| match state {
        FlowState::Uploading => spinner.set_message("Uploading to IPFS..."),
        FlowState::Minting => spinner.set_message("Confirm the transaction in your wallet..."),
        _ => {}
    });
    spinner.finish_and_clear();

    match result {
        Ok(tx) => {
            println!("{}", "Minting Successful!".green().bold());
            println!("Your NFT has been minted successfully. Here's your transaction hash:");
            println!("  {}", tx.as_str().green());
        }
        // The specific error was already logged by the flow.
        Err(_) => println!("{}", "Mint failed.".red().bold()),
    }
    Ok(())
}

fn copy_to_clipboard(
    clipboard: &mut Option<arboard::Clipboard>,
    text: &str,
) -> std::result::Result<(), arboard::Error> {
    if clipboard.is_none() {
        *clipboard = Some(arboard::Clipboard::new()?);
    }
    match clipboard.as_mut() {
        Some(board) => board.set_text(text.to_owned()),
        None => Ok(()),
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn print_status<U, M>(flow: &MintFlow<U, M>)
where
    U: FileUploader,
    M: TokenMinter,
{
    println!();
    match flow.address() {
        Some(address) => println!("Wallet: {}", address),
        None => println!("{}", "Please connect your wallet to mint an NFT".yellow()),
    }
    match flow.selected_file() {
        Some(file) => println!("Image: {}", file.name()),
        None => println!("Image: none"),
    }
}

/// Name, size, type and (when decodable) dimensions of the picked image.
fn print_preview(file: &SelectedFile) {
    println!("{}", "Preview".bold());
    println!("  name: {}", file.name());
    println!("  size: {} bytes", file.size());
    println!("  type: {}", file.mime());
    if let Some((w, h)) = file.dimensions() {
        println!("  dimensions: {}x{}", w, h);
    }
}

/// Offer the native file dialog, falling back to a typed path.
fn pick_image() -> Result<Option<PathBuf>> {
    let choices = ["Browse...", "Type a path"];
    let choice = Select::new().items(&choices).default(0).interact()?;
    if choice == 0 {
        let picked = rfd::FileDialog::new()
            .set_title("Select an image")
            .add_filter("Image", IMAGE_EXTENSIONS)
            .pick_file();
        if picked.is_some() {
            return Ok(picked);
        }
    }

    let path: String = Input::new()
        .with_prompt("Image file path")
        .allow_empty(true)
        .interact_text()?;
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(path)))
}
