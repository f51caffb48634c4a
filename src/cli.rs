use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "converge")]
#[command(about = "Reconcile declared applications against the inventory API", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $CONVERGE_CONFIG or config/converge.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a specification and print the provisioning request
    Plan(SpecArgs),
    /// Create the application, or refresh it when it is already managed
    Apply(SpecArgs),
    /// Refresh stored state from the inventory
    Refresh(RefreshArgs),
    /// Delete a managed application
    Destroy(ResourceArgs),
    /// Start managing an existing application
    Import(ImportArgs),
}

#[derive(clap::Args, Debug)]
pub struct SpecArgs {
    /// TOML file holding the desired specification
    pub spec: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct RefreshArgs {
    /// Resource name; every stored resource when omitted
    pub name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ResourceArgs {
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Name to store the imported state under
    pub name: String,

    /// Application identifier in the inventory
    #[arg(long)]
    pub id: String,

    /// Owning organization; the caller's own account when omitted
    #[arg(long)]
    pub organization: Option<String>,
}
