//! CLI module for the storefront session service
//!
//! - `serve`: run the HTTP server
//! - `hash-password`: print an Argon2 hash for a seed user's password

pub mod hash_password;
pub mod serve;

use clap::{Parser, Subcommand};

/// Storefront session state - carts and token revocation
#[derive(Parser)]
#[command(name = "storefront-session")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Hash a password for use in the `users` config section
    HashPassword(hash_password::HashPasswordArgs),
}
