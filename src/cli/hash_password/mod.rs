//! Hash-password command

use clap::Args;

use crate::infrastructure::user::{Argon2Hasher, PasswordHasher};

#[derive(Args, Debug)]
pub struct HashPasswordArgs {
    /// Plaintext password to hash
    pub password: String,
}

/// Print the PHC-formatted Argon2 hash of the given password
pub fn run(args: HashPasswordArgs) -> anyhow::Result<()> {
    println!("{}", hash(&args.password)?);
    Ok(())
}

fn hash(password: &str) -> anyhow::Result<String> {
    Ok(Argon2Hasher::new().hash(password)?)
}
