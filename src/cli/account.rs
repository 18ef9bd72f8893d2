use std::error::Error;
use std::io::{self, BufRead, Write};

use tracing::info;

use crate::core::auth::{AuthContext, KeyringTokenStore, TokenStore};
use crate::core::config::data::path_display;
use crate::core::config::keys::{set_value, unset_value};
use crate::core::config::Config;

pub fn run_login() -> Result<(), Box<dyn Error>> {
    print!("Paste your BlinderFit ID token: ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    login_with(&KeyringTokenStore, &mut stdin.lock())?;
    println!("✅ Token stored in the system keyring");
    Ok(())
}

/// Reads one line from `input` and stores it as the auth token.
pub fn login_with<S: TokenStore, R: BufRead>(
    store: &S,
    input: &mut R,
) -> Result<AuthContext, Box<dyn Error>> {
    let mut line = String::new();
    input.read_line(&mut line)?;

    let mut auth = AuthContext::signed_out();
    auth.login(line);
    let Some(token) = auth.token() else {
        return Err("no token entered".into());
    };
    store.store_token(token)?;
    info!("auth token stored");
    Ok(auth)
}

pub fn run_logout() -> Result<(), Box<dyn Error>> {
    if KeyringTokenStore.delete_token()? {
        println!("✅ Token removed from the system keyring");
    } else {
        println!("No stored token to remove");
    }
    Ok(())
}

pub fn run_set(key: Option<String>, value: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let (Some(key), Some(value)) = (key, value) else {
        config.print_all();
        return Ok(());
    };

    let mut config = config;
    let message = set_value(&mut config, &key, &value)?;
    config.save()?;
    println!("✅ {message}");
    println!("   saved to {}", path_display(Config::config_path()?));
    Ok(())
}

pub fn run_unset(key: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let message = unset_value(&mut config, key)?;
    config.save()?;
    println!("✅ {message}");
    Ok(())
}
