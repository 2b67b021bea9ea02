//! Gateway flag management commands.

use super::open_properties;
use clap::Args;
use remoteroster_core::config::{gateway_domain_from_key, gateway_flag_key, GATEWAY_FLAG_PREFIX};
use remoteroster_core::{Jid, PropertyStore};
use serde::Serialize;
use std::path::Path;

/// Flags command arguments.
#[derive(Args)]
pub struct FlagsArgs {
    #[command(subcommand)]
    pub command: FlagsCommand,
}

#[derive(clap::Subcommand)]
pub enum FlagsCommand {
    /// List gateway flags
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enable the remote roster for a gateway
    Enable {
        /// Gateway domain
        domain: String,
    },

    /// Disable the remote roster for a gateway
    Disable {
        /// Gateway domain
        domain: String,
    },

    /// Forget a gateway's flag entirely
    Remove {
        /// Gateway domain
        domain: String,
    },

    /// Validate the property file
    Validate,
}

/// One gateway flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagEntry {
    pub domain: String,
    pub enabled: bool,
}

/// Gateway flags in the store, sorted by domain.
pub fn list_flags(store: &PropertyStore) -> Vec<FlagEntry> {
    store
        .keys_with_prefix(GATEWAY_FLAG_PREFIX)
        .iter()
        .filter_map(|key| {
            gateway_domain_from_key(key).map(|domain| FlagEntry {
                domain: domain.to_string(),
                enabled: store.get_bool(key, false),
            })
        })
        .collect()
}

/// Set a gateway's flag. The domain is normalized first.
pub fn set_flag(store: &PropertyStore, domain: &str, enabled: bool) -> anyhow::Result<String> {
    let domain = normalize_domain(domain)?;
    store.set(&gateway_flag_key(&domain), enabled.to_string())?;
    Ok(domain)
}

fn normalize_domain(domain: &str) -> anyhow::Result<String> {
    let jid = Jid::parse(domain)?;
    if !jid.is_bare() || jid.node().is_some() {
        anyhow::bail!("Gateway must be a bare domain, got '{}'", domain);
    }
    Ok(jid.domain().to_string())
}

/// Run the flags command.
pub async fn run(args: FlagsArgs, config: Option<&Path>) -> anyhow::Result<()> {
    let store = open_properties(config)?;

    match args.command {
        FlagsCommand::List { json } => {
            let flags = list_flags(&store);
            if json {
                println!("{}", serde_json::to_string_pretty(&flags)?);
            } else if flags.is_empty() {
                println!("No gateway flags configured.");
            } else {
                println!("Gateway flags:");
                println!("  {}", "-".repeat(40));
                for flag in &flags {
                    let status = if flag.enabled { "enabled" } else { "disabled" };
                    println!("  {:<30} {}", flag.domain, status);
                }
            }
        }

        FlagsCommand::Enable { domain } => {
            let domain = set_flag(&store, &domain, true)?;
            println!("Enabled remote roster for {}", domain);
        }

        FlagsCommand::Disable { domain } => {
            let domain = set_flag(&store, &domain, false)?;
            println!("Disabled remote roster for {}", domain);
        }

        FlagsCommand::Remove { domain } => {
            let domain = normalize_domain(&domain)?;
            if store.remove(&gateway_flag_key(&domain))? {
                println!("Removed flag for {}", domain);
            } else {
                println!("No flag set for {}", domain);
            }
        }

        FlagsCommand::Validate => {
            store.validate()?;
            println!("Property file is valid.");
        }
    }

    Ok(())
}
