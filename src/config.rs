use std::env;
use std::path::PathBuf;

use bitcoin::Network;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvoiceMode {
    /// `POST /invoice` creates an invoice for the submitted amount.
    Push,
    /// `GET /` renders an invoice for the last amount that was set.
    Pull,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub network: Network,
    pub api_host: String,
    pub api_port: u16,
    pub route_prefix: String,
    pub template_path: PathBuf,
    pub static_dir: PathBuf,
    pub master_xprv: Option<String>,
    pub invoice_mode: InvoiceMode,
    pub default_amount_sats: u64,
    pub allowed_origins: Vec<String>,
    pub node_services: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            network: parse_network(&env::var("NETWORK").unwrap_or_else(|_| "testnet".into()))?,
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3080".into())
                .parse()?,
            route_prefix: normalize_route_prefix(
                &env::var("ROUTE_PREFIX").unwrap_or_else(|_| "lemonade-stand".into()),
            )?,
            template_path: env::var("TEMPLATE_PATH")
                .unwrap_or_else(|_| "templates/invoice.html".into())
                .into(),
            static_dir: env::var("STATIC_DIR")
                .unwrap_or_else(|_| "static".into())
                .into(),
            master_xprv: env::var("MASTER_XPRV").ok().filter(|s| !s.is_empty()),
            invoice_mode: parse_invoice_mode(
                &env::var("INVOICE_MODE").unwrap_or_else(|_| "push".into()),
            )?,
            default_amount_sats: env::var("DEFAULT_AMOUNT_SATS")
                .unwrap_or_else(|_| "12340000".into())
                .parse()?,
            allowed_origins: split_list(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
            node_services: split_list(
                &env::var("NODE_SERVICES").unwrap_or_else(|_| "bitcoind".into()),
            ),
        })
    }

    pub fn is_testnet(&self) -> bool {
        self.network != Network::Bitcoin
    }

    /// Path prefix the invoice page uses for links and assets, e.g. `/lemonade-stand/`.
    pub fn base_url(&self) -> String {
        format!("/{}/", self.route_prefix)
    }
}

pub fn parse_network(value: &str) -> anyhow::Result<Network> {
    match value.trim().to_ascii_lowercase().as_str() {
        "mainnet" | "bitcoin" | "livenet" => Ok(Network::Bitcoin),
        "testnet" => Ok(Network::Testnet),
        "signet" => Ok(Network::Signet),
        "regtest" => Ok(Network::Regtest),
        other => anyhow::bail!("unknown NETWORK {:?}", other),
    }
}

pub fn parse_invoice_mode(value: &str) -> anyhow::Result<InvoiceMode> {
    match value.trim().to_ascii_lowercase().as_str() {
        "push" => Ok(InvoiceMode::Push),
        "pull" => Ok(InvoiceMode::Pull),
        other => anyhow::bail!("INVOICE_MODE must be push or pull, got {:?}", other),
    }
}

pub fn normalize_route_prefix(value: &str) -> anyhow::Result<String> {
    let prefix = value.trim().trim_matches('/');
    if prefix.is_empty() {
        anyhow::bail!("ROUTE_PREFIX must not be empty");
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!("ROUTE_PREFIX may only contain letters, digits, '-' and '_'");
    }
    Ok(prefix.to_string())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network_aliases() {
        assert_eq!(parse_network("mainnet").unwrap(), Network::Bitcoin);
        assert_eq!(parse_network("livenet").unwrap(), Network::Bitcoin);
        assert_eq!(parse_network(" Testnet ").unwrap(), Network::Testnet);
        assert_eq!(parse_network("regtest").unwrap(), Network::Regtest);
        assert!(parse_network("dogecoin").is_err());
    }

    #[test]
    fn test_parse_invoice_mode() {
        assert_eq!(parse_invoice_mode("push").unwrap(), InvoiceMode::Push);
        assert_eq!(parse_invoice_mode("PULL").unwrap(), InvoiceMode::Pull);
        assert!(parse_invoice_mode("poll").is_err());
    }

    #[test]
    fn test_normalize_route_prefix() {
        assert_eq!(normalize_route_prefix("/payments/").unwrap(), "payments");
        assert_eq!(normalize_route_prefix("lemonade-stand").unwrap(), "lemonade-stand");
        assert!(normalize_route_prefix("/").is_err());
        assert!(normalize_route_prefix("a/b").is_err());
        assert!(normalize_route_prefix("x y").is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("bitcoind, db,,"), vec!["bitcoind", "db"]);
        assert!(split_list("").is_empty());
    }
}
