//! Network selection and explorer URL templates.

use serde::{Deserialize, Serialize};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use std::str::FromStr;

/// Default devnet RPC endpoint.
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

/// Default testnet RPC endpoint.
pub const TESTNET_RPC_URL: &str = "https://api.testnet.solana.com";

/// Default mainnet-beta RPC endpoint.
pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Local validator RPC endpoint.
pub const LOCALNET_RPC_URL: &str = "http://127.0.0.1:8899";

/// Block explorer base URL.
pub const EXPLORER_URL: &str = "https://explorer.solana.com";

/// The cluster a deployment targets. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTarget {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
    Localnet,
    Custom { rpc_url: String },
}

impl DeploymentTarget {
    pub fn rpc_url(&self) -> &str {
        match self {
            Self::Devnet => DEVNET_RPC_URL,
            Self::Testnet => TESTNET_RPC_URL,
            Self::Mainnet => MAINNET_RPC_URL,
            Self::Localnet => LOCALNET_RPC_URL,
            Self::Custom { rpc_url } => rpc_url,
        }
    }

    /// Explorer link for a transaction signature.
    pub fn explorer_tx_url(&self, signature: &Signature) -> String {
        format!("{}/tx/{}{}", EXPLORER_URL, signature, self.cluster_query())
    }

    /// Explorer link for an account (e.g. the deployed program).
    pub fn explorer_address_url(&self, address: &Pubkey) -> String {
        format!("{}/address/{}{}", EXPLORER_URL, address, self.cluster_query())
    }

    fn cluster_query(&self) -> String {
        match self {
            Self::Mainnet => String::new(),
            Self::Devnet => "?cluster=devnet".to_string(),
            Self::Testnet => "?cluster=testnet".to_string(),
            Self::Localnet => format!(
                "?cluster=custom&customUrl={}",
                urlencoding::encode(LOCALNET_RPC_URL)
            ),
            Self::Custom { rpc_url } => format!(
                "?cluster=custom&customUrl={}",
                urlencoding::encode(rpc_url)
            ),
        }
    }
}

impl std::fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Devnet => write!(f, "devnet"),
            Self::Testnet => write!(f, "testnet"),
            Self::Mainnet => write!(f, "mainnet-beta"),
            Self::Localnet => write!(f, "localnet"),
            Self::Custom { rpc_url } => write!(f, "{}", rpc_url),
        }
    }
}

impl FromStr for DeploymentTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            "localnet" | "localhost" => Ok(Self::Localnet),
            other if other.starts_with("http://") || other.starts_with("https://") => {
                Ok(Self::Custom {
                    rpc_url: s.trim().to_string(),
                })
            }
            other => Err(format!("unknown network: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devnet_explorer_url() {
        let sig = Signature::default();
        let url = DeploymentTarget::Devnet.explorer_tx_url(&sig);
        assert_eq!(
            url,
            format!("https://explorer.solana.com/tx/{}?cluster=devnet", sig)
        );
    }

    #[test]
    fn test_mainnet_has_no_cluster_query() {
        let pk = Pubkey::new_unique();
        let url = DeploymentTarget::Mainnet.explorer_address_url(&pk);
        assert_eq!(url, format!("https://explorer.solana.com/address/{}", pk));
    }

    #[test]
    fn test_custom_url_is_encoded() {
        let target: DeploymentTarget = "http://10.0.0.5:8899".parse().unwrap();
        assert_eq!(target.rpc_url(), "http://10.0.0.5:8899");
        let url = target.explorer_tx_url(&Signature::default());
        assert!(url.ends_with("?cluster=custom&customUrl=http%3A%2F%2F10.0.0.5%3A8899"));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Devnet".parse::<DeploymentTarget>(), Ok(DeploymentTarget::Devnet));
        assert_eq!("mainnet-beta".parse::<DeploymentTarget>(), Ok(DeploymentTarget::Mainnet));
        assert!("moonnet".parse::<DeploymentTarget>().is_err());
    }

    #[test]
    fn test_target_serde() {
        let json = serde_json::to_string(&DeploymentTarget::Mainnet).unwrap();
        assert_eq!(json, "\"mainnet\"");
        let back: DeploymentTarget = serde_json::from_str("\"devnet\"").unwrap();
        assert_eq!(back, DeploymentTarget::Devnet);
    }
}
