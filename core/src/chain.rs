use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Networks the application can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Mainnet,
    #[default]
    Sepolia,
    Holesky,
}

impl Chain {
    pub const ALL: [Chain; 3] = [Chain::Mainnet, Chain::Sepolia, Chain::Holesky];

    pub fn chain_id(self) -> u64 {
        match self {
            Chain::Mainnet => 1,
            Chain::Sepolia => 11_155_111,
            Chain::Holesky => 17_000,
        }
    }

    /// Chain id as the wallet expects it in `wallet_switchEthereumChain`.
    pub fn hex_chain_id(self) -> String {
        format!("{:#x}", self.chain_id())
    }

    /// Human-facing network name.
    pub fn display_name(self) -> &'static str {
        match self {
            Chain::Mainnet => "Ethereum Mainnet",
            Chain::Sepolia => "Sepolia",
            Chain::Holesky => "Holesky",
        }
    }

    pub fn explorer_url(self) -> &'static str {
        match self {
            Chain::Mainnet => "https://etherscan.io",
            Chain::Sepolia => "https://sepolia.etherscan.io",
            Chain::Holesky => "https://holesky.etherscan.io",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.chain_id() == chain_id)
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chain::Mainnet => write!(f, "mainnet"),
            Chain::Sepolia => write!(f, "sepolia"),
            Chain::Holesky => write!(f, "holesky"),
        }
    }
}

impl std::str::FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "ethereum" => Ok(Chain::Mainnet),
            "sepolia" => Ok(Chain::Sepolia),
            "holesky" => Ok(Chain::Holesky),
            other => Err(format!(
                "Unknown network '{other}'. Use 'mainnet', 'sepolia' or 'holesky'."
            )),
        }
    }
}

/// Explorer link for a transaction hash. Unknown chains fall back to mainnet.
pub fn explorer_tx_url(chain_id: u64, hash: &str) -> String {
    let base = Chain::from_chain_id(chain_id)
        .unwrap_or(Chain::Mainnet)
        .explorer_url();
    format!("{base}/tx/{hash}")
}

/// Session tunables. `target` is the single network the application operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub target: Chain,
    #[serde(with = "secs")]
    pub balance_poll_interval: Duration,
    #[serde(with = "secs")]
    pub receipt_poll_interval: Duration,
    pub confirmations: u64,
    /// Give up on a submitted payment that is not confirmed within this time.
    #[serde(default, with = "opt_secs")]
    pub receipt_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: Chain::Sepolia,
            balance_poll_interval: Duration::from_secs(30),
            receipt_poll_interval: Duration::from_secs(2),
            confirmations: 1,
            receipt_timeout: Some(Duration::from_secs(600)),
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}
