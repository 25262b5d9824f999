use serde::{Deserialize, Serialize};

use super::Chain;

/// Read-only per-rule packet/byte counters from the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub chain: Chain,
    pub rule: String,
    pub packets: u64,
    pub bytes: u64,
}

/// Liveness probe answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub service: Option<String>,
}

impl Health {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
