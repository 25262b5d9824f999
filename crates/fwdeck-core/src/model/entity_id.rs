// ── Core identity type ──
//
// Every editable resource carries a server-assigned opaque id. Local code
// never mints ids; a value that has not round-tripped through the control
// plane has no `EntityId` at all.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned identifier for a rule, NAT rule, zone, or interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_verbatim() {
        let id: EntityId = "6f1c2a90-3b7d-4e8b-9a51-2d0c4e7f8a13".parse().unwrap();
        assert_eq!(id.to_string(), "6f1c2a90-3b7d-4e8b-9a51-2d0c4e7f8a13");
        assert_eq!(id.as_str(), id.as_ref());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = EntityId::from("r1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"r1\"");
    }
}
