use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Ref chain of the designated root part.
pub const ROOT_REF_CHAIN: &str = "Root";

/// Stable, globally unique identifier of a part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefChain(SmolStr);

impl RefChain {
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(SmolStr::new(text))
    }

    #[must_use]
    pub fn root() -> Self {
        Self(SmolStr::new_static(ROOT_REF_CHAIN))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_REF_CHAIN
    }
}

impl fmt::Display for RefChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RefChain {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for RefChain {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RefChain {
    fn from(text: String) -> Self {
        Self(SmolStr::from(text))
    }
}

impl PartialEq<str> for RefChain {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for RefChain {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
