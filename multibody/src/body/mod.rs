use mass_properties::MassProperties;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BodyErrors {
    #[error("name cannot be empty for body")]
    EmptyName,
}

/// Caller-chosen identifier of a body, stable across model edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub usize);

impl Display for BodyId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub mass_properties: MassProperties,
}

impl Body {
    pub fn new(id: BodyId, name: &str, mass_properties: MassProperties) -> Result<Self, BodyErrors> {
        if name.is_empty() {
            return Err(BodyErrors::EmptyName);
        }
        Ok(Self {
            id,
            name: name.to_string(),
            mass_properties,
        })
    }
}
