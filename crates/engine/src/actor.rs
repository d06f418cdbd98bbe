//! The authenticated caller of every engine operation.
//!
//! The engine does not verify credentials: whoever builds an [`Actor`] (the
//! HTTP auth middleware, the admin CLI, tests) is trusted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, users};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::User => "USER",
        }
    }

    /// Roles allowed to move an expense out of `PENDING`.
    pub fn can_decide(self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ADMIN" => Ok(Self::Admin),
            "MANAGER" => Ok(Self::Manager),
            "USER" => Ok(Self::User),
            other => Err(EngineError::InvalidInput(format!("invalid role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub department_id: Option<Uuid>,
}

impl Actor {
    pub fn new(id: Uuid, role: Role, department_id: Option<Uuid>) -> Self {
        Self {
            id,
            role,
            department_id,
        }
    }
}

impl TryFrom<&users::Model> for Actor {
    type Error = EngineError;

    fn try_from(model: &users::Model) -> Result<Self, Self::Error> {
        let role = Role::try_from(model.role.as_str())
            .map_err(|_| EngineError::DataIntegrity(format!("user {} has invalid role", model.id)))?;
        Ok(Self::new(model.id, role, model.department_id))
    }
}
