//! Agent persona configuration.
//!
//! An [`AgentProfile`] is the user-editable persona (name plus instruction
//! text). It stays mutable between sessions; the controller freezes it into an
//! [`AgentDescriptor`] at the moment a session starts, so later edits only
//! affect the next start.

use serde::{Deserialize, Serialize};

const DEFAULT_NAME: &str = "Assistant";
const DEFAULT_INSTRUCTIONS: &str =
    "You are a friendly and helpful assistant. Keep your responses concise.";

/// User-editable voice agent persona.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentProfile {
    pub name: String,
    pub instructions: String,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }
}

/// Error raised when a profile cannot be turned into an agent descriptor.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("agent name must not be empty")]
    EmptyName,
    #[error("agent instructions must not be empty")]
    EmptyInstructions,
}

/// A validated, immutable snapshot of the profile, as handed to the session
/// factory for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDescriptor {
    pub name: String,
    pub instructions: String,
}

impl AgentDescriptor {
    /// Validates and freezes the given profile.
    pub fn new(profile: &AgentProfile) -> Result<Self, ProfileError> {
        let name = profile.name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let instructions = profile.instructions.trim();
        if instructions.is_empty() {
            return Err(ProfileError::EmptyInstructions);
        }
        Ok(Self {
            name: name.to_string(),
            instructions: instructions.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_is_valid() {
        let descriptor = AgentDescriptor::new(&AgentProfile::default()).unwrap();
        assert_eq!(descriptor.name, "Assistant");
        assert!(descriptor.instructions.contains("concise"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let profile = AgentProfile {
            name: "   ".to_string(),
            ..AgentProfile::default()
        };
        assert_eq!(
            AgentDescriptor::new(&profile).unwrap_err(),
            ProfileError::EmptyName
        );
    }

    #[test]
    fn blank_instructions_are_rejected() {
        let profile = AgentProfile {
            instructions: "".to_string(),
            ..AgentProfile::default()
        };
        assert_eq!(
            AgentDescriptor::new(&profile).unwrap_err(),
            ProfileError::EmptyInstructions
        );
    }

    #[test]
    fn descriptor_trims_whitespace() {
        let profile = AgentProfile {
            name: "  Tutor  ".to_string(),
            instructions: " Teach slowly. ".to_string(),
        };
        let descriptor = AgentDescriptor::new(&profile).unwrap();
        assert_eq!(descriptor.name, "Tutor");
        assert_eq!(descriptor.instructions, "Teach slowly.");
    }
}
