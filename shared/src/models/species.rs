//! Fish species models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fish species, either shared by everyone or custom to one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FishSpecies {
    pub id: Uuid,
    /// `None` for global species
    pub user_id: Option<Uuid>,
    pub name: String,
}

impl FishSpecies {
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }

    /// Global species are visible to everyone, custom ones only to their owner
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.user_id.map_or(true, |owner| owner == user_id)
    }
}

impl std::fmt::Display for FishSpecies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let global = FishSpecies {
            id: Uuid::new_v4(),
            user_id: None,
            name: "Rohu".to_string(),
        };
        let custom = FishSpecies {
            id: Uuid::new_v4(),
            user_id: Some(owner),
            name: "Pangasius".to_string(),
        };

        assert!(global.is_global());
        assert!(global.is_visible_to(other));
        assert!(custom.is_visible_to(owner));
        assert!(!custom.is_visible_to(other));
    }
}
