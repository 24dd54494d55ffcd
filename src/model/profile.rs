use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Account profile. Stored and serialised by its name.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
    EnumIter,
)]
pub enum Profile {
    Administrator,
    Supervisor,
    Coordinator,
    Validator,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Validator
    }
}

impl TryFrom<String> for Profile {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Profile {
    pub fn is_any_of(self, allowed: &[Profile]) -> bool {
        allowed.contains(&self)
    }

    /// Comma separated list, used in 403 messages
    pub fn describe(allowed: &[Profile]) -> String {
        allowed
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn names_round_trip_through_strings() {
        for profile in Profile::iter() {
            let parsed: Profile = profile.to_string().parse().unwrap();
            assert_eq!(parsed, profile);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(Profile::try_from("Root".to_string()).is_err());
    }

    #[test]
    fn describe_joins_names() {
        assert_eq!(
            Profile::describe(&[Profile::Administrator, Profile::Supervisor]),
            "Administrator, Supervisor"
        );
    }
}
