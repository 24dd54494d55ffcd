use crate::auth::auth::AuthUser;
use crate::model::profile::Profile;
use crate::model::request::OvertimeRequest;
use crate::model::status::ApprovalLevel;
use chrono::NaiveDate;
use sqlx::MySqlPool;

/// Levels a profile may validate at on its own.
pub fn levels_of(profile: Profile) -> &'static [ApprovalLevel] {
    match profile {
        Profile::Administrator => &[ApprovalLevel::First, ApprovalLevel::Second],
        Profile::Supervisor => &[ApprovalLevel::First],
        Profile::Coordinator => &[ApprovalLevel::Second],
        Profile::Validator => &[],
    }
}

/// Who is recorded for a decision: the employee whose authority is used and,
/// when acting through a delegation, the employee actually acting.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Acting {
    pub validator: u64,
    pub delegate: Option<u64>,
}

/// Validation authority of a caller: their own profile plus the profiles of
/// everyone who delegated to them for today.
#[derive(Debug, Clone)]
pub struct Authority {
    pub employee_id: u64,
    pub profile: Profile,
    /// (delegator employee id, delegator profile)
    pub delegated: Vec<(u64, Profile)>,
}

impl Authority {
    pub fn own(employee_id: u64, profile: Profile) -> Self {
        Self {
            employee_id,
            profile,
            delegated: Vec::new(),
        }
    }

    pub fn with_delegations(mut self, delegated: Vec<(u64, Profile)>) -> Self {
        self.delegated = delegated;
        self
    }

    pub fn covers(&self, level: ApprovalLevel) -> bool {
        levels_of(self.profile).contains(&level)
            || self
                .delegated
                .iter()
                .any(|(_, p)| levels_of(*p).contains(&level))
    }

    /// Resolves who acts at `level` on `request`. Nobody validates a request
    /// they own or filed, directly or through a delegation.
    pub fn acting_for(&self, level: ApprovalLevel, request: &OvertimeRequest) -> Option<Acting> {
        if request.is_owned_by(self.employee_id) {
            return None;
        }

        if levels_of(self.profile).contains(&level) {
            return Some(Acting {
                validator: self.employee_id,
                delegate: None,
            });
        }

        self.delegated
            .iter()
            .find(|(delegator, p)| !request.is_owned_by(*delegator) && levels_of(*p).contains(&level))
            .map(|(delegator, _)| Acting {
                validator: *delegator,
                delegate: Some(self.employee_id),
            })
    }

    /// Builds the caller's authority, including delegations active on `day`.
    pub async fn load(pool: &MySqlPool, user: &AuthUser, day: NaiveDate) -> Result<Self, sqlx::Error> {
        let rows = sqlx::query_as::<_, (u64, String)>(
            r#"
            SELECT d.delegated_by, a.profile
            FROM delegations d
            JOIN accounts a ON a.employee_id = d.delegated_by
            WHERE d.delegated_to = ?
              AND a.is_active = TRUE
              AND ? BETWEEN d.start_at AND d.end_at
            "#,
        )
        .bind(user.employee_id)
        .bind(day)
        .fetch_all(pool)
        .await?;

        let delegated = rows
            .into_iter()
            .filter_map(|(delegator, profile)| match profile.parse::<Profile>() {
                Ok(p) => Some((delegator, p)),
                Err(_) => {
                    tracing::warn!(delegator, profile = %profile, "Ignoring delegation with unknown profile");
                    None
                }
            })
            .collect();

        Ok(Self::own(user.employee_id, user.profile).with_delegations(delegated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::sample;
    use crate::model::status::RequestStatus;

    fn submitted_by(employee_id: u64) -> OvertimeRequest {
        let d = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        sample(1, employee_id, d, (17, 0), (19, 0), RequestStatus::Submitted)
    }

    #[test]
    fn profiles_map_to_levels() {
        assert!(Authority::own(1, Profile::Administrator).covers(ApprovalLevel::Second));
        assert!(Authority::own(1, Profile::Supervisor).covers(ApprovalLevel::First));
        assert!(!Authority::own(1, Profile::Supervisor).covers(ApprovalLevel::Second));
        assert!(!Authority::own(1, Profile::Validator).covers(ApprovalLevel::First));
    }

    #[test]
    fn own_authority_wins_over_delegation() {
        let authority = Authority::own(10, Profile::Supervisor)
            .with_delegations(vec![(20, Profile::Supervisor)]);
        assert_eq!(
            authority.acting_for(ApprovalLevel::First, &submitted_by(99)),
            Some(Acting {
                validator: 10,
                delegate: None
            })
        );
    }

    #[test]
    fn delegation_grants_the_delegators_level() {
        let authority = Authority::own(10, Profile::Validator)
            .with_delegations(vec![(20, Profile::Coordinator)]);
        assert!(authority.covers(ApprovalLevel::Second));
        assert_eq!(
            authority.acting_for(ApprovalLevel::Second, &submitted_by(99)),
            Some(Acting {
                validator: 20,
                delegate: Some(10)
            })
        );
        assert_eq!(authority.acting_for(ApprovalLevel::First, &submitted_by(99)), None);
    }

    #[test]
    fn nobody_acts_on_their_own_request() {
        let admin = Authority::own(10, Profile::Administrator);
        assert_eq!(admin.acting_for(ApprovalLevel::First, &submitted_by(10)), None);

        // the delegator's own request cannot be validated with their authority
        let delegate = Authority::own(10, Profile::Validator)
            .with_delegations(vec![(20, Profile::Supervisor)]);
        assert_eq!(delegate.acting_for(ApprovalLevel::First, &submitted_by(20)), None);
    }

    #[test]
    fn filing_for_someone_else_still_counts_as_own() {
        let mut request = submitted_by(5);
        request.created_by = Some(10);

        let supervisor = Authority::own(10, Profile::Supervisor);
        assert_eq!(supervisor.acting_for(ApprovalLevel::First, &request), None);

        // nor through the authority of someone who delegated to the filer
        let delegate = Authority::own(30, Profile::Validator)
            .with_delegations(vec![(10, Profile::Supervisor)]);
        assert_eq!(delegate.acting_for(ApprovalLevel::First, &request), None);

        let other = Authority::own(11, Profile::Supervisor);
        assert!(other.acting_for(ApprovalLevel::First, &request).is_some());
    }
}
