use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "service_code": "IT001",
        "service_name": "Service Informatique",
        "parent_service_id": null,
        "description": "Gestion des systèmes informatiques",
        "manager": "Jean Dupont",
        "created_at": "2026-01-01T08:00:00",
        "updated_at": "2026-01-01T08:00:00"
    })
)]
pub struct Service {
    pub id: u64,
    pub service_code: String,
    pub service_name: String,
    #[schema(nullable = true)]
    pub parent_service_id: Option<u64>,
    pub description: Option<String>,
    pub manager: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

pub const SERVICE_COLUMNS: &str =
    "id, service_code, service_name, parent_service_id, description, manager, created_at, updated_at";

/// Ids of `root` and every service below it.
pub fn subtree_ids(services: &[Service], root: u64) -> Vec<u64> {
    let mut ids = vec![root];
    let mut cursor = 0;
    while cursor < ids.len() {
        let parent = ids[cursor];
        for s in services {
            if s.parent_service_id == Some(parent) && !ids.contains(&s.id) {
                ids.push(s.id);
            }
        }
        cursor += 1;
    }
    ids
}

/// True when making `parent` the parent of `service` would close a loop.
pub fn creates_cycle(services: &[Service], service: u64, parent: u64) -> bool {
    subtree_ids(services, service).contains(&parent)
}

#[cfg(test)]
pub(crate) fn sample(id: u64, code: &str, parent: Option<u64>) -> Service {
    let ts = chrono::NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    Service {
        id,
        service_code: code.to_string(),
        service_name: format!("Service {code}"),
        parent_service_id: parent,
        description: None,
        manager: None,
        created_at: ts,
        updated_at: ts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<Service> {
        // 1 ─┬─ 2 ── 4
        //    └─ 3
        // 5
        vec![
            sample(1, "ROOT", None),
            sample(2, "IT", Some(1)),
            sample(3, "HR", Some(1)),
            sample(4, "DEV", Some(2)),
            sample(5, "FIN", None),
        ]
    }

    #[test]
    fn subtree_collects_descendants() {
        let mut ids = subtree_ids(&tree(), 1);
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(subtree_ids(&tree(), 5), vec![5]);
    }

    #[test]
    fn detects_cycles() {
        assert!(creates_cycle(&tree(), 1, 4));
        assert!(creates_cycle(&tree(), 2, 2));
        assert!(!creates_cycle(&tree(), 4, 3));
        assert!(!creates_cycle(&tree(), 5, 1));
    }
}
