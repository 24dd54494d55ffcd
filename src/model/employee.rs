use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, AsRefStr, Display, EnumString,
)]
pub enum ContractType {
    #[serde(rename = "CDI")]
    #[strum(serialize = "CDI")]
    Cdi,
    #[serde(rename = "CDD")]
    #[strum(serialize = "CDD")]
    Cdd,
    Interim,
    Stage,
    Alternance,
    #[serde(rename = "MOO")]
    #[strum(serialize = "MOO")]
    Moo,
}

impl Default for ContractType {
    fn default() -> Self {
        ContractType::Cdi
    }
}

impl TryFrom<String> for ContractType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_number": "EMP001",
        "last_name": "Martin",
        "first_name": "Marie",
        "service_id": 2,
        "contract_type": "CDI",
        "contact": "marie.martin@ghs.com",
        "position": "Gestionnaire RH",
        "birthdate": "1985-05-15",
        "is_active": true,
        "created_at": "2026-01-01T08:00:00",
        "updated_at": "2026-01-01T08:00:00"
    })
)]
pub struct Employee {
    pub id: u64,
    pub employee_number: String,
    pub last_name: String,
    pub first_name: String,
    pub service_id: u64,
    #[sqlx(try_from = "String")]
    pub contract_type: ContractType,
    pub contact: Option<String>,
    pub position: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub birthdate: Option<NaiveDate>,
    pub is_active: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub const EMPLOYEE_COLUMNS: &str = "id, employee_number, last_name, first_name, service_id, \
    contract_type, contact, position, birthdate, is_active, created_at, updated_at";

#[cfg(test)]
pub(crate) fn sample(id: u64, service_id: u64) -> Employee {
    let ts = NaiveDate::from_ymd_opt(2026, 1, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    Employee {
        id,
        employee_number: format!("EMP{id:03}"),
        last_name: format!("Last{id}"),
        first_name: format!("First{id}"),
        service_id,
        contract_type: ContractType::Cdi,
        contact: None,
        position: None,
        birthdate: None,
        is_active: true,
        created_at: ts,
        updated_at: ts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_types_use_their_french_labels() {
        assert_eq!(ContractType::Cdi.as_ref(), "CDI");
        assert_eq!("MOO".parse::<ContractType>().unwrap(), ContractType::Moo);
        assert_eq!("Alternance".parse::<ContractType>().unwrap(), ContractType::Alternance);
        assert_eq!(serde_json::to_string(&ContractType::Cdd).unwrap(), "\"CDD\"");
        assert!(ContractType::try_from("Freelance".to_string()).is_err());
    }
}
