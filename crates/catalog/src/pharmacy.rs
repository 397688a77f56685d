use serde::{Deserialize, Serialize};

use medfind_core::{DomainError, DomainResult, Entity, PharmacyId};

/// A pharmacy that holds stock.
///
/// Location, contact and hours are free-form display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub id: PharmacyId,
    pub name: String,
    pub location: String,
    pub contact: String,
    pub operating_hours: String,
}

impl Pharmacy {
    pub fn new(
        id: PharmacyId,
        name: impl Into<String>,
        location: impl Into<String>,
        contact: impl Into<String>,
        operating_hours: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("pharmacy name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            location: location.into(),
            contact: contact.into(),
            operating_hours: operating_hours.into(),
        })
    }
}

impl Entity for Pharmacy {
    type Id = PharmacyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        assert!(Pharmacy::new(PharmacyId::new(), "", "MG Road", "080-1234", "9-21").is_err());
        let p = Pharmacy::new(PharmacyId::new(), " City Care ", "MG Road", "080-1234", "9-21").unwrap();
        assert_eq!(p.name, "City Care");
    }
}
