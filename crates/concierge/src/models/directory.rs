use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
}

/// A user together with the region it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub region: Region,
}

/// Field values for creating a user, or replacing all of a user's fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub region_id: i64,
}

impl UserDraft {
    pub fn new<N: Into<String>, E: Into<String>>(name: N, email: E, region_id: i64) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            region_id,
        }
    }
}
