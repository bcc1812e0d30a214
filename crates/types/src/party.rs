use serde::{Deserialize, Serialize};

/// Merchant pickup location as echoed back in quote responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreInfo {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: Option<String>,
}

impl StoreInfo {
    /// Single-line address used for geocoding.
    pub fn full_address(&self) -> String {
        match &self.postal_code {
            Some(postal) => format!("{}, {}, {}", self.address, self.city, postal),
            None => format!("{}, {}", self.address, self.city),
        }
    }
}

/// Client drop-off location as echoed back in quote responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub address: String,
    pub city: String,
    pub postal_code: Option<String>,
}

impl ClientInfo {
    /// Single-line address used for geocoding.
    pub fn full_address(&self) -> String {
        match &self.postal_code {
            Some(postal) => format!("{}, {}, {}", self.address, self.city, postal),
            None => format!("{}, {}", self.address, self.city),
        }
    }
}
