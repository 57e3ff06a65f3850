use serde::{Deserialize, Serialize};

pub mod auth {
    use super::*;

    /// Signs in, registering the account on first use.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthRequest {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub username: String,
        pub coins: i64,
    }
}

pub mod info {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InfoResponse {
        pub coins: i64,
        pub inventory: Vec<InventoryItem>,
        pub coin_history: CoinHistory,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct InventoryItem {
        #[serde(rename = "type")]
        pub kind: String,
        pub quantity: i64,
    }

    /// Newest first in both lists.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CoinHistory {
        pub received: Vec<Received>,
        pub sent: Vec<Sent>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Received {
        pub from_user: String,
        pub amount: i64,
    }

    /// A transfer out, or a purchase when `item` is set.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Sent {
        pub to_user: String,
        pub amount: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub item: Option<String>,
    }
}

pub mod transfer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SendCoinRequest {
        pub to_user: String,
        pub amount: i64,
    }
}

pub mod merch {
    use super::*;

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MerchItem {
        pub name: String,
        pub price: i64,
    }
}

/// Body of every non-2xx response.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: String,
}
