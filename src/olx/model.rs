use serde::Deserialize;

/// `GET users/{id}/`
#[derive(Deserialize, Debug, Default)]
pub struct UserResponse {
    #[serde(default)]
    pub data: Option<UserData>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UserData {
    #[serde(default)]
    pub is_business: Option<bool>,
}

impl UserResponse {
    pub fn is_business(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.is_business)
            .unwrap_or(false)
    }
}

/// `GET offers/?user_id=...`
#[derive(Deserialize, Debug, Default)]
pub struct OffersResponse {
    #[serde(default)]
    pub data: Option<Vec<Offer>>,
}

#[derive(Deserialize, Debug)]
pub struct Offer {
    #[serde(default)]
    pub category: Option<OfferCategory>,
}

#[derive(Deserialize, Debug)]
pub struct OfferCategory {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

pub const REAL_ESTATE_CATEGORY: &str = "real_estate";

impl OffersResponse {
    pub fn real_estate_count(&self) -> u32 {
        self.data
            .iter()
            .flatten()
            .filter(|o| {
                o.category.as_ref().and_then(|c| c.kind.as_deref()) == Some(REAL_ESTATE_CATEGORY)
            })
            .count() as u32
    }
}
