use serde::{Deserialize, Serialize};

/// A listing as extracted from the search response, before classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingDraft {
    pub id: String,
    pub title: String,
    pub url: String,
    pub owner_name: String,
    pub price: f64,
    pub district_name: String,
    pub has_phone: bool,
    pub description: String,
    pub created_time: String,
    pub last_refresh_time: String,
    /// Numeric marketplace user id, keys the business-account lookup.
    pub user_id: Option<String>,
    /// User uuid, keys the listing-count lookup.
    pub user_uuid: Option<String>,
}

/// Outcome of the realtor heuristics for one listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_realtor: bool,
    pub listings_count: u32,
}

/// A classified listing ready for the dedup check and notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    #[serde(flatten)]
    pub draft: ListingDraft,
    pub is_realtor: bool,
    pub listings_count: u32,
}

impl Listing {
    pub fn new(draft: ListingDraft, classification: Classification) -> Self {
        Self {
            draft,
            is_realtor: classification.is_realtor,
            listings_count: classification.listings_count,
        }
    }

    pub fn id(&self) -> &str {
        &self.draft.id
    }

    pub fn display_status(&self) -> DisplayStatus {
        DisplayStatus::derive(self.is_realtor, self.listings_count)
    }
}

/// Status line shown at the top of a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DisplayStatus {
    ConfirmedRealtor,
    PossiblyNotRealtorHighVolume,
    PossiblyNotRealtor,
}

/// Owners with at least this many real-estate listings are flagged in the status line.
pub const HIGH_VOLUME_LISTINGS: u32 = 5;

impl DisplayStatus {
    pub fn derive(is_realtor: bool, listings_count: u32) -> Self {
        if is_realtor {
            DisplayStatus::ConfirmedRealtor
        } else if listings_count >= HIGH_VOLUME_LISTINGS {
            DisplayStatus::PossiblyNotRealtorHighVolume
        } else {
            DisplayStatus::PossiblyNotRealtor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::ConfirmedRealtor => "🔴 Рієлтор",
            DisplayStatus::PossiblyNotRealtorHighVolume => "🟡 МОЖЛИВО НЕ РІЄЛТОР (5+ оголошень)",
            DisplayStatus::PossiblyNotRealtor => "🟢 МОЖЛИВО Без рієлтора",
        }
    }
}
