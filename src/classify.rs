//! Realtor heuristics.
//!
//! Decision order, first match wins:
//! 1. the owner is a business account: realtor;
//! 2. the owner has two or more real-estate listings: not a realtor;
//! 3. otherwise the description decides, realtor keywords against private-owner keywords.
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Classification, ListingDraft};

/// Owners with this many real-estate listings skip the keyword check.
pub const MULTI_LISTING_THRESHOLD: u32 = 2;

pub const REALTOR_KEYWORDS: &[&str] = &[
    "рієлтор",
    "ріелтор",
    "ріелторська",
    "рієлторська",
    "агентство",
    "агент",
    "агентка",
    "брокер",
    "брокерська",
    "посередник",
    "посередництво",
    "агентство нерухомості",
    "агент нерухомості",
    "офіс нерухомості",
    "компанія нерухомості",
    "професійний",
    "професійна",
    "квартира під ключ",
    "квартири під ключ",
    "пропозиція від агентства",
    "пропозиція від агента",
    "здійснюємо показ",
    "проводимо показ",
    "допоможемо підібрати",
    "допоможемо знайти",
    "великий вибір",
    "широкий вибір",
    "гарантуємо",
    "гарантуємо якість",
    "офіційний договір",
    "офіційна угода",
    "професійна консультація",
    "консультація спеціаліста",
];

pub const PRIVATE_KEYWORDS: &[&str] = &[
    "оренда від власника",
    "оренда від господаря",
    "продаж від власника",
    "продаж від господаря",
    "без посередників",
    "без рієлторів",
    "без комісії",
    "без додаткових витрат",
    "без агентства",
    "без агентів",
    "прямий контакт",
    "контакт з власником",
    "здає власник",
    "продає власник",
    "орендодавець",
    "власник квартири",
    "господар квартири",
    "господар оселі",
];

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Lookups on the owner of a listing.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether the marketplace flags the user as a business account.
    async fn is_business(&self, user_id: &str) -> Result<bool, LookupError>;

    /// How many real-estate listings the user currently has.
    async fn real_estate_listings_count(&self, user_uuid: &str) -> Result<u32, LookupError>;
}

/// Classify a listing, querying the directory for its owner.
///
/// Lookup failures never escape: a failed business check counts as `false` and a
/// failed count as `0`.
pub async fn classify(draft: &ListingDraft, directory: &dyn UserDirectory) -> Classification {
    let is_business = match draft.user_id.as_deref() {
        Some(user_id) => directory.is_business(user_id).await.unwrap_or_else(|err| {
            warn!(listing_id = %draft.id, user_id, %err, "business lookup failed");
            false
        }),
        None => false,
    };

    let listings_count = match draft.user_uuid.as_deref() {
        Some(uuid) => directory
            .real_estate_listings_count(uuid)
            .await
            .unwrap_or_else(|err| {
                warn!(listing_id = %draft.id, user_uuid = uuid, %err, "listing count lookup failed");
                0
            }),
        None => 0,
    };

    let is_realtor = decide(is_business, listings_count, &draft.description);
    debug!(
        listing_id = %draft.id,
        is_business,
        listings_count,
        is_realtor,
        "classified listing"
    );
    Classification {
        is_realtor,
        listings_count,
    }
}

/// The pure decision procedure behind [`classify`].
pub fn decide(is_business: bool, listings_count: u32, description: &str) -> bool {
    if is_business {
        return true;
    }
    if listings_count >= MULTI_LISTING_THRESHOLD {
        return false;
    }
    let (realtor, private) = keyword_score(description);
    realtor > private
}

/// Number of realtor and private-owner keywords contained in the description.
///
/// Plain substring containment on the lowercased text: "агентство нерухомості"
/// also hits "агентство" and "агент".
pub fn keyword_score(description: &str) -> (usize, usize) {
    let text = description.to_lowercase();
    let count = |keywords: &[&str]| keywords.iter().filter(|k| text.contains(**k)).count();
    (count(REALTOR_KEYWORDS), count(PRIVATE_KEYWORDS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedDirectory {
        business: Result<bool, ()>,
        count: Result<u32, ()>,
        calls: AtomicUsize,
    }

    impl FixedDirectory {
        fn new(business: Result<bool, ()>, count: Result<u32, ()>) -> Self {
            Self {
                business,
                count,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl UserDirectory for FixedDirectory {
        async fn is_business(&self, _user_id: &str) -> Result<bool, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.business
                .map_err(|_| LookupError::Malformed("boom".into()))
        }

        async fn real_estate_listings_count(&self, _user_uuid: &str) -> Result<u32, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.count
                .map_err(|_| LookupError::Status(reqwest::StatusCode::BAD_GATEWAY))
        }
    }

    fn draft(description: &str) -> ListingDraft {
        ListingDraft {
            id: "1".into(),
            title: "t".into(),
            url: "u".into(),
            owner_name: "o".into(),
            price: 1.0,
            district_name: "d".into(),
            has_phone: false,
            description: description.into(),
            created_time: String::new(),
            last_refresh_time: String::new(),
            user_id: Some("10".into()),
            user_uuid: Some("uuid-10".into()),
        }
    }

    const REALTOR_HEAVY: &str = "Наше агентство нерухомості пропонує квартиру, без комісії";

    #[test]
    fn keyword_counts_use_substrings() {
        // агентство нерухомості + агентство + агент vs без комісії
        assert_eq!(keyword_score(REALTOR_HEAVY), (3, 1));
        assert_eq!(keyword_score("ОРЕНДА ВІД ВЛАСНИКА"), (0, 1));
    }

    #[test]
    fn business_account_wins_over_text() {
        assert!(decide(true, 0, "оренда від власника, без комісії"));
        assert!(decide(true, 7, ""));
    }

    #[test]
    fn multiple_listings_mean_not_realtor() {
        assert!(!decide(false, 2, REALTOR_HEAVY));
        assert!(!decide(false, 9, REALTOR_HEAVY));
    }

    #[test]
    fn keywords_decide_for_small_owners() {
        assert!(decide(false, 1, REALTOR_HEAVY));
        assert!(!decide(false, 0, "Брокер, без комісії"));
        assert!(!decide(false, 0, "Затишна квартира"));
    }

    #[tokio::test]
    async fn failed_lookups_fall_back_to_defaults() {
        let dir = FixedDirectory::new(Err(()), Err(()));
        let c = classify(&draft(REALTOR_HEAVY), &dir).await;
        assert_eq!(
            c,
            Classification {
                is_realtor: true,
                listings_count: 0
            }
        );
        assert_eq!(dir.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn count_is_reported_for_display() {
        let dir = FixedDirectory::new(Ok(false), Ok(6));
        let c = classify(&draft(REALTOR_HEAVY), &dir).await;
        assert!(!c.is_realtor);
        assert_eq!(c.listings_count, 6);
    }

    #[tokio::test]
    async fn missing_owner_ids_skip_lookups() {
        let dir = FixedDirectory::new(Ok(true), Ok(3));
        let mut d = draft("оренда від власника");
        d.user_id = None;
        d.user_uuid = None;
        let c = classify(&d, &dir).await;
        assert_eq!(c, Classification::default());
        assert_eq!(dir.calls.load(Ordering::SeqCst), 0);
    }
}
