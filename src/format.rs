use crate::model::Listing;

/// Render the notification text for a listing.
pub fn format_message(listing: &Listing) -> String {
    let d = &listing.draft;
    let phone = if d.has_phone {
        "Доступний"
    } else {
        "Не доступний"
    };
    format!(
        "🏠 ВСТВАВАЙ НОВА ХАТА\n\n\
         {status}\n\
         📌 {title}\n\
         💰 Ціна: {price} UAH\n\
         👤 Власник: {owner}\n\
         📱 Телефон: {phone}\n\
         📊 Кількість оголошень: {count}\n\
         📅 Дата створення: {created}\n\
         🔄 Дата останнього оновлення: {refreshed}\n\
         🔗 URL: {url}",
        status = listing.display_status().label(),
        title = d.title,
        price = format_price(d.price),
        owner = d.owner_name,
        count = listing.listings_count,
        created = d.created_time,
        refreshed = d.last_refresh_time,
        url = d.url,
    )
}

/// Whole amounts print without a fractional part.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, ListingDraft};

    fn listing(is_realtor: bool, listings_count: u32) -> Listing {
        Listing::new(
            ListingDraft {
                id: "42".into(),
                title: "2к квартира".into(),
                url: "https://www.olx.ua/d/42".into(),
                owner_name: "Олена".into(),
                price: 5000.0,
                district_name: "Оболонський".into(),
                has_phone: true,
                description: String::new(),
                created_time: "2024-05-01".into(),
                last_refresh_time: "2024-05-02".into(),
                user_id: None,
                user_uuid: None,
            },
            Classification {
                is_realtor,
                listings_count,
            },
        )
    }

    #[test]
    fn renders_full_template() {
        let text = format_message(&listing(false, 1));
        let expected = "🏠 ВСТВАВАЙ НОВА ХАТА\n\n\
🟢 МОЖЛИВО Без рієлтора\n\
📌 2к квартира\n\
💰 Ціна: 5000 UAH\n\
👤 Власник: Олена\n\
📱 Телефон: Доступний\n\
📊 Кількість оголошень: 1\n\
📅 Дата створення: 2024-05-01\n\
🔄 Дата останнього оновлення: 2024-05-02\n\
🔗 URL: https://www.olx.ua/d/42";
        assert_eq!(text, expected);
    }

    #[test]
    fn status_line_follows_classification() {
        assert!(format_message(&listing(true, 0)).contains("\n🔴 Рієлтор\n"));
        assert!(format_message(&listing(false, 5)).contains("🟡 МОЖЛИВО НЕ РІЄЛТОР (5+ оголошень)"));
    }

    #[test]
    fn phone_renders_as_words() {
        let mut l = listing(false, 0);
        l.draft.has_phone = false;
        assert!(format_message(&l).contains("📱 Телефон: Не доступний\n"));
    }

    #[test]
    fn fractional_prices_keep_decimals() {
        assert_eq!(format_price(7500.5), "7500.5");
        assert_eq!(format_price(10000.0), "10000");
    }
}
