//! Fallback images for article cards whose image failed to load.

const PLACEHOLDERS: &[(&str, &str)] = &[
    ("Tech", "https://images.unsplash.com/photo-1518770660439-4636190af475?w=800&q=80"),
    ("Culture", "https://images.unsplash.com/photo-1542206395-9feb3edaa68d?w=800&q=80"),
    ("Living", "https://images.unsplash.com/photo-1512917774080-9991f1c4c750?w=800&q=80"),
    ("Travel", "https://images.unsplash.com/photo-1469854523086-cc02fe5d8800?w=800&q=80"),
    ("Science", "https://images.unsplash.com/photo-1507413245164-6160d8298b31?w=800&q=80"),
    ("Design", "https://images.unsplash.com/photo-1511285560929-80b456fea0bc?w=800&q=80"),
    ("Business", "https://images.unsplash.com/photo-1519389950473-47ba0277781c?w=800&q=80"),
];

pub const DEFAULT_PLACEHOLDER: &str =
    "https://images.unsplash.com/photo-1501504905252-473c47e087f8?w=800&q=80";

// Checked in order; first hit wins.
const TITLE_HINTS: &[(&[&str], &str)] = &[
    (&["tech", "digital", "ai"], "Tech"),
    (&["design", "canvas"], "Design"),
    (&["urban", "living", "nomad"], "Living"),
    (&["culture", "people"], "Culture"),
    (&["science", "solar"], "Science"),
];

pub fn placeholder_for(category: &str) -> &'static str {
    PLACEHOLDERS
        .iter()
        .find(|(name, _)| *name == category)
        .map_or(DEFAULT_PLACEHOLDER, |(_, url)| *url)
}

/// Guess a category from a card title by keyword.
pub fn infer_category(title: &str) -> Option<&'static str> {
    let title = title.to_lowercase();
    TITLE_HINTS
        .iter()
        .find(|(words, _)| words.iter().any(|w| title.contains(w)))
        .map(|(_, category)| *category)
}

/// The replacement image for a broken card image.
///
/// The card's badge wins over title inference. Returns `None` when the image
/// already shows that fallback, so a broken placeholder cannot loop.
pub fn fallback_for(badge: Option<&str>, title: &str, current_src: &str) -> Option<&'static str> {
    let badge = badge.map(str::trim).filter(|b| !b.is_empty());
    let url = match badge {
        Some(category) => placeholder_for(category),
        None => infer_category(title).map_or(DEFAULT_PLACEHOLDER, placeholder_for),
    };

    if current_src == url {
        None
    } else {
        Some(url)
    }
}
