//! Scraped-description cleanup.
//!
//! Product descriptions arrive with storefront boilerplate appended by the
//! source site: footer blocks, contact lines, rating prompts. Normalization
//! cuts the text at the earliest end-marker, strips the noise-phrase list,
//! collapses the repeated contact-us phrase, and trims. The function is pure
//! and idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

/// Markers that open trailing boilerplate. Everything from the earliest
/// occurrence onward is dropped.
const END_MARKERS: [&str; 4] = [
    "Your Dynamic Snippet will be displayed here...",
    "Get to know us",
    "Best Price Guarantee",
    "Social Media",
];

/// Phrases removed wherever they appear in the remaining text.
const NOISE_PHRASES: [&str; 9] = [
    "أرسل لنا رسالة",
    "[email protected]",
    "+2 01062185805",
    "Terms & Conditions - Babyisland Stores Locations",
    "Return & Refund Policy",
    "الرئيسية",
    "من نحن",
    "•",
    "Rate Us",
];

/// "Contact us" occurs repeated back-to-back in scraped footers; a whole run
/// collapses to nothing.
static CONTACT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(تواصل معنا\s*)+").expect("contact-us pattern"));

/// Strip boilerplate from a raw product description.
#[must_use]
pub fn normalize_description(raw: &str) -> String {
    let mut text = raw;
    if let Some(cut) = END_MARKERS.iter().filter_map(|marker| text.find(marker)).min() {
        text = &text[..cut];
    }

    let mut cleaned = CONTACT_RUN.replace_all(text, "").into_owned();
    for phrase in NOISE_PHRASES {
        if cleaned.contains(phrase) {
            cleaned = cleaned.replace(phrase, "");
        }
    }

    cleaned.trim().to_string()
}
