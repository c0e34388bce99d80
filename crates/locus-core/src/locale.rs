//! User-facing strings.
//!
//! The product speaks Bengali by default; English is available for users who
//! cannot read Bengali script.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    #[serde(alias = "bn", alias = "bangla")]
    Bengali,
    #[serde(alias = "en")]
    English,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Bengali => "bn",
            Locale::English => "en",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bn" | "bengali" | "bangla" => Some(Locale::Bengali),
            "en" | "english" => Some(Locale::English),
            _ => None,
        }
    }

    /// Language name used when instructing the model.
    pub fn language_name(&self) -> &'static str {
        match self {
            Locale::Bengali => "Bengali",
            Locale::English => "English",
        }
    }

    pub fn meters_label(&self) -> &'static str {
        match self {
            Locale::Bengali => "মিটার",
            Locale::English => "meters",
        }
    }

    pub fn kilometers_label(&self) -> &'static str {
        match self {
            Locale::Bengali => "কি.মি.",
            Locale::English => "km",
        }
    }

    pub fn insight_empty(&self) -> &'static str {
        match self {
            Locale::Bengali => "দুঃখিত, কোনো তথ্য পাওয়া যায়নি।",
            Locale::English => "Sorry, no information was found.",
        }
    }

    pub fn insight_failed(&self) -> &'static str {
        match self {
            Locale::Bengali => "AI তথ্য লোড করতে ব্যর্থ হয়েছে।",
            Locale::English => "Failed to load AI information.",
        }
    }

    pub fn chat_empty(&self) -> &'static str {
        match self {
            Locale::Bengali => "আমি বুঝতে পারছি না।",
            Locale::English => "I don't understand.",
        }
    }

    pub fn chat_failed(&self) -> &'static str {
        match self {
            Locale::Bengali => "চ্যাট সার্ভিস বর্তমানে বন্ধ আছে।",
            Locale::English => "The chat service is currently unavailable.",
        }
    }

    pub fn voice_failed(&self) -> &'static str {
        match self {
            Locale::Bengali => "ভয়েস গাইডেন্স তৈরি করা সম্ভব হয়নি।",
            Locale::English => "Could not generate voice guidance.",
        }
    }

    pub fn invalid_friend_input(&self) -> &'static str {
        match self {
            Locale::Bengali => "সঠিক ফরম্যাটে (Lat, Lng) কোডটি দিন।",
            Locale::English => "Enter the code in the correct format (Lat, Lng).",
        }
    }

    pub fn coordinates_copied(&self) -> &'static str {
        match self {
            Locale::Bengali => "স্থানাঙ্ক কপি করা হয়েছে! এখন SMS বা মেসেঞ্জারে পাঠিয়ে দিন।",
            Locale::English => "Coordinates copied! Now send them by SMS or messenger.",
        }
    }

    pub fn share_title(&self) -> &'static str {
        match self {
            Locale::Bengali => "আমার লোকেশন - Locus Pro",
            Locale::English => "My location - Locus Pro",
        }
    }

    pub fn share_prefix(&self) -> &'static str {
        match self {
            Locale::Bengali => "আমাকে এখানে খুঁজুন",
            Locale::English => "Find me here",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_str() {
        assert_eq!(Locale::from_str("BN"), Some(Locale::Bengali));
        assert_eq!(Locale::from_str("english"), Some(Locale::English));
        assert_eq!(Locale::from_str("fr"), None);
    }

    #[test]
    fn test_locale_serde_lowercase() {
        let json = serde_json::to_string(&Locale::English).unwrap();
        assert_eq!(json, "\"english\"");
        let back: Locale = serde_json::from_str("\"bengali\"").unwrap();
        assert_eq!(back, Locale::Bengali);
    }

    #[test]
    fn test_locale_serde_accepts_short_codes() {
        for locale in [Locale::Bengali, Locale::English] {
            let json = format!("\"{}\"", locale.as_str());
            assert_eq!(serde_json::from_str::<Locale>(&json).unwrap(), locale);
        }
        assert_eq!(serde_json::from_str::<Locale>("\"bangla\"").unwrap(), Locale::Bengali);
    }
}
