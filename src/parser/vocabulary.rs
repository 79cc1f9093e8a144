// Heuristic vocabulary: category keywords, platform aliases and stopwords
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::ConfigError;

/// Static configuration the query parser runs against.
///
/// Category and platform entries are ordered lists: the first category keyword
/// found in a query wins, so the order here is part of the behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct Vocabulary {
    categories: Vec<(String, String)>,
    platforms: Vec<(String, String)>,
    stopwords: HashSet<String>,
}

impl Vocabulary {
    pub fn new(
        categories: Vec<(String, String)>,
        platforms: Vec<(String, String)>,
        stopwords: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            categories: lowercase_keys(categories),
            platforms: lowercase_keys(platforms),
            stopwords: stopwords.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Reads a vocabulary from a JSON file of the form
    /// `{"categories": [["laptop", "Laptops"]], "platforms": [["amzn", "AMAZON"]], "stopwords": ["the"]}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let raw: Vocabulary = serde_json::from_str(&content)?;
        Ok(Self::new(raw.categories, raw.platforms, raw.stopwords))
    }

    pub fn categories(&self) -> &[(String, String)] {
        &self.categories
    }

    pub fn platforms(&self) -> &[(String, String)] {
        &self.platforms
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// The default shopping vocabulary.
    pub fn builtin() -> Self {
        Self::new(
            pairs(BUILTIN_CATEGORIES),
            pairs(BUILTIN_PLATFORMS),
            BUILTIN_STOPWORDS.iter().map(|w| w.to_string()),
        )
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lowercase_keys(entries: Vec<(String, String)>) -> Vec<(String, String)> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_lowercase(), value))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn pairs(table: &[(&str, &str)]) -> Vec<(String, String)> {
    table
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const BUILTIN_CATEGORIES: &[(&str, &str)] = &[
    // electronics
    ("laptop", "Laptops"),
    ("notebook", "Laptops"),
    ("macbook", "Laptops"),
    ("gaming laptop", "Laptops"),
    ("pc", "Laptops"),
    ("mobile", "Mobile Phones"),
    ("phone", "Mobile Phones"),
    ("smartphone", "Mobile Phones"),
    ("iphone", "Mobile Phones"),
    ("android", "Mobile Phones"),
    ("samsung", "Mobile Phones"),
    ("tv", "Televisions"),
    ("television", "Televisions"),
    ("led", "Televisions"),
    ("smart tv", "Televisions"),
    ("4k", "Televisions"),
    ("watch", "Wearables"),
    ("smartwatch", "Wearables"),
    ("band", "Wearables"),
    ("apple watch", "Wearables"),
    ("tracker", "Wearables"),
    ("headphone", "Audio"),
    ("earphone", "Audio"),
    ("buds", "Audio"),
    ("airpods", "Audio"),
    ("speaker", "Audio"),
    ("soundbar", "Audio"),
    ("headset", "Audio"),
    ("camera", "Cameras"),
    ("dslr", "Cameras"),
    ("mirrorless", "Cameras"),
    ("gopro", "Cameras"),
    ("tablet", "Tablets"),
    ("ipad", "Tablets"),
    ("tab", "Tablets"),
    // fashion
    ("shoe", "Fashion"),
    ("sneaker", "Fashion"),
    ("boot", "Fashion"),
    ("running shoes", "Fashion"),
    ("footwear", "Fashion"),
    ("shirt", "Fashion"),
    ("t-shirt", "Fashion"),
    ("top", "Fashion"),
    ("jeans", "Fashion"),
    ("trousers", "Fashion"),
    ("pant", "Fashion"),
    ("dress", "Fashion"),
    ("saree", "Fashion"),
    ("kurti", "Fashion"),
    ("lehenga", "Fashion"),
    ("jacket", "Fashion"),
    ("hoodie", "Fashion"),
    ("bag", "Fashion"),
    ("backpack", "Fashion"),
    ("purse", "Fashion"),
    ("wallet", "Fashion"),
    ("luggage", "Fashion"),
    // home
    ("fridge", "Home Appliances"),
    ("refrigerator", "Home Appliances"),
    ("washing machine", "Home Appliances"),
    ("washer", "Home Appliances"),
    ("ac", "Home Appliances"),
    ("air conditioner", "Home Appliances"),
    ("cooler", "Home Appliances"),
    ("microwave", "Home Appliances"),
    ("oven", "Home Appliances"),
    ("mixer", "Home Appliances"),
    ("fan", "Home Appliances"),
];

const BUILTIN_PLATFORMS: &[(&str, &str)] = &[
    ("amazon", "AMAZON"),
    ("amzn", "AMAZON"),
    ("flipkart", "FLIPKART"),
    ("fk", "FLIPKART"),
    ("myntra", "MYNTRA"),
    ("meesho", "MEESHO"),
    ("ajio", "AJIO"),
];

const BUILTIN_STOPWORDS: &[&str] = &[
    "i", "im", "am", "looking", "for", "want", "need", "search", "find", "show", "me", "a", "an",
    "the", "is", "are", "with", "in", "on", "at", "to", "from", "budget", "price", "range", "cost",
    "around", "under", "below", "above", "over", "between", "rs", "rupees", "inr", "best", "good",
    "suggest", "buy", "purchase", "cheap", "expensive", "new", "latest",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_keeps_configured_order() {
        let vocab = Vocabulary::builtin();
        assert_eq!(vocab.categories()[0].0, "laptop");
        assert_eq!(vocab.platforms()[1], ("amzn".to_string(), "AMAZON".to_string()));
        assert!(vocab.is_stopword("budget"));
        assert!(!vocab.is_stopword("laptop"));
    }

    #[test]
    fn keys_are_lowercased() {
        let vocab = Vocabulary::new(
            vec![("DRONE".into(), "Drones".into())],
            vec![],
            vec!["The".to_string()],
        );
        assert_eq!(vocab.categories()[0].0, "drone");
        assert!(vocab.is_stopword("the"));
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{"categories": [["kettle", "Kitchen"]], "platforms": [["amzn", "AMAZON"]], "stopwords": ["a"]}"#;
        let raw: Vocabulary = serde_json::from_str(json).unwrap();
        assert_eq!(raw.categories()[0].1, "Kitchen");
    }
}
