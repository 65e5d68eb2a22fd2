use serde::{ Deserialize, Serialize };
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_TOP_K: u32 = 40;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Sampling parameters sent with every upstream call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseThresholdError {
    message: String,
}

impl fmt::Display for ParseThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseThresholdError {}

impl FromStr for HarmBlockThreshold {
    type Err = ParseThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" | "block_none" => Ok(HarmBlockThreshold::BlockNone),
            "high" | "block_only_high" => Ok(HarmBlockThreshold::BlockOnlyHigh),
            "medium" | "block_medium_and_above" => Ok(HarmBlockThreshold::BlockMediumAndAbove),
            "low" | "block_low_and_above" => Ok(HarmBlockThreshold::BlockLowAndAbove),
            _ =>
                Err(ParseThresholdError {
                    message: format!("Invalid safety threshold: '{}'", s),
                }),
        }
    }
}

pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: HarmBlockThreshold,
}

/// Applies one threshold to every harm category.
pub fn safety_settings(threshold: HarmBlockThreshold) -> Vec<SafetySetting> {
    HARM_CATEGORIES.iter()
        .map(|category| SafetySetting {
            category: category.to_string(),
            threshold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_defaults_serialize_camel_case() {
        let json = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(json["topK"], 40);
        assert_eq!(json["maxOutputTokens"], 8192);
        assert!((json["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn threshold_parses_short_and_long_names() {
        assert_eq!("medium".parse::<HarmBlockThreshold>(), Ok(HarmBlockThreshold::BlockMediumAndAbove));
        assert_eq!("BLOCK_ONLY_HIGH".parse::<HarmBlockThreshold>(), Ok(HarmBlockThreshold::BlockOnlyHigh));
        assert!("sometimes".parse::<HarmBlockThreshold>().is_err());
    }

    #[test]
    fn safety_settings_cover_every_category() {
        let settings = safety_settings(HarmBlockThreshold::BlockNone);
        assert_eq!(settings.len(), HARM_CATEGORIES.len());
        let json = serde_json::to_value(&settings[0]).unwrap();
        assert_eq!(json["threshold"], "BLOCK_NONE");
    }
}
