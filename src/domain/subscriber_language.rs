const SUPPORTED_LANGUAGES: [&str; 3] = ["CA", "ES", "EN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum SubscriberLanguage {
    #[default]
    #[serde(rename = "CA")]
    Catalan,
    #[serde(rename = "ES")]
    Spanish,
    #[serde(rename = "EN")]
    English,
}

impl SubscriberLanguage {
    /// Parses one of the supported language codes, ignoring case.
    pub fn parse(language: String) -> Result<SubscriberLanguage, String> {
        match language.trim().to_uppercase().as_str() {
            "CA" => Ok(Self::Catalan),
            "ES" => Ok(Self::Spanish),
            "EN" => Ok(Self::English),
            _ => Err(format!(
                "{} is not a supported language. Use one of {:?}",
                language, SUPPORTED_LANGUAGES
            )),
        }
    }

    /// Lowercase code used as the locale segment of public links.
    pub fn locale(&self) -> &'static str {
        match self {
            Self::Catalan => "ca",
            Self::Spanish => "es",
            Self::English => "en",
        }
    }
}

impl AsRef<str> for SubscriberLanguage {
    fn as_ref(&self) -> &str {
        match self {
            Self::Catalan => "CA",
            Self::Spanish => "ES",
            Self::English => "EN",
        }
    }
}
