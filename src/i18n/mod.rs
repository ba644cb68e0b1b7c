//! Internationalization (i18n) support

use anyhow::{Context, Result};
use std::collections::HashMap;

/// Catalogs compiled into the binary: (language, YAML source)
const EMBEDDED: &[(&str, &str)] = &[
    ("en", include_str!("locales/en.yml")),
    ("pt-br", include_str!("locales/pt-br.yml")),
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Language used when a request names none
    language: String,
    /// Language consulted when a key is missing
    fallback: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// Create an empty handler
    pub fn new(language: &str, fallback: &str) -> Self {
        Self {
            language: normalize(language),
            fallback: normalize(fallback),
            translations: HashMap::new(),
        }
    }

    /// Handler loaded with the built-in `en` and `pt-br` catalogs
    pub fn embedded(language: &str, fallback: &str) -> Result<Self> {
        let mut i18n = Self::new(language, fallback);
        for (lang, source) in EMBEDDED {
            i18n.load_str(lang, source)?;
        }
        Ok(i18n)
    }

    /// Parse and register a YAML catalog
    pub fn load_str(&mut self, lang: &str, source: &str) -> Result<()> {
        let data: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(source)
            .with_context(|| format!("Failed to parse language catalog '{}'", lang))?;
        tracing::debug!("Loaded {} translations for {}", data.len(), lang);
        self.translations.insert(normalize(lang), data);
        Ok(())
    }

    /// The default language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Pick the language for a request: a supported `?lang=` wins, otherwise
    /// the default language
    pub fn resolve_language(&self, requested: Option<&str>) -> String {
        match requested.map(normalize) {
            Some(lang) if self.translations.contains_key(&lang) => lang,
            _ => self.language.clone(),
        }
    }

    /// Translate in the default language (`__` helper)
    pub fn get(&self, key: &str) -> String {
        self.get_for_lang(&self.language, key)
    }

    /// Translate `key` for `lang`, then the fallback language, then echo the key
    pub fn get_for_lang(&self, lang: &str, key: &str) -> String {
        let lang = normalize(lang);
        for candidate in [lang.as_str(), self.fallback.as_str()] {
            if let Some(value) = self
                .translations
                .get(candidate)
                .and_then(|data| get_nested_value(data, key))
            {
                return yaml_value_to_string(value);
            }
        }
        key.to_string()
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en", "pt-br")
    }
}

fn normalize(lang: &str) -> String {
    lang.trim().to_lowercase().replace('_', "-")
}

/// Get a nested value from a YAML map using dot notation
fn get_nested_value<'a>(
    data: &'a HashMap<String, serde_yaml::Value>,
    key: &str,
) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = data.get(parts.next()?);

    for part in parts {
        match current {
            Some(serde_yaml::Value::Mapping(map)) => {
                current = map.get(serde_yaml::Value::String(part.to_string()));
            }
            _ => return None,
        }
    }

    // A mapping is a group of keys, not a translation
    match current {
        Some(serde_yaml::Value::Mapping(_)) => None,
        other => other,
    }
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalogs() {
        let i18n = I18n::embedded("en", "pt-br").unwrap();
        assert_eq!(i18n.get("header.about"), "About");
        assert_eq!(i18n.get_for_lang("pt-br", "header.about"), "Sobre");
        assert_eq!(
            i18n.get_for_lang("pt-br", "website.making_some_changes"),
            "Fazendo algumas mudanças."
        );
    }

    #[test]
    fn test_fallback_chain() {
        let mut i18n = I18n::new("en", "pt-br");
        i18n.load_str("en", "hello: Hello\nmenu:\n  home: Home\n").unwrap();
        i18n.load_str("pt-br", "hello: Olá\nonly_pt: Somente\n").unwrap();

        assert_eq!(i18n.get("menu.home"), "Home");
        assert_eq!(i18n.get_for_lang("en", "only_pt"), "Somente");
        assert_eq!(i18n.get_for_lang("en", "missing.key"), "missing.key");
        // A group is not a translation
        assert_eq!(i18n.get("menu"), "menu");
    }

    #[test]
    fn test_resolve_language() {
        let i18n = I18n::embedded("en", "pt-br").unwrap();
        assert_eq!(i18n.resolve_language(Some("PT_BR")), "pt-br");
        assert_eq!(i18n.resolve_language(Some("fr")), "en");
        assert_eq!(i18n.resolve_language(None), "en");
    }

    #[test]
    fn test_invalid_catalog_is_an_error() {
        let mut i18n = I18n::default();
        assert!(i18n.load_str("en", "a: [unclosed").is_err());
    }
}
