//! Localised news items.
//!
//! Every item carries one title/description pair per supported language in
//! fixed columns (`news_title_<lang>`, `news_description_<lang>`). English is
//! mandatory; the other pairs are stored as empty strings when not provided.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    Es,
    It,
    De,
    Zh,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Fr,
        Language::Es,
        Language::It,
        Language::De,
        Language::Zh,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::It => "it",
            Language::De => "de",
            Language::Zh => "zh",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            "es" => Ok(Language::Es),
            "it" => Ok(Language::It),
            "de" => Ok(Language::De),
            "zh" => Ok(Language::Zh),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}

/// Row of the `news` table, serialized with its column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NewsItem {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub news_title_en: String,
    pub news_description_en: String,
    pub news_title_fr: String,
    pub news_description_fr: String,
    pub news_title_es: String,
    pub news_description_es: String,
    pub news_title_it: String,
    pub news_description_it: String,
    pub news_title_de: String,
    pub news_description_de: String,
    pub news_title_zh: String,
    pub news_description_zh: String,
}

impl NewsItem {
    pub fn from_draft(id: i64, created_at: DateTime<Utc>, draft: NewsDraft) -> Self {
        Self {
            id,
            created_at,
            news_title_en: draft.en.title,
            news_description_en: draft.en.description,
            news_title_fr: draft.fr.title,
            news_description_fr: draft.fr.description,
            news_title_es: draft.es.title,
            news_description_es: draft.es.description,
            news_title_it: draft.it.title,
            news_description_it: draft.it.description,
            news_title_de: draft.de.title,
            news_description_de: draft.de.description,
            news_title_zh: draft.zh.title,
            news_description_zh: draft.zh.description,
        }
    }

    pub fn pair(&self, lang: Language) -> (&str, &str) {
        match lang {
            Language::En => (&self.news_title_en, &self.news_description_en),
            Language::Fr => (&self.news_title_fr, &self.news_description_fr),
            Language::Es => (&self.news_title_es, &self.news_description_es),
            Language::It => (&self.news_title_it, &self.news_description_it),
            Language::De => (&self.news_title_de, &self.news_description_de),
            Language::Zh => (&self.news_title_zh, &self.news_description_zh),
        }
    }

    /// Projection in `lang`, falling back to English when that pair is empty.
    pub fn localized(&self, lang: Language) -> LocalizedNews {
        let (title, description) = self.pair(lang);
        let (lang, title, description) = if title.is_empty() && description.is_empty() {
            let (title, description) = self.pair(Language::En);
            (Language::En, title, description)
        } else {
            (lang, title, description)
        };

        LocalizedNews {
            id: self.id,
            created_at: self.created_at,
            lang,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedPair {
    pub title: String,
    pub description: String,
}

impl LocalizedPair {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// A news item about to be inserted. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsDraft {
    pub en: LocalizedPair,
    pub fr: LocalizedPair,
    pub es: LocalizedPair,
    pub it: LocalizedPair,
    pub de: LocalizedPair,
    pub zh: LocalizedPair,
}

impl NewsDraft {
    pub fn pair_mut(&mut self, lang: Language) -> &mut LocalizedPair {
        match lang {
            Language::En => &mut self.en,
            Language::Fr => &mut self.fr,
            Language::Es => &mut self.es,
            Language::It => &mut self.it,
            Language::De => &mut self.de,
            Language::Zh => &mut self.zh,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalizedNews {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub lang: Language,
    pub title: String,
    pub description: String,
}
