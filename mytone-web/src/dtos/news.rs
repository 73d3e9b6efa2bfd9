use serde::Deserialize;
use validator::Validate;

use crate::models::{Language, LocalizedPair, NewsDraft};

/// Admin form payload: `title_<lang>` / `description_<lang>` per language.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateNewsRequest {
    pub title_en: Option<String>,
    pub description_en: Option<String>,
    pub title_fr: Option<String>,
    pub description_fr: Option<String>,
    pub title_es: Option<String>,
    pub description_es: Option<String>,
    pub title_it: Option<String>,
    pub description_it: Option<String>,
    pub title_de: Option<String>,
    pub description_de: Option<String>,
    pub title_zh: Option<String>,
    pub description_zh: Option<String>,
}

impl CreateNewsRequest {
    fn field(&self, lang: Language) -> (Option<&str>, Option<&str>) {
        let (title, description) = match lang {
            Language::En => (&self.title_en, &self.description_en),
            Language::Fr => (&self.title_fr, &self.description_fr),
            Language::Es => (&self.title_es, &self.description_es),
            Language::It => (&self.title_it, &self.description_it),
            Language::De => (&self.title_de, &self.description_de),
            Language::Zh => (&self.title_zh, &self.description_zh),
        };
        (title.as_deref(), description.as_deref())
    }

    /// Returns `None` when the English title or description is missing.
    pub fn into_draft(self) -> Option<NewsDraft> {
        match self.field(Language::En) {
            (Some(title), Some(description)) if !title.is_empty() && !description.is_empty() => {}
            _ => return None,
        }

        let mut draft = NewsDraft::default();
        for lang in Language::ALL {
            let (title, description) = self.field(lang);
            *draft.pair_mut(lang) =
                LocalizedPair::new(title.unwrap_or_default(), description.unwrap_or_default());
        }
        Some(draft)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub lang: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_only_draft_fills_empty_pairs() {
        let req = CreateNewsRequest {
            title_en: Some("Hello".into()),
            description_en: Some("World".into()),
            ..Default::default()
        };
        let draft = req.into_draft().unwrap();
        assert_eq!(draft.en, LocalizedPair::new("Hello", "World"));
        assert_eq!(draft.de, LocalizedPair::default());
    }

    #[test]
    fn test_missing_english_description_is_rejected() {
        let req = CreateNewsRequest {
            title_en: Some("Hello".into()),
            title_fr: Some("Bonjour".into()),
            description_fr: Some("Monde".into()),
            ..Default::default()
        };
        assert!(req.into_draft().is_none());
    }
}
