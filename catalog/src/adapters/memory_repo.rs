use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::{
    CoreError, Domain, DomainRepository, KeyMessage, KeyMessageRepository, Language,
    LanguageRepository, LanguageTag, MessageQuery,
};

/// In-memory domain repository keyed by id.
pub struct InMemoryDomainRepo {
    inner: Mutex<BTreeMap<String, Domain>>,
}

/// In-memory key message repository keyed by id.
pub struct InMemoryKeyMessageRepo {
    inner: Mutex<BTreeMap<String, KeyMessage>>,
}

/// In-memory language catalog preserving insertion order.
pub struct InMemoryLanguageRepo {
    inner: Mutex<Vec<Language>>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, CoreError> {
    m.lock()
        .map_err(|_| CoreError::Repository("mutex poisoned".into()))
}

fn require_id(id: &Option<String>) -> Result<String, CoreError> {
    id.clone()
        .ok_or_else(|| CoreError::Repository("record has no id".into()))
}

// ============ Demo data ============

fn demo_tag(s: &str) -> LanguageTag {
    // Only called with the literals below, all of which are well-formed.
    LanguageTag::new(s).unwrap_or_else(|_| LanguageTag(String::from("en")))
}

/// The demo domain served by the admin UI out of the box.
pub fn demo_domains() -> Vec<Domain> {
    vec![Domain {
        id: Some("1".into()),
        code: "I18N".into(),
        description: "I18n domain".into(),
        default_language_tag: Some(demo_tag("en")),
        supported_language_tags: vec![demo_tag("en"), demo_tag("fr")],
    }]
}

/// Key messages of the demo domain.
pub fn demo_key_messages() -> Vec<KeyMessage> {
    [("1", "test.one", "Test One"), ("2", "test.two", "Test Two")]
        .into_iter()
        .map(|(id, key, content)| KeyMessage {
            id: Some(id.into()),
            domain_id: "1".into(),
            key: key.into(),
            language_tag: demo_tag("en"),
            content: content.into(),
        })
        .collect()
}

/// Languages offered for selection.
pub fn demo_languages() -> Vec<Language> {
    [
        ("en", "English", "English"),
        ("es", "Español", "Spanish"),
        ("de", "Deutsch", "German"),
        ("fr", "Français", "French"),
        ("zh", "中文", "Chinese"),
    ]
    .into_iter()
    .map(|(code, label, english_label)| Language {
        code: demo_tag(code),
        label: label.into(),
        english_label: english_label.into(),
    })
    .collect()
}

// ============ InMemoryDomainRepo ============

impl InMemoryDomainRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_demo_data() -> Self {
        let repo = Self::new();
        if let Ok(mut map) = repo.inner.lock() {
            for d in demo_domains() {
                if let Some(id) = d.id.clone() {
                    map.insert(id, d);
                }
            }
        }
        repo
    }
}

impl Default for InMemoryDomainRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainRepository for InMemoryDomainRepo {
    fn get(&self, id: &str) -> Result<Option<Domain>, CoreError> {
        Ok(lock(&self.inner)?.get(id).cloned())
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Domain>, CoreError> {
        Ok(lock(&self.inner)?
            .values()
            .find(|d| d.code == code)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Domain>, CoreError> {
        let mut all: Vec<_> = lock(&self.inner)?.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    fn insert(&self, domain: Domain) -> Result<(), CoreError> {
        let id = require_id(&domain.id)?;
        let mut map = lock(&self.inner)?;
        if map.contains_key(&id) || map.values().any(|d| d.code == domain.code) {
            return Err(CoreError::AlreadyExists);
        }
        map.insert(id, domain);
        Ok(())
    }

    fn update(&self, domain: &Domain) -> Result<(), CoreError> {
        let id = require_id(&domain.id)?;
        let mut map = lock(&self.inner)?;
        match map.get_mut(&id) {
            Some(slot) => {
                *slot = domain.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound),
        }
    }

    fn delete(&self, id: &str) -> Result<(), CoreError> {
        match lock(&self.inner)?.remove(id) {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound),
        }
    }

    fn is_language_used(&self, tag: &LanguageTag) -> Result<bool, CoreError> {
        Ok(lock(&self.inner)?
            .values()
            .any(|d| d.supports(tag) || d.default_language_tag.as_ref() == Some(tag)))
    }
}

// ============ InMemoryKeyMessageRepo ============

impl InMemoryKeyMessageRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_demo_data() -> Self {
        let repo = Self::new();
        if let Ok(mut map) = repo.inner.lock() {
            for m in demo_key_messages() {
                if let Some(id) = m.id.clone() {
                    map.insert(id, m);
                }
            }
        }
        repo
    }
}

impl Default for InMemoryKeyMessageRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMessageRepository for InMemoryKeyMessageRepo {
    fn get(&self, id: &str) -> Result<Option<KeyMessage>, CoreError> {
        Ok(lock(&self.inner)?.get(id).cloned())
    }

    fn find(&self, query: &MessageQuery) -> Result<Vec<KeyMessage>, CoreError> {
        let mut found: Vec<_> = lock(&self.inner)?
            .values()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    fn find_one(
        &self,
        domain_id: &str,
        key: &str,
        language_tag: &LanguageTag,
    ) -> Result<Option<KeyMessage>, CoreError> {
        Ok(lock(&self.inner)?
            .values()
            .find(|m| m.domain_id == domain_id && m.key == key && &m.language_tag == language_tag)
            .cloned())
    }

    fn insert(&self, message: KeyMessage) -> Result<(), CoreError> {
        let id = require_id(&message.id)?;
        let mut map = lock(&self.inner)?;
        let duplicate = map.values().any(|m| {
            m.domain_id == message.domain_id
                && m.key == message.key
                && m.language_tag == message.language_tag
        });
        if duplicate || map.contains_key(&id) {
            return Err(CoreError::AlreadyExists);
        }
        map.insert(id, message);
        Ok(())
    }

    fn update(&self, message: &KeyMessage) -> Result<(), CoreError> {
        let id = require_id(&message.id)?;
        let mut map = lock(&self.inner)?;
        let duplicate = map.iter().any(|(other, m)| {
            other != &id
                && m.domain_id == message.domain_id
                && m.key == message.key
                && m.language_tag == message.language_tag
        });
        if duplicate {
            return Err(CoreError::AlreadyExists);
        }
        match map.get_mut(&id) {
            Some(slot) => {
                *slot = message.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound),
        }
    }

    fn delete(&self, id: &str) -> Result<(), CoreError> {
        match lock(&self.inner)?.remove(id) {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound),
        }
    }

    fn delete_by_domain(&self, domain_id: &str) -> Result<usize, CoreError> {
        let mut map = lock(&self.inner)?;
        let before = map.len();
        map.retain(|_, m| m.domain_id != domain_id);
        Ok(before - map.len())
    }
}

// ============ InMemoryLanguageRepo ============

impl InMemoryLanguageRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    pub fn with_demo_data() -> Self {
        Self {
            inner: Mutex::new(demo_languages()),
        }
    }
}

impl Default for InMemoryLanguageRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageRepository for InMemoryLanguageRepo {
    fn list(&self) -> Result<Vec<Language>, CoreError> {
        Ok(lock(&self.inner)?.clone())
    }

    fn get(&self, code: &LanguageTag) -> Result<Option<Language>, CoreError> {
        Ok(lock(&self.inner)?.iter().find(|l| &l.code == code).cloned())
    }

    fn insert(&self, language: Language) -> Result<(), CoreError> {
        let mut all = lock(&self.inner)?;
        if all.iter().any(|l| l.code == language.code) {
            return Err(CoreError::AlreadyExists);
        }
        all.push(language);
        Ok(())
    }

    fn delete(&self, code: &LanguageTag) -> Result<(), CoreError> {
        let mut all = lock(&self.inner)?;
        let before = all.len();
        all.retain(|l| &l.code != code);
        if all.len() == before {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }
}
