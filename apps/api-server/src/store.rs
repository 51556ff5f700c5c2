//! Storage selection for the server: in-memory or SQLite (feature-gated).

use std::sync::Arc;

use catalog::adapters::memory_repo::{
    InMemoryDomainRepo, InMemoryKeyMessageRepo, InMemoryLanguageRepo,
};
use catalog::{
    CoreError, Domain, DomainRepository, IdGenerator, KeyMessage, KeyMessageRepository, Language,
    LanguageRepository, LanguageTag, MessageQuery,
};
use tracing::{error, info};

use crate::config::{Config, StorageProvider};

struct MemoryStore {
    domains: InMemoryDomainRepo,
    messages: InMemoryKeyMessageRepo,
    languages: InMemoryLanguageRepo,
}

enum StoreKind {
    Memory(MemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteRepo),
}

/// Cloneable handle implementing every repository port over the chosen store.
#[derive(Clone)]
pub struct AnyRepo {
    kind: Arc<StoreKind>,
}

impl AnyRepo {
    pub fn memory(seed: bool) -> Self {
        let store = if seed {
            MemoryStore {
                domains: InMemoryDomainRepo::with_demo_data(),
                messages: InMemoryKeyMessageRepo::with_demo_data(),
                languages: InMemoryLanguageRepo::with_demo_data(),
            }
        } else {
            MemoryStore {
                domains: InMemoryDomainRepo::new(),
                messages: InMemoryKeyMessageRepo::new(),
                languages: InMemoryLanguageRepo::new(),
            }
        };
        Self {
            kind: Arc::new(StoreKind::Memory(store)),
        }
    }

    #[cfg(feature = "sqlite")]
    pub fn sqlite(path: &std::path::Path, seed: bool) -> Result<Self, CoreError> {
        let repo = sqlite_adapter::SqliteRepo::open(path)?;
        if seed && repo.seed_demo_data()? {
            info!(db_path = %path.display(), "seeded demo data");
        }
        Ok(Self {
            kind: Arc::new(StoreKind::Sqlite(repo)),
        })
    }

    fn domains(&self) -> &dyn DomainRepository {
        match &*self.kind {
            StoreKind::Memory(m) => &m.domains,
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite(r) => r,
        }
    }

    fn messages(&self) -> &dyn KeyMessageRepository {
        match &*self.kind {
            StoreKind::Memory(m) => &m.messages,
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite(r) => r,
        }
    }

    fn languages(&self) -> &dyn LanguageRepository {
        match &*self.kind {
            StoreKind::Memory(m) => &m.languages,
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite(r) => r,
        }
    }
}

// Construct a repository instance based on config and feature flags.
pub fn build_repo(cfg: &Config) -> AnyRepo {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        StorageProvider::Sqlite => match AnyRepo::sqlite(&cfg.db_path, cfg.seed_demo_data) {
            Ok(r) => {
                info!(db_path = %cfg.db_path.display(), "using sqlite storage");
                r
            }
            Err(e) => {
                error!(err = %e, "failed to open sqlite storage, falling back to memory");
                AnyRepo::memory(cfg.seed_demo_data)
            }
        },
        #[cfg(not(feature = "sqlite"))]
        StorageProvider::Sqlite => {
            tracing::warn!("STORAGE_PROVIDER=sqlite but the sqlite feature is disabled; using memory");
            AnyRepo::memory(cfg.seed_demo_data)
        }
        StorageProvider::Memory => {
            info!("using in-memory storage");
            AnyRepo::memory(cfg.seed_demo_data)
        }
    }
}

impl DomainRepository for AnyRepo {
    fn get(&self, id: &str) -> Result<Option<Domain>, CoreError> {
        self.domains().get(id)
    }
    fn find_by_code(&self, code: &str) -> Result<Option<Domain>, CoreError> {
        self.domains().find_by_code(code)
    }
    fn list(&self) -> Result<Vec<Domain>, CoreError> {
        self.domains().list()
    }
    fn insert(&self, domain: Domain) -> Result<(), CoreError> {
        self.domains().insert(domain)
    }
    fn update(&self, domain: &Domain) -> Result<(), CoreError> {
        self.domains().update(domain)
    }
    fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.domains().delete(id)
    }
    fn is_language_used(&self, tag: &LanguageTag) -> Result<bool, CoreError> {
        self.domains().is_language_used(tag)
    }
}

impl KeyMessageRepository for AnyRepo {
    fn get(&self, id: &str) -> Result<Option<KeyMessage>, CoreError> {
        self.messages().get(id)
    }
    fn find(&self, query: &MessageQuery) -> Result<Vec<KeyMessage>, CoreError> {
        self.messages().find(query)
    }
    fn find_one(
        &self,
        domain_id: &str,
        key: &str,
        language_tag: &LanguageTag,
    ) -> Result<Option<KeyMessage>, CoreError> {
        self.messages().find_one(domain_id, key, language_tag)
    }
    fn insert(&self, message: KeyMessage) -> Result<(), CoreError> {
        self.messages().insert(message)
    }
    fn update(&self, message: &KeyMessage) -> Result<(), CoreError> {
        self.messages().update(message)
    }
    fn delete(&self, id: &str) -> Result<(), CoreError> {
        self.messages().delete(id)
    }
    fn delete_by_domain(&self, domain_id: &str) -> Result<usize, CoreError> {
        self.messages().delete_by_domain(domain_id)
    }
}

impl LanguageRepository for AnyRepo {
    fn list(&self) -> Result<Vec<Language>, CoreError> {
        self.languages().list()
    }
    fn get(&self, code: &LanguageTag) -> Result<Option<Language>, CoreError> {
        self.languages().get(code)
    }
    fn insert(&self, language: Language) -> Result<(), CoreError> {
        self.languages().insert(language)
    }
    fn delete(&self, code: &LanguageTag) -> Result<(), CoreError> {
        self.languages().delete(code)
    }
}

/// Random v4 UUIDs for records created through the API.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_seeds_on_request() {
        let seeded = AnyRepo::memory(true);
        assert_eq!(DomainRepository::list(&seeded).unwrap().len(), 1);
        assert_eq!(LanguageRepository::list(&seeded).unwrap().len(), 5);

        let empty = AnyRepo::memory(false);
        assert!(DomainRepository::list(&empty).unwrap().is_empty());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_store_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let repo = AnyRepo::sqlite(&path, true).unwrap();
            LanguageRepository::delete(&repo, &LanguageTag::new("zh").unwrap()).unwrap();
        }
        let reopened = AnyRepo::sqlite(&path, true).unwrap();
        assert_eq!(LanguageRepository::list(&reopened).unwrap().len(), 4);
        let en = MessageQuery::new("1", LanguageTag::new("en").unwrap());
        assert_eq!(reopened.find(&en).unwrap().len(), 2);
    }

    #[test]
    fn uuid_ids_are_unique() {
        let ids = UuidIds;
        let a = ids.next_id();
        assert_eq!(a.len(), 36);
        assert_ne!(a, ids.next_id());
    }
}
