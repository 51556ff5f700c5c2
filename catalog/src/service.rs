use crate::validate::{
    validate_domain_update, validate_key_message, validate_language, validate_new_domain,
};
use crate::{
    CoreError, Domain, DomainRepository, IdGenerator, KeyMessage, KeyMessageRepository, Language,
    LanguageRepository, LanguageTag, MessageQuery,
};

/// Domain operations the admin screens depend on.
pub trait DomainAccess {
    fn get_domains(&self) -> Result<Vec<Domain>, CoreError>;
    fn get_domain(&self, id: &str) -> Result<Domain, CoreError>;
    fn save_domain(&self, domain: Domain) -> Result<Domain, CoreError>;
}

/// Application service for domains.
///
/// Generic over the three repositories (domain validation needs the language
/// catalog, deletion cascades to key messages) and the id generator.
pub struct DomainService<D, M, L, G> {
    domains: D,
    messages: M,
    languages: L,
    ids: G,
}

impl<D, M, L, G> DomainService<D, M, L, G>
where
    D: DomainRepository,
    M: KeyMessageRepository,
    L: LanguageRepository,
    G: IdGenerator,
{
    pub fn new(domains: D, messages: M, languages: L, ids: G) -> Self {
        Self {
            domains,
            messages,
            languages,
            ids,
        }
    }

    /// All domains ordered by code.
    pub fn get_domains(&self) -> Result<Vec<Domain>, CoreError> {
        self.domains.list()
    }

    pub fn get_domain(&self, id: &str) -> Result<Domain, CoreError> {
        self.domains.get(id)?.ok_or(CoreError::NotFound)
    }

    pub fn find_by_code(&self, code: &str) -> Result<Domain, CoreError> {
        self.domains.find_by_code(code)?.ok_or(CoreError::NotFound)
    }

    /// Create the domain when it has no id, otherwise replace the stored one.
    pub fn save_domain(&self, mut domain: Domain) -> Result<Domain, CoreError> {
        domain.supported_language_tags.sort();
        domain.supported_language_tags.dedup();
        let known = self.known_tags()?;

        match domain.id.clone() {
            None => {
                validate_new_domain(&domain, &known)?;
                if self.domains.find_by_code(&domain.code)?.is_some() {
                    return Err(CoreError::AlreadyExists);
                }
                domain.id = Some(self.ids.next_id());
                self.domains.insert(domain.clone())?;
            }
            Some(id) => {
                let stored = self.domains.get(&id)?.ok_or(CoreError::NotFound)?;
                validate_domain_update(&domain, &stored, &known)?;
                self.domains.update(&domain)?;
            }
        }
        Ok(domain)
    }

    /// Delete a domain together with its key messages.
    ///
    /// The domain goes first: if that fails its messages are untouched, and
    /// messages left behind by a failed sweep belong to no domain and are
    /// never served.
    pub fn delete_domain(&self, id: &str) -> Result<usize, CoreError> {
        if self.domains.get(id)?.is_none() {
            return Err(CoreError::NotFound);
        }
        self.domains.delete(id)?;
        self.messages.delete_by_domain(id)
    }

    fn known_tags(&self) -> Result<Vec<LanguageTag>, CoreError> {
        Ok(self
            .languages
            .list()?
            .into_iter()
            .map(|l| l.code)
            .collect())
    }
}

impl<D, M, L, G> DomainAccess for DomainService<D, M, L, G>
where
    D: DomainRepository,
    M: KeyMessageRepository,
    L: LanguageRepository,
    G: IdGenerator,
{
    fn get_domains(&self) -> Result<Vec<Domain>, CoreError> {
        DomainService::get_domains(self)
    }

    fn get_domain(&self, id: &str) -> Result<Domain, CoreError> {
        DomainService::get_domain(self, id)
    }

    fn save_domain(&self, domain: Domain) -> Result<Domain, CoreError> {
        DomainService::save_domain(self, domain)
    }
}

/// Application service for the key messages of a domain.
pub struct KeyMessageService<D, M, G> {
    domains: D,
    messages: M,
    ids: G,
}

impl<D, M, G> KeyMessageService<D, M, G>
where
    D: DomainRepository,
    M: KeyMessageRepository,
    G: IdGenerator,
{
    pub fn new(domains: D, messages: M, ids: G) -> Self {
        Self {
            domains,
            messages,
            ids,
        }
    }

    /// Messages of a domain in one language, optionally narrowed by exact key
    /// and by content substring.
    pub fn find_messages(
        &self,
        domain_id: &str,
        language_tag: &LanguageTag,
        key: Option<&str>,
        content: Option<&str>,
    ) -> Result<Vec<KeyMessage>, CoreError> {
        if self.domains.get(domain_id)?.is_none() {
            return Err(CoreError::NotFound);
        }
        let mut query = MessageQuery::new(domain_id, language_tag.clone());
        if let Some(k) = key.filter(|k| !k.is_empty()) {
            query = query.with_key(k);
        }
        if let Some(c) = content.filter(|c| !c.is_empty()) {
            query = query.with_content(c);
        }
        self.messages.find(&query)
    }

    /// Create the message when it has no id, otherwise replace the stored one.
    pub fn save_message(&self, mut message: KeyMessage) -> Result<KeyMessage, CoreError> {
        let domain = self
            .domains
            .get(&message.domain_id)?
            .ok_or(CoreError::NotFound)?;
        validate_key_message(&message, &domain)?;

        let existing =
            self.messages
                .find_one(&message.domain_id, &message.key, &message.language_tag)?;

        match message.id.clone() {
            None => {
                if existing.is_some() {
                    return Err(CoreError::AlreadyExists);
                }
                message.id = Some(self.ids.next_id());
                self.messages.insert(message.clone())?;
            }
            Some(id) => {
                let stored = self.messages.get(&id)?.ok_or(CoreError::NotFound)?;
                if stored.domain_id != message.domain_id {
                    return Err(CoreError::NotFound);
                }
                if existing.is_some_and(|other| other.id.as_deref() != Some(id.as_str())) {
                    return Err(CoreError::AlreadyExists);
                }
                self.messages.update(&message)?;
            }
        }
        Ok(message)
    }

    pub fn delete_message(&self, domain_id: &str, id: &str) -> Result<(), CoreError> {
        match self.messages.get(id)? {
            Some(stored) if stored.domain_id == domain_id => self.messages.delete(id),
            _ => Err(CoreError::NotFound),
        }
    }
}

/// Application service for the language catalog.
pub struct LanguageService<D, L> {
    domains: D,
    languages: L,
}

impl<D, L> LanguageService<D, L>
where
    D: DomainRepository,
    L: LanguageRepository,
{
    pub fn new(domains: D, languages: L) -> Self {
        Self { domains, languages }
    }

    /// Tags available for selection, in catalog order.
    pub fn find_language_tags(&self) -> Result<Vec<LanguageTag>, CoreError> {
        Ok(self
            .languages
            .list()?
            .into_iter()
            .map(|l| l.code)
            .collect())
    }

    pub fn find_languages(&self) -> Result<Vec<Language>, CoreError> {
        self.languages.list()
    }

    pub fn create_language(&self, language: Language) -> Result<Language, CoreError> {
        validate_language(&language)?;
        if self.languages.get(&language.code)?.is_some() {
            return Err(CoreError::AlreadyExists);
        }
        self.languages.insert(language.clone())?;
        Ok(language)
    }

    /// Remove a language that no domain refers to.
    pub fn delete_language(&self, code: &LanguageTag) -> Result<(), CoreError> {
        if self.languages.get(code)?.is_none() {
            return Err(CoreError::NotFound);
        }
        if self.domains.is_language_used(code)? {
            return Err(CoreError::Conflict(format!(
                "language {code} is used by a domain"
            )));
        }
        self.languages.delete(code)
    }
}
