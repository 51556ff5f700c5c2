use crate::service::DomainAccess;
use crate::CoreError;

/// One link of the navigation bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavEntry {
    pub id: String,
    pub code: String,
}

impl NavEntry {
    pub fn path(&self) -> String {
        format!("/domain/{}", self.id)
    }
}

/// Navigation bar listing the known domains by code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Navigation {
    entries: Vec<NavEntry>,
    active: Option<String>,
}

impl Navigation {
    pub fn load<S: DomainAccess + ?Sized>(service: &S) -> Result<Self, CoreError> {
        let entries = service
            .get_domains()?
            .into_iter()
            .filter_map(|d| d.id.map(|id| NavEntry { id, code: d.code }))
            .collect();
        Ok(Self {
            entries,
            active: None,
        })
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    /// Highlight the entry of the domain on screen. Unknown ids clear it.
    pub fn activate(&mut self, id: Option<&str>) {
        self.active = id
            .filter(|id| self.entries.iter().any(|e| e.id == *id))
            .map(str::to_string);
    }

    pub fn active(&self) -> Option<&NavEntry> {
        let id = self.active.as_deref()?;
        self.entries.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::memory_repo::{
        InMemoryDomainRepo, InMemoryKeyMessageRepo, InMemoryLanguageRepo,
    };
    use crate::id::SequentialIdGenerator;
    use crate::service::DomainService;

    #[test]
    fn lists_demo_domain() {
        let svc = DomainService::new(
            Arc::new(InMemoryDomainRepo::with_demo_data()),
            Arc::new(InMemoryKeyMessageRepo::new()),
            Arc::new(InMemoryLanguageRepo::with_demo_data()),
            SequentialIdGenerator::default(),
        );
        let mut nav = Navigation::load(&svc).unwrap();
        assert_eq!(
            nav.entries(),
            &[NavEntry {
                id: "1".into(),
                code: "I18N".into()
            }]
        );
        assert_eq!(nav.entries()[0].path(), "/domain/1");

        nav.activate(Some("1"));
        assert_eq!(nav.active().map(|e| e.code.as_str()), Some("I18N"));
        nav.activate(Some("missing"));
        assert_eq!(nav.active(), None);
    }
}
