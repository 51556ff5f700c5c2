//! Domain detail screen and the admin shell around it.

use super::nav::Navigation;
use crate::service::DomainAccess;
use crate::{CoreError, Domain};

/// Domain shown by the detail route, plus whether it is being edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainDetail {
    domain: Domain,
    editable: bool,
}

impl DomainDetail {
    /// Without a route id the screen creates a new domain.
    pub fn resolve<S: DomainAccess + ?Sized>(
        service: &S,
        route_id: Option<&str>,
    ) -> Result<Self, CoreError> {
        let domain = match route_id {
            Some(id) => service.get_domain(id)?,
            None => Domain::default(),
        };
        Ok(Self::from_domain(domain))
    }

    pub fn from_domain(domain: Domain) -> Self {
        let editable = domain.id.is_none();
        Self { domain, editable }
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn edit(&mut self) {
        self.editable = true;
    }

    /// The header saved the domain; show the stored version read-only.
    pub fn submitted(&mut self, saved: Domain) {
        self.domain = saved;
        self.editable = false;
    }
}

/// Root screen: navigation bar plus the routed detail view.
#[derive(Clone, Debug)]
pub struct AdminShell {
    pub nav: Navigation,
    pub detail: DomainDetail,
}

impl AdminShell {
    pub fn open<S: DomainAccess + ?Sized>(
        service: &S,
        route_id: Option<&str>,
    ) -> Result<Self, CoreError> {
        let mut nav = Navigation::load(service)?;
        let detail = DomainDetail::resolve(service, route_id)?;
        nav.activate(detail.domain().id.as_deref());
        Ok(Self { nav, detail })
    }

    /// Reload navigation after a save so new codes show up.
    pub fn refresh<S: DomainAccess + ?Sized>(&mut self, service: &S) -> Result<(), CoreError> {
        self.nav = Navigation::load(service)?;
        self.nav.activate(self.detail.domain().id.as_deref());
        Ok(())
    }
}
