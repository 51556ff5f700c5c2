//! Editable header of the domain screen: code, description and the
//! language-tag selection.

use super::selection::{LanguageSelection, SelectionChange, SelectionError};
use crate::service::DomainAccess;
use crate::{CoreError, Domain, LanguageTag};

#[derive(Clone, Debug)]
pub struct DomainHeader {
    initial: Domain,
    code: String,
    description: String,
    selection: LanguageSelection,
    editable: bool,
    dirty: bool,
}

impl DomainHeader {
    /// A domain that was never saved opens in edit mode.
    pub fn new(initial: Domain, catalog: &[LanguageTag]) -> Self {
        let editable = initial.id.is_none();
        let mut header = Self {
            selection: LanguageSelection::new(Vec::new(), None, catalog),
            code: String::new(),
            description: String::new(),
            initial: Domain::default(),
            editable,
            dirty: false,
        };
        header.reset(initial, catalog);
        header
    }

    /// Reload the form from a new input domain.
    pub fn reset(&mut self, initial: Domain, catalog: &[LanguageTag]) {
        self.code = initial.code.clone();
        self.description = initial.description.clone();
        self.selection = LanguageSelection::new(
            initial.supported_language_tags.clone(),
            initial.default_language_tag.clone(),
            catalog,
        );
        self.initial = initial;
        self.dirty = false;
    }

    pub fn initial(&self) -> &Domain {
        &self.initial
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn edit(&mut self) {
        self.editable = true;
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code<S: Into<String>>(&mut self, code: S) {
        self.code = code.into();
        self.dirty = true;
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description<S: Into<String>>(&mut self, description: S) {
        self.description = description.into();
        self.dirty = true;
    }

    pub fn selection(&self) -> &LanguageSelection {
        &self.selection
    }

    /// Popover-only interactions (triggers, escape, outside clicks).
    pub fn selection_mut(&mut self) -> &mut LanguageSelection {
        &mut self.selection
    }

    /// Run a selection mutation and fold its notifications into the form.
    pub fn update_selection<F>(&mut self, f: F) -> Result<(), SelectionError>
    where
        F: FnOnce(&mut LanguageSelection) -> Result<Vec<SelectionChange>, SelectionError>,
    {
        let changes = f(&mut self.selection)?;
        self.apply_selection(&changes);
        Ok(())
    }

    pub fn apply_selection(&mut self, changes: &[SelectionChange]) {
        if changes.contains(&SelectionChange::Changed) {
            self.dirty = true;
        }
    }

    /// Both form fields are filled and a default tag is chosen.
    pub fn is_valid(&self) -> bool {
        !self.code.trim().is_empty()
            && !self.description.trim().is_empty()
            && self.selection.is_valid()
    }

    /// The domain as it would be saved right now.
    pub fn to_domain(&self) -> Domain {
        Domain {
            id: self.initial.id.clone(),
            code: self.code.clone(),
            description: self.description.clone(),
            default_language_tag: self.selection.default_tag().cloned(),
            supported_language_tags: self.selection.supported().to_vec(),
        }
    }

    /// Save through the service and leave edit mode. The saved domain's id is
    /// where the screen navigates next.
    pub fn submit<S: DomainAccess + ?Sized>(&mut self, service: &S) -> Result<Domain, CoreError> {
        let saved = service.save_domain(self.to_domain())?;
        self.initial = saved.clone();
        self.editable = false;
        self.dirty = false;
        Ok(saved)
    }
}
