//! Language-tag selection state of the domain header.
//!
//! Tracks which tags a domain supports, which catalog tags remain available,
//! the default tag, and the operations popover. At most one popover is open
//! at a time and it always belongs to the selected tag.

use crate::LanguageTag;

/// Notification emitted after a mutation, mirroring the widget outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionChange {
    SupportedChanged,
    DefaultChanged,
    /// Something the enclosing form should treat as an edit.
    Changed,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("language tag {0} is not available for selection")]
    NotAvailable(LanguageTag),
    #[error("language tag {0} is not supported by the domain")]
    NotSupported(LanguageTag),
    #[error("language tag {0} is the default language")]
    DefaultTag(LanguageTag),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageSelection {
    supported: Vec<LanguageTag>,
    available: Vec<LanguageTag>,
    default: Option<LanguageTag>,
    selected: Option<LanguageTag>,
    popover_open: bool,
}

impl LanguageSelection {
    /// Catalog tags already supported are left out of the available list.
    pub fn new(
        mut supported: Vec<LanguageTag>,
        default: Option<LanguageTag>,
        catalog: &[LanguageTag],
    ) -> Self {
        supported.sort();
        supported.dedup();
        let available = catalog
            .iter()
            .filter(|tag| !supported.contains(tag))
            .cloned()
            .collect();
        Self {
            supported,
            available,
            default,
            selected: None,
            popover_open: false,
        }
    }

    pub fn supported(&self) -> &[LanguageTag] {
        &self.supported
    }

    pub fn available(&self) -> &[LanguageTag] {
        &self.available
    }

    pub fn default_tag(&self) -> Option<&LanguageTag> {
        self.default.as_ref()
    }

    pub fn selected(&self) -> Option<&LanguageTag> {
        self.selected.as_ref()
    }

    /// The tag whose popover is currently open, if any.
    pub fn open_popover(&self) -> Option<&LanguageTag> {
        self.selected.as_ref().filter(|_| self.popover_open)
    }

    pub fn is_popover_open(&self, tag: &LanguageTag) -> bool {
        self.open_popover() == Some(tag)
    }

    /// A default tag must be chosen.
    pub fn is_valid(&self) -> bool {
        self.default.is_some()
    }

    /// Trigger of a supported tag was activated.
    ///
    /// The default tag has no operations. Activating the selected tag again
    /// toggles its popover; activating another tag moves the popover to it.
    pub fn show_operations(&mut self, tag: &LanguageTag) {
        if self.default.as_ref() == Some(tag) || !self.supported.contains(tag) {
            return;
        }
        if self.selected.as_ref() == Some(tag) {
            self.popover_open = !self.popover_open;
        } else {
            self.close_opened_popover();
            self.selected = Some(tag.clone());
            self.popover_open = true;
        }
    }

    /// Move an available tag into the supported list, keeping it sorted.
    pub fn add(&mut self, tag: &LanguageTag) -> Result<Vec<SelectionChange>, SelectionError> {
        let Some(pos) = self.available.iter().position(|t| t == tag) else {
            return Err(SelectionError::NotAvailable(tag.clone()));
        };
        let tag = self.available.remove(pos);
        self.supported.push(tag);
        self.supported.sort();
        Ok(vec![SelectionChange::SupportedChanged, SelectionChange::Changed])
    }

    pub fn choose_default(
        &mut self,
        tag: &LanguageTag,
    ) -> Result<Vec<SelectionChange>, SelectionError> {
        if !self.supported.contains(tag) {
            return Err(SelectionError::NotSupported(tag.clone()));
        }
        self.default = Some(tag.clone());
        self.close_opened_popover();
        Ok(vec![SelectionChange::DefaultChanged, SelectionChange::Changed])
    }

    /// Give a supported tag back to the available list.
    pub fn remove(&mut self, tag: &LanguageTag) -> Result<Vec<SelectionChange>, SelectionError> {
        if self.default.as_ref() == Some(tag) {
            return Err(SelectionError::DefaultTag(tag.clone()));
        }
        let Some(pos) = self.supported.iter().position(|t| t == tag) else {
            return Err(SelectionError::NotSupported(tag.clone()));
        };
        let tag = self.supported.remove(pos);
        self.close_opened_popover();
        if self.selected.as_ref() == Some(&tag) {
            self.selected = None;
        }
        self.available.push(tag);
        Ok(vec![SelectionChange::SupportedChanged, SelectionChange::Changed])
    }

    /// Escape closes the open popover when pressed inside the widget.
    pub fn escape_pressed(&mut self, inside: bool) {
        if inside {
            self.close_opened_popover();
        }
    }

    /// A click anywhere in the document closes the popover unless it landed
    /// inside the widget.
    pub fn document_clicked(&mut self, inside: bool) {
        if !inside {
            self.close_opened_popover();
        }
    }

    fn close_opened_popover(&mut self) {
        self.popover_open = false;
    }
}
