//! Validation rules applied before records are persisted.
//!
//! Every rule that fails contributes one [`FieldError`]; callers get the full
//! list in a single [`CoreError::Validation`].

use crate::{CoreError, Domain, FieldError, KeyMessage, Language, LanguageTag};

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[derive(Default)]
struct Errors(Vec<FieldError>);

impl Errors {
    fn reject(&mut self, field: &'static str, code: &'static str) {
        self.0.push(FieldError { field, code });
    }

    fn into_result(self) -> Result<(), CoreError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self.0))
        }
    }
}

/// Rules for a domain being created.
pub fn validate_new_domain(domain: &Domain, known_tags: &[LanguageTag]) -> Result<(), CoreError> {
    let mut errors = Errors::default();
    if is_blank(&domain.code) {
        errors.reject("code", "domain.code.required");
    }
    check_domain_body(domain, known_tags, &mut errors);
    errors.into_result()
}

/// Rules for a domain replacing `stored`. The code cannot change.
pub fn validate_domain_update(
    domain: &Domain,
    stored: &Domain,
    known_tags: &[LanguageTag],
) -> Result<(), CoreError> {
    let mut errors = Errors::default();
    if domain.code != stored.code {
        errors.reject("code", "domain.code.immutable");
    }
    check_domain_body(domain, known_tags, &mut errors);
    errors.into_result()
}

fn check_domain_body(domain: &Domain, known_tags: &[LanguageTag], errors: &mut Errors) {
    if is_blank(&domain.description) {
        errors.reject("description", "domain.description.required");
    }
    if domain.supported_language_tags.is_empty() {
        errors.reject("supportedLanguageTags", "domain.supportedLanguageTags.required");
    }
    match domain.default_language_tag {
        None => errors.reject("defaultLanguageTag", "domain.defaultLanguageTag.required"),
        Some(ref default) => {
            if !domain.supported_language_tags.is_empty() && !domain.supports(default) {
                errors.reject("defaultLanguageTag", "domain.defaultLanguageTag.matchSupported");
            }
            if !known_tags.contains(default) {
                errors.reject("defaultLanguageTag", "domain.defaultLanguageTag.unavailable");
            }
        }
    }
    if domain
        .supported_language_tags
        .iter()
        .any(|tag| !known_tags.contains(tag))
    {
        errors.reject(
            "supportedLanguageTags",
            "domain.supportedLanguageTags.unavailable",
        );
    }
}

/// Rules for a key message belonging to `domain`.
pub fn validate_key_message(message: &KeyMessage, domain: &Domain) -> Result<(), CoreError> {
    let mut errors = Errors::default();
    if is_blank(&message.key) {
        errors.reject("key", "keyMessage.key.required");
    }
    if message.content.is_empty() {
        errors.reject("content", "keyMessage.content.required");
    }
    if !domain.supports(&message.language_tag) {
        errors.reject("languageTag", "keyMessage.languageTag.unsupported");
    }
    errors.into_result()
}

/// Rules for a catalog language. The code is validated by [`LanguageTag`].
pub fn validate_language(language: &Language) -> Result<(), CoreError> {
    let mut errors = Errors::default();
    if is_blank(&language.label) {
        errors.reject("label", "language.label.required");
    }
    if is_blank(&language.english_label) {
        errors.reject("englishLabel", "language.englishLabel.required");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::new(s).unwrap()
    }

    fn known() -> Vec<LanguageTag> {
        ["en", "es", "de", "fr", "zh"].into_iter().map(tag).collect()
    }

    fn valid_domain() -> Domain {
        Domain {
            id: None,
            code: "I18N".into(),
            description: "I18n domain".into(),
            default_language_tag: Some(tag("en")),
            supported_language_tags: vec![tag("en"), tag("fr")],
        }
    }

    fn codes(err: CoreError) -> Vec<&'static str> {
        match err {
            CoreError::Validation(errors) => errors.into_iter().map(|e| e.code).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_complete_domain() {
        assert!(validate_new_domain(&valid_domain(), &known()).is_ok());
    }

    #[test]
    fn empty_domain_reports_every_missing_field() {
        let err = validate_new_domain(&Domain::default(), &known()).unwrap_err();
        assert_eq!(
            codes(err),
            vec![
                "domain.code.required",
                "domain.description.required",
                "domain.supportedLanguageTags.required",
                "domain.defaultLanguageTag.required",
            ]
        );
    }

    #[test]
    fn default_must_be_supported_and_known() {
        let mut d = valid_domain();
        d.default_language_tag = Some(tag("de"));
        assert_eq!(
            codes(validate_new_domain(&d, &known()).unwrap_err()),
            vec!["domain.defaultLanguageTag.matchSupported"]
        );

        let mut d = valid_domain();
        d.supported_language_tags.push(tag("it"));
        d.default_language_tag = Some(tag("it"));
        assert_eq!(
            codes(validate_new_domain(&d, &known()).unwrap_err()),
            vec![
                "domain.defaultLanguageTag.unavailable",
                "domain.supportedLanguageTags.unavailable",
            ]
        );
    }

    #[test]
    fn update_keeps_code_immutable() {
        let stored = Domain {
            id: Some("1".into()),
            ..valid_domain()
        };
        let mut changed = stored.clone();
        changed.code = "OTHER".into();
        assert_eq!(
            codes(validate_domain_update(&changed, &stored, &known()).unwrap_err()),
            vec!["domain.code.immutable"]
        );
        assert!(validate_domain_update(&stored, &stored, &known()).is_ok());
    }

    #[test]
    fn key_message_rules() {
        let domain = valid_domain();
        let ok = KeyMessage {
            id: None,
            domain_id: "1".into(),
            key: "test.one".into(),
            language_tag: tag("fr"),
            content: "Test un".into(),
        };
        assert!(validate_key_message(&ok, &domain).is_ok());

        let bad = KeyMessage {
            key: "  ".into(),
            content: String::new(),
            language_tag: tag("zh"),
            ..ok
        };
        assert_eq!(
            codes(validate_key_message(&bad, &domain).unwrap_err()),
            vec![
                "keyMessage.key.required",
                "keyMessage.content.required",
                "keyMessage.languageTag.unsupported",
            ]
        );
    }

    #[test]
    fn language_labels_are_required() {
        let lang = Language {
            code: tag("it"),
            label: "".into(),
            english_label: " ".into(),
        };
        assert_eq!(
            codes(validate_language(&lang).unwrap_err()),
            vec!["language.label.required", "language.englishLabel.required"]
        );
    }
}
