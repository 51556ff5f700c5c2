//! sqlite-adapter: SQLite implementation of the catalog repository ports.
//!
//! Purpose
//! - Persist domains, key messages and the language catalog in a single file
//!   so the API server survives restarts without external services.
//! - Implements `DomainRepository`, `KeyMessageRepository` and
//!   `LanguageRepository` from the `catalog` crate on one connection.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Supported tags of a domain live in `domain_language_tags`; `position`
//!   keeps their order.
//! - Languages are listed in insertion (rowid) order.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use catalog::adapters::memory_repo::{demo_domains, demo_key_messages, demo_languages};
use catalog::{
    CoreError, Domain, DomainRepository, KeyMessage, KeyMessageRepository, Language,
    LanguageRepository, LanguageTag, MessageQuery,
};
use rusqlite::{params, Connection, OptionalExtension};

/// SQLite-backed repository for all catalog data.
pub struct SqliteRepo {
    conn: Mutex<Connection>,
}

impl SqliteRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Like [`SqliteRepo::new`], creating missing parent directories first.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| CoreError::Repository(format!("cannot create {}: {e}", dir.display())))?;
        }
        Self::new(path)
    }

    /// Load the demo domain, its messages and the default language catalog
    /// into an empty database. Returns `false` when data was already present.
    pub fn seed_demo_data(&self) -> Result<bool, CoreError> {
        {
            let conn = self.lock()?;
            let existing: i64 = conn
                .query_row(
                    "SELECT (SELECT COUNT(*) FROM domains) + (SELECT COUNT(*) FROM languages)",
                    [],
                    |row| row.get(0),
                )
                .map_err(map_sqerr)?;
            if existing > 0 {
                return Ok(false);
            }
        }
        for language in demo_languages() {
            LanguageRepository::insert(self, language)?;
        }
        for domain in demo_domains() {
            DomainRepository::insert(self, domain)?;
        }
        for message in demo_key_messages() {
            KeyMessageRepository::insert(self, message)?;
        }
        Ok(true)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS domains (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            default_language_tag TEXT
        );
        CREATE TABLE IF NOT EXISTS domain_language_tags (
            domain_id TEXT NOT NULL,
            language_tag TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (domain_id, language_tag)
        );
        CREATE INDEX IF NOT EXISTS idx_domain_language_tags_tag ON domain_language_tags(language_tag);
        CREATE TABLE IF NOT EXISTS key_messages (
            id TEXT PRIMARY KEY,
            domain_id TEXT NOT NULL,
            message_key TEXT NOT NULL,
            language_tag TEXT NOT NULL,
            content TEXT NOT NULL,
            UNIQUE (domain_id, message_key, language_tag)
        );
        CREATE INDEX IF NOT EXISTS idx_key_messages_lookup ON key_messages(domain_id, language_tag);
        CREATE TABLE IF NOT EXISTS languages (
            code TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            english_label TEXT NOT NULL
        );
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

/// Unique and primary key violations surface as `AlreadyExists`.
fn map_write_err(e: rusqlite::Error) -> CoreError {
    if let rusqlite::Error::SqliteFailure(err, _) = &e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            return CoreError::AlreadyExists;
        }
    }
    map_sqerr(e)
}

fn stored_tag(s: String) -> Result<LanguageTag, CoreError> {
    LanguageTag::new(s).map_err(|e| CoreError::Repository(format!("bad language tag in db: {e}")))
}

fn require_id(id: &Option<String>) -> Result<&str, CoreError> {
    id.as_deref()
        .ok_or_else(|| CoreError::Repository("record has no id".into()))
}

// ============ Domains ============

const DOMAIN_COLUMNS: &str = "id, code, description, default_language_tag";

type DomainRow = (String, String, String, Option<String>);

fn read_domain_row(row: &rusqlite::Row) -> rusqlite::Result<DomainRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn load_supported_tags(conn: &Connection, domain_id: &str) -> Result<Vec<LanguageTag>, CoreError> {
    let mut stmt = conn
        .prepare(
            "SELECT language_tag FROM domain_language_tags WHERE domain_id = ?1 ORDER BY position",
        )
        .map_err(map_sqerr)?;
    let mut rows = stmt.query(params![domain_id]).map_err(map_sqerr)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(map_sqerr)? {
        out.push(stored_tag(row.get(0).map_err(map_sqerr)?)?);
    }
    Ok(out)
}

fn build_domain(conn: &Connection, row: DomainRow) -> Result<Domain, CoreError> {
    let (id, code, description, default_tag) = row;
    let supported_language_tags = load_supported_tags(conn, &id)?;
    Ok(Domain {
        id: Some(id),
        code,
        description,
        default_language_tag: default_tag.map(stored_tag).transpose()?,
        supported_language_tags,
    })
}

fn query_domains(
    conn: &Connection,
    filter: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Domain>, CoreError> {
    let sql = format!("SELECT {DOMAIN_COLUMNS} FROM domains {filter}");
    let mut stmt = conn.prepare(&sql).map_err(map_sqerr)?;
    let raw = stmt
        .query_map(args, read_domain_row)
        .map_err(map_sqerr)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_sqerr)?;
    raw.into_iter().map(|r| build_domain(conn, r)).collect()
}

fn write_supported_tags(conn: &Connection, domain: &Domain, id: &str) -> Result<(), CoreError> {
    conn.execute(
        "DELETE FROM domain_language_tags WHERE domain_id = ?1",
        params![id],
    )
    .map_err(map_sqerr)?;
    for (pos, tag) in domain.supported_language_tags.iter().enumerate() {
        conn.execute(
            "INSERT INTO domain_language_tags(domain_id, language_tag, position) VALUES (?1, ?2, ?3)",
            params![id, tag.as_str(), pos as i64],
        )
        .map_err(map_write_err)?;
    }
    Ok(())
}

impl DomainRepository for SqliteRepo {
    fn get(&self, id: &str) -> Result<Option<Domain>, CoreError> {
        let conn = self.lock()?;
        Ok(query_domains(&conn, "WHERE id = ?1", &[&id])?.pop())
    }

    fn find_by_code(&self, code: &str) -> Result<Option<Domain>, CoreError> {
        let conn = self.lock()?;
        Ok(query_domains(&conn, "WHERE code = ?1", &[&code])?.pop())
    }

    fn list(&self) -> Result<Vec<Domain>, CoreError> {
        let conn = self.lock()?;
        query_domains(&conn, "ORDER BY code", &[])
    }

    fn insert(&self, domain: Domain) -> Result<(), CoreError> {
        let id = require_id(&domain.id)?;
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        tx.execute(
            "INSERT INTO domains(id, code, description, default_language_tag) VALUES (?1, ?2, ?3, ?4)",
            params![
                id,
                domain.code,
                domain.description,
                domain.default_language_tag.as_ref().map(LanguageTag::as_str),
            ],
        )
        .map_err(map_write_err)?;
        write_supported_tags(&tx, &domain, id)?;
        tx.commit().map_err(map_sqerr)
    }

    fn update(&self, domain: &Domain) -> Result<(), CoreError> {
        let id = require_id(&domain.id)?;
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        let changed = tx
            .execute(
                "UPDATE domains SET code = ?2, description = ?3, default_language_tag = ?4 WHERE id = ?1",
                params![
                    id,
                    domain.code,
                    domain.description,
                    domain.default_language_tag.as_ref().map(LanguageTag::as_str),
                ],
            )
            .map_err(map_write_err)?;
        if changed == 0 {
            return Err(CoreError::NotFound);
        }
        write_supported_tags(&tx, domain, id)?;
        tx.commit().map_err(map_sqerr)
    }

    fn delete(&self, id: &str) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        tx.execute(
            "DELETE FROM domain_language_tags WHERE domain_id = ?1",
            params![id],
        )
        .map_err(map_sqerr)?;
        let removed = tx
            .execute("DELETE FROM domains WHERE id = ?1", params![id])
            .map_err(map_sqerr)?;
        if removed == 0 {
            return Err(CoreError::NotFound);
        }
        tx.commit().map_err(map_sqerr)
    }

    fn is_language_used(&self, tag: &LanguageTag) -> Result<bool, CoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM domains WHERE default_language_tag = ?1)
                OR EXISTS(SELECT 1 FROM domain_language_tags WHERE language_tag = ?1)",
            params![tag.as_str()],
            |row| row.get::<_, bool>(0),
        )
        .map_err(map_sqerr)
    }
}

// ============ Key messages ============

const MESSAGE_COLUMNS: &str = "id, domain_id, message_key, language_tag, content";

fn row_to_message(row: &rusqlite::Row) -> Result<KeyMessage, CoreError> {
    let id: String = row.get(0).map_err(map_sqerr)?;
    let domain_id: String = row.get(1).map_err(map_sqerr)?;
    let key: String = row.get(2).map_err(map_sqerr)?;
    let tag: String = row.get(3).map_err(map_sqerr)?;
    let content: String = row.get(4).map_err(map_sqerr)?;
    Ok(KeyMessage {
        id: Some(id),
        domain_id,
        key,
        language_tag: stored_tag(tag)?,
        content,
    })
}

fn query_messages(
    conn: &Connection,
    filter: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<KeyMessage>, CoreError> {
    let sql = format!("SELECT {MESSAGE_COLUMNS} FROM key_messages {filter}");
    let mut stmt = conn.prepare(&sql).map_err(map_sqerr)?;
    let mut rows = stmt.query(args).map_err(map_sqerr)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(map_sqerr)? {
        out.push(row_to_message(row)?);
    }
    Ok(out)
}

impl KeyMessageRepository for SqliteRepo {
    fn get(&self, id: &str) -> Result<Option<KeyMessage>, CoreError> {
        let conn = self.lock()?;
        Ok(query_messages(&conn, "WHERE id = ?1", &[&id])?.pop())
    }

    fn find(&self, query: &MessageQuery) -> Result<Vec<KeyMessage>, CoreError> {
        let conn = self.lock()?;
        let key = query.key.as_deref();
        let found = query_messages(
            &conn,
            "WHERE domain_id = ?1 AND language_tag = ?2 AND (?3 IS NULL OR message_key = ?3)
             ORDER BY message_key, id",
            &[&query.domain_id, &query.language_tag.as_str(), &key],
        )?;
        // Content matching stays in Rust so case folding covers non-ASCII text.
        Ok(found.into_iter().filter(|m| query.matches(m)).collect())
    }

    fn find_one(
        &self,
        domain_id: &str,
        key: &str,
        language_tag: &LanguageTag,
    ) -> Result<Option<KeyMessage>, CoreError> {
        let conn = self.lock()?;
        Ok(query_messages(
            &conn,
            "WHERE domain_id = ?1 AND message_key = ?2 AND language_tag = ?3",
            &[&domain_id, &key, &language_tag.as_str()],
        )?
        .pop())
    }

    fn insert(&self, message: KeyMessage) -> Result<(), CoreError> {
        let id = require_id(&message.id)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO key_messages(id, domain_id, message_key, language_tag, content) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                message.domain_id,
                message.key,
                message.language_tag.as_str(),
                message.content,
            ],
        )
        .map_err(map_write_err)?;
        Ok(())
    }

    fn update(&self, message: &KeyMessage) -> Result<(), CoreError> {
        let id = require_id(&message.id)?;
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE key_messages SET domain_id = ?2, message_key = ?3, language_tag = ?4, content = ?5 WHERE id = ?1",
                params![
                    id,
                    message.domain_id,
                    message.key,
                    message.language_tag.as_str(),
                    message.content,
                ],
            )
            .map_err(map_write_err)?;
        if changed == 0 {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM key_messages WHERE id = ?1", params![id])
            .map_err(map_sqerr)?;
        if removed == 0 {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }

    fn delete_by_domain(&self, domain_id: &str) -> Result<usize, CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM key_messages WHERE domain_id = ?1",
            params![domain_id],
        )
        .map_err(map_sqerr)
    }
}

// ============ Languages ============

fn row_to_language(row: &rusqlite::Row) -> Result<Language, CoreError> {
    let code: String = row.get(0).map_err(map_sqerr)?;
    let label: String = row.get(1).map_err(map_sqerr)?;
    let english_label: String = row.get(2).map_err(map_sqerr)?;
    Ok(Language {
        code: stored_tag(code)?,
        label,
        english_label,
    })
}

impl LanguageRepository for SqliteRepo {
    fn list(&self) -> Result<Vec<Language>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT code, label, english_label FROM languages ORDER BY rowid")
            .map_err(map_sqerr)?;
        let mut rows = stmt.query([]).map_err(map_sqerr)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(map_sqerr)? {
            out.push(row_to_language(row)?);
        }
        Ok(out)
    }

    fn get(&self, code: &LanguageTag) -> Result<Option<Language>, CoreError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT code, label, english_label FROM languages WHERE code = ?1",
                params![code.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(map_sqerr)?;
        raw.map(|(code, label, english_label)| {
            Ok(Language {
                code: stored_tag(code)?,
                label,
                english_label,
            })
        })
        .transpose()
    }

    fn insert(&self, language: Language) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO languages(code, label, english_label) VALUES (?1, ?2, ?3)",
            params![
                language.code.as_str(),
                language.label,
                language.english_label
            ],
        )
        .map_err(map_write_err)?;
        Ok(())
    }

    fn delete(&self, code: &LanguageTag) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let removed = conn
            .execute("DELETE FROM languages WHERE code = ?1", params![code.as_str()])
            .map_err(map_sqerr)?;
        if removed == 0 {
            return Err(CoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_db() -> (SqliteRepo, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let repo = SqliteRepo::new(path).unwrap();
        (repo, dir)
    }

    fn tag(s: &str) -> LanguageTag {
        LanguageTag::new(s).unwrap()
    }

    fn domain(id: &str, code: &str) -> Domain {
        Domain {
            id: Some(id.into()),
            code: code.into(),
            description: format!("{code} domain"),
            default_language_tag: Some(tag("fr")),
            supported_language_tags: vec![tag("fr"), tag("en"), tag("zh-Hant")],
        }
    }

    fn message(id: &str, key: &str, lang: &str, content: &str) -> KeyMessage {
        KeyMessage {
            id: Some(id.into()),
            domain_id: "d1".into(),
            key: key.into(),
            language_tag: tag(lang),
            content: content.into(),
        }
    }

    #[test]
    fn open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.db");
        let repo = SqliteRepo::open(&path).unwrap();
        assert!(path.exists());
        assert!(DomainRepository::list(&repo).unwrap().is_empty());
    }

    #[test]
    fn domain_insert_get_keeps_tag_order() {
        let (repo, _dir) = tmp_db();
        let d = domain("d1", "APP");
        DomainRepository::insert(&repo, d.clone()).unwrap();
        assert_eq!(DomainRepository::get(&repo, "d1").unwrap(), Some(d.clone()));
        assert_eq!(repo.find_by_code("APP").unwrap(), Some(d));
        assert_eq!(DomainRepository::get(&repo, "nope").unwrap(), None);
    }

    #[test]
    fn domain_duplicate_code_conflicts() {
        let (repo, _dir) = tmp_db();
        DomainRepository::insert(&repo, domain("d1", "APP")).unwrap();
        let err = DomainRepository::insert(&repo, domain("d2", "APP")).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));
    }

    #[test]
    fn domain_update_replaces_tags_and_list_orders_by_code() {
        let (repo, _dir) = tmp_db();
        DomainRepository::insert(&repo, domain("d1", "ZETA")).unwrap();
        DomainRepository::insert(&repo, domain("d2", "ALPHA")).unwrap();

        let mut d = domain("d1", "ZETA");
        d.supported_language_tags = vec![tag("de")];
        d.default_language_tag = Some(tag("de"));
        DomainRepository::update(&repo, &d).unwrap();
        assert_eq!(DomainRepository::get(&repo, "d1").unwrap(), Some(d));

        let codes: Vec<_> = DomainRepository::list(&repo)
            .unwrap()
            .into_iter()
            .map(|d| d.code)
            .collect();
        assert_eq!(codes, vec!["ALPHA", "ZETA"]);

        assert!(matches!(
            DomainRepository::update(&repo, &domain("d9", "NINE")),
            Err(CoreError::NotFound)
        ));
    }

    #[test]
    fn language_usage_and_domain_delete() {
        let (repo, _dir) = tmp_db();
        DomainRepository::insert(&repo, domain("d1", "APP")).unwrap();
        assert!(repo.is_language_used(&tag("zh-Hant")).unwrap());
        assert!(!repo.is_language_used(&tag("de")).unwrap());

        DomainRepository::delete(&repo, "d1").unwrap();
        assert!(!repo.is_language_used(&tag("fr")).unwrap());
        assert!(matches!(
            DomainRepository::delete(&repo, "d1"),
            Err(CoreError::NotFound)
        ));
    }

    #[test]
    fn message_find_filters_and_orders() {
        let (repo, _dir) = tmp_db();
        KeyMessageRepository::insert(&repo, message("m2", "b.key", "en", "Second Über")).unwrap();
        KeyMessageRepository::insert(&repo, message("m1", "a.key", "en", "First")).unwrap();
        KeyMessageRepository::insert(&repo, message("m3", "a.key", "fr", "Premier")).unwrap();

        let en = MessageQuery::new("d1", tag("en"));
        let keys: Vec<_> = repo
            .find(&en)
            .unwrap()
            .into_iter()
            .map(|m| m.key)
            .collect();
        assert_eq!(keys, vec!["a.key", "b.key"]);

        let by_key = repo.find(&en.clone().with_key("b.key")).unwrap();
        assert_eq!(by_key.len(), 1);
        let by_content = repo.find(&en.with_content("über")).unwrap();
        assert_eq!(by_content[0].id.as_deref(), Some("m2"));

        let one = repo.find_one("d1", "a.key", &tag("fr")).unwrap().unwrap();
        assert_eq!(one.content, "Premier");
    }

    #[test]
    fn message_unique_per_domain_key_and_language() {
        let (repo, _dir) = tmp_db();
        KeyMessageRepository::insert(&repo, message("m1", "a.key", "en", "First")).unwrap();
        let err =
            KeyMessageRepository::insert(&repo, message("m2", "a.key", "en", "Again")).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));

        let mut edited = message("m1", "a.key", "en", "Edited");
        KeyMessageRepository::update(&repo, &edited).unwrap();
        assert_eq!(
            KeyMessageRepository::get(&repo, "m1").unwrap().unwrap().content,
            "Edited"
        );
        edited.id = Some("zz".into());
        assert!(matches!(
            KeyMessageRepository::update(&repo, &edited),
            Err(CoreError::NotFound)
        ));
        assert_eq!(repo.delete_by_domain("d1").unwrap(), 1);
    }

    #[test]
    fn languages_keep_insertion_order() {
        let (repo, _dir) = tmp_db();
        for (code, label) in [("fr", "Français"), ("de", "Deutsch"), ("en", "English")] {
            LanguageRepository::insert(
                &repo,
                Language {
                    code: tag(code),
                    label: label.into(),
                    english_label: label.into(),
                },
            )
            .unwrap();
        }
        let codes: Vec<_> = LanguageRepository::list(&repo)
            .unwrap()
            .into_iter()
            .map(|l| l.code.to_string())
            .collect();
        assert_eq!(codes, vec!["fr", "de", "en"]);
        assert_eq!(
            LanguageRepository::get(&repo, &tag("de")).unwrap().unwrap().label,
            "Deutsch"
        );
        LanguageRepository::delete(&repo, &tag("de")).unwrap();
        assert_eq!(LanguageRepository::get(&repo, &tag("de")).unwrap(), None);
        assert!(matches!(
            LanguageRepository::delete(&repo, &tag("de")),
            Err(CoreError::NotFound)
        ));
    }

    #[test]
    fn seeding_only_fills_an_empty_database() {
        let (repo, dir) = tmp_db();
        assert!(repo.seed_demo_data().unwrap());
        assert!(!repo.seed_demo_data().unwrap());
        assert_eq!(DomainRepository::list(&repo).unwrap().len(), 1);
        assert_eq!(LanguageRepository::list(&repo).unwrap().len(), 5);
        drop(repo);

        let reopened = SqliteRepo::open(dir.path().join("t.db")).unwrap();
        let msgs = reopened
            .find(&MessageQuery::new("1", tag("en")))
            .unwrap();
        assert_eq!(msgs.len(), 2);
    }
}
