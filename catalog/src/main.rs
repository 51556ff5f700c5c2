use std::env;
use std::process;
use std::sync::Arc;

use catalog::adapters::memory_repo::{
    InMemoryDomainRepo, InMemoryKeyMessageRepo, InMemoryLanguageRepo,
};
use catalog::id::SequentialIdGenerator;
use catalog::service::{DomainService, KeyMessageService, LanguageService};
use catalog::{CoreError, LanguageTag};

fn print_usage() {
    eprintln!(
        "{}\n\nUsage:\n  catalog list\n  catalog show <domain-id>\n  catalog messages <domain-id> <language-tag> [--key <key>] [--content <text>]\n  catalog tags\n\nNotes:\n  - This demo CLI reads the seeded in-memory store; nothing is persisted.",
        catalog::about()
    );
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1);

    let Some(cmd) = args.next() else {
        print_usage();
        return Ok(());
    };

    let domains = Arc::new(InMemoryDomainRepo::with_demo_data());
    let messages = Arc::new(InMemoryKeyMessageRepo::with_demo_data());
    let languages = Arc::new(InMemoryLanguageRepo::with_demo_data());
    let ids = Arc::new(SequentialIdGenerator::starting_at(100));

    match cmd.as_str() {
        "list" => {
            let svc = DomainService::new(domains, messages, languages, ids);
            let all = svc.get_domains().map_err(|e| format!("list failed: {}", e))?;
            for d in all {
                println!(
                    "{}\t{}\t{}",
                    d.id.unwrap_or_default(),
                    d.code,
                    d.description
                );
            }
            Ok(())
        }
        "show" => {
            let Some(id) = args.next() else {
                return Err("missing <domain-id> for show".into());
            };
            let svc = DomainService::new(domains, messages, languages, ids);
            let d = match svc.get_domain(&id) {
                Ok(d) => d,
                Err(CoreError::NotFound) => return Err("not found".into()),
                Err(e) => return Err(format!("show failed: {}", e)),
            };
            let supported: Vec<&str> = d
                .supported_language_tags
                .iter()
                .map(LanguageTag::as_str)
                .collect();
            println!("code:        {}", d.code);
            println!("description: {}", d.description);
            println!(
                "default:     {}",
                d.default_language_tag
                    .as_ref()
                    .map(LanguageTag::as_str)
                    .unwrap_or("-")
            );
            println!("supported:   {}", supported.join(", "));
            Ok(())
        }
        "messages" => {
            let (Some(domain_id), Some(tag)) = (args.next(), args.next()) else {
                return Err("messages requires <domain-id> <language-tag>".into());
            };
            let tag = LanguageTag::new(tag).map_err(|e| e.to_string())?;

            // Parse simple flags: --key <val>, --content <val>
            let mut key: Option<String> = None;
            let mut content: Option<String> = None;
            let rest: Vec<String> = args.collect();
            let mut i = 0;
            while i < rest.len() {
                let slot = match rest[i].as_str() {
                    "--key" => &mut key,
                    "--content" => &mut content,
                    unk => return Err(format!("unknown argument: {}", unk)),
                };
                let Some(val) = rest.get(i + 1) else {
                    return Err(format!("{} requires a value", rest[i]));
                };
                *slot = Some(val.clone());
                i += 2;
            }

            let svc = KeyMessageService::new(domains, messages, ids);
            let found = match svc.find_messages(&domain_id, &tag, key.as_deref(), content.as_deref())
            {
                Ok(found) => found,
                Err(CoreError::NotFound) => return Err("domain not found".into()),
                Err(e) => return Err(format!("messages failed: {}", e)),
            };
            for m in found {
                println!("{}\t{}", m.key, m.content);
            }
            Ok(())
        }
        "tags" => {
            let svc = LanguageService::new(domains, languages);
            let all = svc
                .find_languages()
                .map_err(|e| format!("tags failed: {}", e))?;
            for l in all {
                println!("{}\t{}\t{}", l.code, l.label, l.english_label);
            }
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn main() {
    if let Err(msg) = run() {
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}
