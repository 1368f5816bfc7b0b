//! Section-wise merge of partial compose documents.
//!
//! Collision policy for a name present in both documents:
//! - both entries are mappings: merged field by field
//! - the new entry is null: the existing entry is kept
//! - otherwise the new entry replaces the old one
//!
//! Field collisions inside a merged entry:
//! - two sequences are unioned, existing items first
//! - two mappings are merged one level deep, new keys winning
//! - anything else takes the new value

use crate::templates::SECTIONS;
use serde_yaml::{Mapping, Value};

/// Merges `documents` in order. Only sections that some document contributes
/// appear in the result, always in `services`, `volumes`, `networks` order.
pub fn merge_documents<'a>(documents: impl IntoIterator<Item = &'a Mapping>) -> Mapping {
    let mut sections: Vec<(&str, Option<Mapping>)> =
        SECTIONS.iter().map(|name| (*name, None)).collect();

    for document in documents {
        for (name, merged) in sections.iter_mut() {
            let Some(section) = document.get(*name) else {
                continue;
            };
            let target = merged.get_or_insert_with(Mapping::new);
            if let Value::Mapping(entries) = section {
                merge_section(target, entries);
            }
        }
    }

    sections
        .into_iter()
        .filter_map(|(name, merged)| merged.map(|m| (Value::from(name), Value::Mapping(m))))
        .collect()
}

/// Merges named entries (services, volumes, networks) of one section.
pub fn merge_section(target: &mut Mapping, incoming: &Mapping) {
    for (name, entry) in incoming {
        match target.get_mut(name) {
            Some(existing) => merge_entry(existing, entry),
            None => {
                target.insert(name.clone(), entry.clone());
            }
        }
    }
}

fn merge_entry(existing: &mut Value, incoming: &Value) {
    match (existing, incoming) {
        (Value::Mapping(current), Value::Mapping(new)) => {
            for (field, value) in new {
                match current.get_mut(field) {
                    Some(old) => merge_field(old, value),
                    None => {
                        current.insert(field.clone(), value.clone());
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (existing, incoming) => *existing = incoming.clone(),
    }
}

fn merge_field(existing: &mut Value, incoming: &Value) {
    match (existing, incoming) {
        (Value::Sequence(current), Value::Sequence(new)) => {
            for item in new {
                if !current.contains(item) {
                    current.push(item.clone());
                }
            }
        }
        (Value::Mapping(current), Value::Mapping(new)) => {
            for (key, value) in new {
                current.insert(key.clone(), value.clone());
            }
        }
        (existing, incoming) => *existing = incoming.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(source: &str) -> Mapping {
        serde_yaml::from_str(source).unwrap()
    }

    #[test]
    fn test_disjoint_services_keep_order() {
        let merged = merge_documents([
            &yaml("services:\n  app:\n    image: node:20\n"),
            &yaml("services:\n  db:\n    image: postgres:16\nvolumes:\n  pgdata:\n"),
        ]);

        assert_eq!(
            merged,
            yaml("services:\n  app:\n    image: node:20\n  db:\n    image: postgres:16\nvolumes:\n  pgdata:\n")
        );
    }

    #[test]
    fn test_only_contributed_sections() {
        let merged = merge_documents([&yaml("services:\n  app:\n    image: x:1\n")]);

        let keys: Vec<&str> = merged.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["services"]);
    }

    #[test]
    fn test_section_order_is_canonical() {
        let merged = merge_documents([
            &yaml("services:\n  app:\n    image: a:1\nnetworks:\n  backend:\n"),
            &yaml("services:\n  db:\n    image: b:1\nvolumes:\n  data:\n"),
        ]);

        let keys: Vec<&str> = merged.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["services", "volumes", "networks"]);
    }

    #[test]
    fn test_scalar_collision_new_wins() {
        let merged = merge_documents([
            &yaml("services:\n  app:\n    image: node:20\n    command: npm start\n"),
            &yaml("services:\n  app:\n    image: python:3.12\n"),
        ]);

        assert_eq!(
            merged,
            yaml("services:\n  app:\n    image: python:3.12\n    command: npm start\n")
        );
    }

    #[test]
    fn test_sequences_are_unioned() {
        let merged = merge_documents([
            &yaml("services:\n  app:\n    volumes:\n      - .:/app\n    environment:\n      - NODE_ENV=development\n"),
            &yaml("services:\n  app:\n    volumes:\n      - .:/app\n      - pip-cache:/root/.cache/pip\n    environment:\n      - PYTHONUNBUFFERED=1\n"),
        ]);

        assert_eq!(
            merged,
            yaml(
                "services:\n  app:\n    volumes:\n      - .:/app\n      - pip-cache:/root/.cache/pip\n    environment:\n      - NODE_ENV=development\n      - PYTHONUNBUFFERED=1\n"
            )
        );
    }

    #[test]
    fn test_mappings_merge_one_level() {
        let merged = merge_documents([
            &yaml("services:\n  db:\n    environment:\n      POSTGRES_USER: postgres\n      POSTGRES_PASSWORD: postgres\n"),
            &yaml("services:\n  db:\n    environment:\n      MYSQL_ROOT_PASSWORD: root\n      POSTGRES_PASSWORD: secret\n"),
        ]);

        assert_eq!(
            merged,
            yaml("services:\n  db:\n    environment:\n      POSTGRES_USER: postgres\n      POSTGRES_PASSWORD: secret\n      MYSQL_ROOT_PASSWORD: root\n")
        );
    }

    #[test]
    fn test_mixed_shapes_take_new_value() {
        let merged = merge_documents([
            &yaml("services:\n  db:\n    environment:\n      - A=1\n"),
            &yaml("services:\n  db:\n    environment:\n      B: 2\n"),
        ]);

        assert_eq!(merged, yaml("services:\n  db:\n    environment:\n      B: 2\n"));
    }

    #[test]
    fn test_null_volume_keeps_existing_definition() {
        let merged = merge_documents([
            &yaml("services:\n  a:\n    image: a:1\nvolumes:\n  data:\n    driver: local\n"),
            &yaml("services:\n  b:\n    image: b:1\nvolumes:\n  data:\n"),
        ]);

        assert_eq!(
            merged.get("volumes"),
            Some(&Value::Mapping(yaml("data:\n  driver: local\n")))
        );
    }

    #[test]
    fn test_merging_same_document_twice_is_stable() {
        let doc = yaml("services:\n  app:\n    image: node:20\n    ports:\n      - \"3000:3000\"\nvolumes:\n  cache:\n");

        assert_eq!(merge_documents([&doc, &doc]), merge_documents([&doc]));
    }
}
