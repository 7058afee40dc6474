//! Resource name → model name inference (`project_tasks` → `ProjectTask`).

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "news",
    "metadata",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("oxen", "ox"),
    ("movies", "movie"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("lives", "life"),
    ("shoes", "shoe"),
    ("statuses", "status"),
    ("aliases", "alias"),
    ("buses", "bus"),
    ("viruses", "virus"),
];

/// Ordered suffix rules; the first match wins.
const SUFFIXES: &[(&str, &str)] = &[
    ("ies", "y"),
    ("sses", "ss"),
    ("shes", "sh"),
    ("ches", "ch"),
    ("xes", "x"),
    ("oes", "o"),
    ("lves", "lf"),
    ("ss", "ss"),
    ("us", "us"),
    ("s", ""),
];

/// Singular form of an English plural noun. Only the last `_`-separated
/// word is inflected.
pub fn singularize(word: &str) -> String {
    let (prefix, last) = match word.rfind('_') {
        Some(at) => word.split_at(at + 1),
        None => ("", word),
    };
    let lower = last.to_ascii_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == lower) {
        return format!("{prefix}{singular}");
    }
    for (suffix, replacement) in SUFFIXES {
        if lower.len() > suffix.len() && lower.ends_with(suffix) {
            let stem = &last[..last.len() - suffix.len()];
            return format!("{prefix}{stem}{replacement}");
        }
    }
    word.to_string()
}

/// `project_task` → `ProjectTask`.
pub fn camelize(word: &str) -> String {
    word.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Model name inferred from a pluralized resource name.
pub fn model_name(resource_name: &str) -> String {
    camelize(&singularize(resource_name))
}
