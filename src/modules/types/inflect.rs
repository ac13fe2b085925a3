//! English pluralization for default resource names

/// Words whose plural does not follow a suffix rule
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("ox", "oxen"),
];

/// Words that are the same in singular and plural
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
    "data",
    "metadata",
];

/// Pluralize a collection name (`user` → `users`, `company` → `companies`)
///
/// Only the last word of a `snake_case`, `kebab-case` or `camelCase` name is
/// inflected. Names that already look plural are returned unchanged.
pub fn pluralize(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let split = last_word_start(name);
    let (head, word) = name.split_at(split);
    format!("{}{}", head, pluralize_word(word))
}

fn last_word_start(name: &str) -> usize {
    let mut start = 0;
    let mut prev_lower = false;
    for (i, c) in name.char_indices() {
        if c == '_' || c == '-' {
            start = i + c.len_utf8();
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            start = i;
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
    }
    start
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if lower == *singular {
            return match_case(word, plural);
        }
        if lower == *plural {
            return word.to_string();
        }
    }

    if lower.ends_with("ss") || lower.ends_with("sh") || lower.ends_with("ch") {
        return format!("{}es", word);
    }
    if lower.ends_with('x') || lower.ends_with('z') || lower.ends_with("us") {
        return format!("{}es", word);
    }
    if lower.ends_with('s') {
        // Already plural (`users`, `statuses`)
        return word.to_string();
    }
    if lower.ends_with('y') && !ends_with_vowel_y(&lower) {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if lower.ends_with("fe") {
        return format!("{}ves", &word[..word.len() - 2]);
    }
    if lower.ends_with('f') && !lower.ends_with("ff") && !lower.ends_with("oof") {
        return format!("{}ves", &word[..word.len() - 1]);
    }

    format!("{}s", word)
}

fn ends_with_vowel_y(lower: &str) -> bool {
    let mut chars = lower.chars().rev();
    chars.next();
    matches!(chars.next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}

fn match_case(original: &str, replacement: &str) -> String {
    match original.chars().next() {
        Some(c) if c.is_uppercase() => {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => replacement.to_string(),
    }
}
