use std::collections::HashMap;

pub const UNDETERMINED: &str = "und";

const STOP_WORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &["the", "and", "is", "of", "to", "in", "for", "with", "on", "this", "that", "you", "are"],
    ),
    (
        "es",
        &["el", "la", "los", "las", "y", "es", "de", "del", "en", "para", "con", "por", "una"],
    ),
    (
        "fr",
        &["le", "la", "les", "et", "est", "de", "des", "du", "en", "pour", "avec", "une", "sur"],
    ),
    (
        "de",
        &["der", "die", "das", "und", "ist", "von", "zu", "mit", "für", "auf", "ein", "eine", "nicht"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Script {
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Devanagari,
    Thai,
    Hangul,
    Kana,
    Han,
}

impl Script {
    fn of(c: char) -> Option<Self> {
        let script = match c as u32 {
            0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F => Script::Latin,
            0x0370..=0x03FF => Script::Greek,
            0x0400..=0x04FF => Script::Cyrillic,
            0x0590..=0x05FF => Script::Hebrew,
            0x0600..=0x06FF => Script::Arabic,
            0x0900..=0x097F => Script::Devanagari,
            0x0E00..=0x0E7F => Script::Thai,
            0x1100..=0x11FF | 0xAC00..=0xD7AF => Script::Hangul,
            0x3040..=0x30FF => Script::Kana,
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => Script::Han,
            _ => return None,
        };
        Some(script)
    }

    fn language(&self) -> Option<&'static str> {
        match self {
            Script::Latin => None,
            Script::Cyrillic => Some("ru"),
            Script::Greek => Some("el"),
            Script::Arabic => Some("ar"),
            Script::Hebrew => Some("he"),
            Script::Devanagari => Some("hi"),
            Script::Thai => Some("th"),
            Script::Hangul => Some("ko"),
            Script::Kana => Some("ja"),
            Script::Han => Some("zh"),
        }
    }
}

/// Best-effort ISO 639-1 code for a text block, `und` when nothing stands out
pub fn detect_language(text: &str) -> &'static str {
    let mut scripts: HashMap<Script, usize> = HashMap::new();
    for script in text.chars().filter_map(Script::of) {
        *scripts.entry(script).or_insert(0) += 1;
    }

    // Any kana marks Japanese even when Han characters dominate
    if scripts.contains_key(&Script::Kana) {
        return "ja";
    }

    let dominant = scripts
        .into_iter()
        .max_by_key(|&(script, count)| (count, std::cmp::Reverse(script as u8)))
        .map(|(script, _)| script);

    match dominant {
        None => UNDETERMINED,
        Some(Script::Latin) => detect_latin(text),
        Some(script) => script.language().unwrap_or(UNDETERMINED),
    }
}

fn detect_latin(text: &str) -> &'static str {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut best: Option<(&'static str, usize)> = None;
    let mut tied = false;
    for (language, stop_words) in STOP_WORDS {
        let hits = words
            .iter()
            .filter(|w| stop_words.iter().any(|s| s == w))
            .count();
        if hits == 0 {
            continue;
        }
        match best {
            Some((_, top)) if hits < top => {}
            Some((_, top)) if hits == top => tied = true,
            _ => {
                best = Some((*language, hits));
                tied = false;
            }
        }
    }

    match best {
        Some((language, _)) if !tied => language,
        _ => UNDETERMINED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_latin_languages_from_stop_words() {
        assert_eq!(detect_language("The best coffee in the city"), "en");
        assert_eq!(detect_language("La mejor oferta para los clientes"), "es");
        assert_eq!(detect_language("Les prix sont bas pour une semaine"), "fr");
        assert_eq!(detect_language("Das ist nicht der Weg"), "de");
    }

    #[test]
    fn detects_non_latin_scripts() {
        assert_eq!(detect_language("Добро пожаловать"), "ru");
        assert_eq!(detect_language("東京タワー"), "ja");
        assert_eq!(detect_language("北京欢迎你"), "zh");
        assert_eq!(detect_language("안녕하세요"), "ko");
        assert_eq!(detect_language("مرحبا"), "ar");
    }

    #[test]
    fn short_or_ambiguous_text_is_undetermined() {
        assert_eq!(detect_language("SALE 50%"), UNDETERMINED);
        assert_eq!(detect_language("1234"), UNDETERMINED);
        assert_eq!(detect_language(""), UNDETERMINED);
    }
}
