/// Normalized identity key derivation.
///
/// Two listings referring to the same project must land on the same slug
/// regardless of source script: «Чайка» and "Chayka" both normalize to
/// `chayka`.

/// Generate a URL-friendly, transliteration-tolerant slug from a title.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut prev_dash = true;
    for ch in title.chars() {
        let lower = ch.to_lowercase().next().unwrap_or(ch);
        match transliterate(lower) {
            Some(part) => {
                out.push_str(part);
                prev_dash = false;
            }
            None => {
                if lower.is_ascii_alphanumeric() {
                    out.push(lower);
                    prev_dash = false;
                } else if !prev_dash {
                    out.push('-');
                    prev_dash = true;
                }
            }
        }
    }
    out.trim_matches('-').to_string()
}

/// Latin rendering of a lowercase Cyrillic letter, or None for anything else.
fn transliterate(ch: char) -> Option<&'static str> {
    let s = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'э' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_latin() {
        assert_eq!(slugify("Breeze Apart Hotel"), "breeze-apart-hotel");
        assert_eq!(slugify("  The Grand, Sochi! "), "the-grand-sochi");
    }

    #[test]
    fn test_slugify_cyrillic() {
        assert_eq!(slugify("Морская Резиденция"), "morskaya-rezidentsiya");
        assert_eq!(slugify("ЖК «Чайка»"), "zhk-chayka");
    }

    #[test]
    fn test_slugify_mixed_punctuation() {
        assert_eq!(slugify("Апарт-отель \"Юг\""), "apart-otel-yug");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_same_project_different_scripts() {
        assert_eq!(slugify("Чайка"), slugify("Chayka"));
    }
}
