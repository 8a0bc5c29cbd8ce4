//! search::normalize
//!
//! The one normalization used for fuzzy matching, by both the resolver and
//! the select-prompt filter.
//!
//! Normalizing trims, lowercases, folds accented Latin letters to ASCII,
//! drops the characters `[](){}.^\-`, and collapses runs of whitespace to a
//! single space.

/// Characters removed before comparing.
const DROPPED: &[char] = &['[', ']', '(', ')', '{', '}', '.', '^', '\\', '-'];

fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' | 'ĉ' | 'ċ' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' | 'ĝ' | 'ġ' | 'ģ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ķ' => "k",
        'ł' | 'ľ' | 'ĺ' | 'ļ' => "l",
        'ñ' | 'ń' | 'ň' | 'ņ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' | 'ŕ' => "r",
        'ś' | 'š' | 'ş' | 'ș' => "s",
        'ß' => "ss",
        'ť' | 'ţ' | 'ț' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Normalize `input` for comparison.
///
/// ```
/// use clockify_cli::search::normalize;
///
/// assert_eq!(normalize("  Ação   [Interna] "), "acao interna");
/// assert_eq!(normalize("front-end.app"), "frontendapp");
/// ```
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.trim().chars().flat_map(char::to_lowercase) {
        if DROPPED.contains(&c) {
            continue;
        }
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        match fold(c) {
            Some(ascii) => out.push_str(ascii),
            // Combining marks left over from decomposed input.
            None if ('\u{0300}'..='\u{036f}').contains(&c) => {}
            None => out.push(c),
        }
    }
    out
}

/// True when every whitespace-separated term of the normalized `query`
/// occurs in the normalized `name`, in any order.
pub fn is_similar(normalized_query: &str, normalized_name: &str) -> bool {
    normalized_query
        .split(' ')
        .filter(|t| !t.is_empty())
        .all(|term| normalized_name.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize("  Coderockr  "), "coderockr");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("a \t  b\n c"), "a b c");
    }

    #[test]
    fn drops_punctuation_set() {
        assert_eq!(normalize("[cli] (v2) {x}.^\\-y"), "cli v2 xy");
    }

    #[test]
    fn folds_accents() {
        assert_eq!(normalize("Éléphant Çà Straße"), "elephant ca strasse");
        assert_eq!(normalize("e\u{0301}t\u{0301}e"), "ete");
    }

    #[test]
    fn only_dropped_chars_is_empty() {
        assert_eq!(normalize(" [ ] - "), "");
    }

    #[test]
    fn similar_is_order_independent() {
        let name = normalize("Clockify CLI | Coderockr");
        assert!(is_similar(&normalize("coderockr cli"), &name));
        assert!(is_similar(&normalize("cli"), &name));
        assert!(!is_similar(&normalize("cli other"), &name));
    }
}
