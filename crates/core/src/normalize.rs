use crate::lemmatizer::lemmatize;
use unicode_segmentation::UnicodeSegmentation;

/// English stopword list (NLTK corpus, 179 entries).
pub const ENGLISH_STOPWORDS: [&str; 179] = [
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

pub fn is_stopword(token: &str) -> bool {
    ENGLISH_STOPWORDS.contains(&token)
}

fn is_alphabetic_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Possessive clitics; word segmentation keeps them attached to the noun.
const POSSESSIVE_CLITICS: [&str; 2] = ["'s", "\u{2019}s"];

/// `engineer's` -> `engineer`. A segment that is only the clitic is returned as is.
fn strip_possessive(token: &str) -> &str {
    POSSESSIVE_CLITICS
        .iter()
        .find_map(|clitic| token.strip_suffix(clitic))
        .filter(|base| !base.is_empty())
        .unwrap_or(token)
}

/// Lower-cases, segments on Unicode word boundaries, keeps purely alphabetic
/// words, drops stopwords and lemmatizes what is left.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split_word_bounds()
        .map(strip_possessive)
        .filter(|token| is_alphabetic_token(token))
        .filter(|token| !is_stopword(token))
        .map(lemmatize)
        .collect()
}

/// Space-joined form of [`normalize`]; this is what the vectorizers analyse.
pub fn normalize_text(text: &str) -> String {
    normalize(text).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_and_punctuation_are_dropped() {
        let tokens = normalize("The Runners running!");
        assert!(!tokens.contains(&"the".to_string()));
        assert!(tokens.contains(&"runner".to_string()));
        assert!(tokens.contains(&"running".to_string()));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn numerals_and_mixed_tokens_are_dropped() {
        let tokens = normalize("Rust 2021 edition, v2 release 3.5");
        assert_eq!(tokens, vec!["rust", "edition", "release"]);
    }

    #[test]
    fn every_token_satisfies_the_normal_form() {
        let text = "Senior Engineers building Distributed Systems, APIs & databases in 2024!";
        for token in normalize(text) {
            assert_eq!(token, token.to_lowercase());
            assert!(token.chars().all(char::is_alphabetic));
            assert!(!is_stopword(&token));
        }
    }

    #[test]
    fn possessives_keep_their_noun() {
        assert_eq!(
            normalize("The engineer's company's products"),
            vec!["engineer", "company", "product"]
        );
        assert_eq!(normalize("The team\u{2019}s roadmaps"), vec!["team", "roadmap"]);
        assert_eq!(normalize("the founders' vision"), vec!["founder", "vision"]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\t").is_empty());
        assert!(normalize("the and of ... 123").is_empty());
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn joined_form_uses_single_spaces() {
        assert_eq!(normalize_text("Software   engineer\n developer"), "software engineer developer");
    }

    #[test]
    fn non_ascii_letters_survive() {
        assert_eq!(normalize("Café résumé"), vec!["café", "résumé"]);
    }
}
