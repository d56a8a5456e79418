//! Noun lemmatizer.
//!
//! Reduces plural nouns to their singular dictionary form with the WordNet
//! noun detachment rules, an irregular-plural table, and a list of words that
//! end in `s` without being plurals. Verbs and adjectives are treated as nouns,
//! so `running` stays `running`.

/// Irregular plurals that the suffix rules cannot recover.
const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("axes", "axis"),
    ("bases", "basis"),
    ("calves", "calf"),
    ("children", "child"),
    ("crises", "crisis"),
    ("criteria", "criterion"),
    ("data", "datum"),
    ("diagnoses", "diagnosis"),
    ("elves", "elf"),
    ("feet", "foot"),
    ("geese", "goose"),
    ("halves", "half"),
    ("hypotheses", "hypothesis"),
    ("indices", "index"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("lives", "life"),
    ("loaves", "loaf"),
    ("matrices", "matrix"),
    ("media", "medium"),
    ("men", "man"),
    ("mice", "mouse"),
    ("oxen", "ox"),
    ("phenomena", "phenomenon"),
    ("selves", "self"),
    ("shelves", "shelf"),
    ("syntheses", "synthesis"),
    ("teeth", "tooth"),
    ("theses", "thesis"),
    ("thieves", "thief"),
    ("vertices", "vertex"),
    ("wives", "wife"),
    ("wolves", "wolf"),
    ("women", "woman"),
    ("cookies", "cookie"),
    ("movies", "movie"),
    ("pies", "pie"),
    ("ties", "tie"),
    ("lies", "lie"),
    ("rookies", "rookie"),
    ("calories", "calorie"),
    ("newbies", "newbie"),
    ("techies", "techie"),
];

/// Words that end in `s` but are already in base form. Their `-es` plurals
/// (`buses`, `statuses`) reduce back to them.
const INVARIANT_NOUNS: &[&str] = &[
    // -as, -es and others
    "alias", "atlas", "bias", "canvas", "christmas", "gas", "chaos", "diabetes", "series",
    "species", "news", "yes", "whereas", "always", "perhaps", "thus", "means", "corps", "lens",
    // -is
    "analysis", "axis", "basis", "chassis", "crisis", "diagnosis", "emphasis", "genesis",
    "hypothesis", "oasis", "paralysis", "parenthesis", "prognosis", "synopsis", "synthesis",
    "tennis", "thesis",
    // -us
    "apparatus", "bonus", "bus", "cactus", "campus", "census", "chorus", "circus", "consensus",
    "corpus", "focus", "genius", "genus", "minus", "nexus", "octopus", "plus", "prospectus",
    "radius", "stimulus", "status", "surplus", "syllabus", "thesaurus", "virus", "walrus",
    // -ics
    "acoustics", "aerobics", "analytics", "athletics", "economics", "electronics", "ethics",
    "genetics", "informatics", "linguistics", "logistics", "mathematics", "mechanics",
    "physics", "politics", "robotics", "semantics", "statistics",
];

/// Endings that mark a word as singular already (`business`, `famous`).
const SINGULAR_ENDINGS: &[&str] = &["ss", "ous"];

/// Suffix rewrites, most specific first.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("zzes", "zz"),
    ("xes", "x"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("smen", "sman"),
    ("remen", "reman"),
    ("ies", "y"),
    ("s", ""),
];

const MIN_STEM_CHARS: usize = 2;

pub fn lemmatize(token: &str) -> String {
    if let Some((_, base)) = IRREGULAR_NOUNS.iter().find(|(plural, _)| *plural == token) {
        return (*base).to_string();
    }

    if INVARIANT_NOUNS.contains(&token) || token.chars().count() <= 3 {
        return token.to_string();
    }

    // -ses plurals of the words above: buses -> bus
    if let Some(stem) = token.strip_suffix("es") {
        if INVARIANT_NOUNS.contains(&stem) {
            return stem.to_string();
        }
    }

    if SINGULAR_ENDINGS.iter().any(|ending| token.ends_with(ending)) {
        return token.to_string();
    }

    for (suffix, replacement) in SUFFIX_RULES {
        if let Some(stem) = token.strip_suffix(suffix) {
            if stem.chars().count() < MIN_STEM_CHARS {
                break;
            }
            return format!("{stem}{replacement}");
        }
    }

    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::lemmatize;

    #[test]
    fn regular_plurals_are_singularized() {
        assert_eq!(lemmatize("runners"), "runner");
        assert_eq!(lemmatize("databases"), "database");
        assert_eq!(lemmatize("companies"), "company");
        assert_eq!(lemmatize("classes"), "class");
        assert_eq!(lemmatize("boxes"), "box");
        assert_eq!(lemmatize("churches"), "church");
        assert_eq!(lemmatize("dishes"), "dish");
        assert_eq!(lemmatize("salesmen"), "salesman");
        assert_eq!(lemmatize("topics"), "topic");
        assert_eq!(lemmatize("metrics"), "metric");
        assert_eq!(lemmatize("clinics"), "clinic");
        assert_eq!(lemmatize("menus"), "menu");
        assert_eq!(lemmatize("taxis"), "taxi");
    }

    #[test]
    fn plurals_of_words_ending_in_s() {
        assert_eq!(lemmatize("buses"), "bus");
        assert_eq!(lemmatize("statuses"), "status");
        assert_eq!(lemmatize("bonuses"), "bonus");
        assert_eq!(lemmatize("biases"), "bias");
        assert_eq!(lemmatize("houses"), "house");
        assert_eq!(lemmatize("purposes"), "purpose");
    }

    #[test]
    fn irregular_plurals_use_the_table() {
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("women"), "woman");
        assert_eq!(lemmatize("criteria"), "criterion");
        assert_eq!(lemmatize("analyses"), "analysis");
        assert_eq!(lemmatize("movies"), "movie");
    }

    #[test]
    fn singular_forms_are_untouched() {
        for word in [
            "business", "status", "bonus", "analysis", "famous", "physics", "analytics", "news",
            "gas", "bus",
        ] {
            assert_eq!(lemmatize(word), word);
        }
    }

    #[test]
    fn verbs_are_treated_as_nouns() {
        assert_eq!(lemmatize("running"), "running");
        assert_eq!(lemmatize("developed"), "developed");
    }
}
