//! Practice sentences for typing tests.

use rand::Rng;

const FALLBACK_SENTENCES: [&str; 2] = [
    "The quick brown fox jumps over the lazy dog.",
    "Practice makes perfect when learning to type.",
];

const MIN_WORDS: i64 = 5;
const MAX_WORDS: i64 = 12;

/// Upper-cases the first letter and makes the sentence end in exactly one period.
pub fn tidy(sentence: &str) -> String {
    let body = sentence
        .trim()
        .trim_end_matches(['.', '!', '?']);
    let mut chars = body.chars();
    let mut tidy = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    tidy.push('.');
    tidy
}

fn lorem_sentence(words: i64) -> String {
    tidy(&fakeit::words::sentence(words))
}

/// The fallback sentences followed by `count` generated ones.
pub fn generate(count: usize) -> Vec<String> {
    let mut rng = rand::rng();
    FALLBACK_SENTENCES
        .iter()
        .map(|sentence| tidy(sentence))
        .chain((0..count).map(|_| lorem_sentence(rng.random_range(MIN_WORDS..=MAX_WORDS))))
        .collect()
}

pub fn new_sentence() -> String {
    lorem_sentence(rand::rng().random_range(MIN_WORDS..=MAX_WORDS))
}

/// A sentence flavoured for a leaderboard category.
pub fn for_category(category: &str) -> String {
    match category {
        "quote" => lorem_sentence(8),
        "programming" => tidy(&format!(
            "{} {} {}",
            fakeit::hacker::phrase(),
            fakeit::hacker::verb(),
            fakeit::hacker::noun()
        )),
        "business" => tidy(&fakeit::company::buzzword()),
        _ => new_sentence(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tidy__lowercase_with_mixed_punctuation__capitalizes_and_ends_with_one_period() {
        assert_eq!("Hello world.", tidy("hello world?!."));
        assert_eq!("Already fine.", tidy("Already fine."));
        assert_eq!("No ending.", tidy("no ending"));
    }

    #[test]
    fn tidy__punctuation_only__becomes_single_period() {
        assert_eq!(".", tidy("?!"));
    }

    #[test]
    fn generate__count__prepends_fallbacks() {
        let sentences = generate(3);

        assert_eq!(5, sentences.len());
        assert_eq!(FALLBACK_SENTENCES[0], sentences[0]);
        assert_eq!(FALLBACK_SENTENCES[1], sentences[1]);
    }

    #[test]
    fn for_category__any_category__is_tidy() {
        for category in ["quote", "programming", "business", "other"] {
            let sentence = for_category(category);
            assert!(sentence.ends_with('.'), "{sentence}");
            assert!(!sentence.ends_with(".."), "{sentence}");
        }
    }

    proptest! {
        #[test]
        fn tidy__arbitrary_words__ends_with_exactly_one_period(
            words in prop::collection::vec("[a-z]{1,8}", 1..12),
            ending in "[.!?]{0,4}",
        ) {
            let raw = format!("{}{}", words.join(" "), ending);

            let sentence = tidy(&raw);

            prop_assert!(sentence.ends_with('.'));
            prop_assert!(!sentence.trim_end_matches('.').ends_with(['.', '!', '?']));
            prop_assert_eq!(sentence.trim_end_matches('.').len(), raw.trim_end_matches(['.', '!', '?']).len());
            prop_assert!(sentence.chars().next().is_some_and(|c| c.is_uppercase()));
        }
    }
}
