use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref ENGLISH: Stemmer = Stemmer::create(Algorithm::English);
    static ref RUSSIAN: Stemmer = Stemmer::create(Algorithm::Russian);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Language detection and lemmatization used by the tokenizer stage.
pub trait LanguageAnalyzer {
    /// ISO 639-1 code of the dominant language, if one can be told.
    fn detect_language(&self, text: &str) -> Option<String>;

    /// Lemmas of `text` in word order.
    fn lemmatize(&self, text: &str, language_code: &str) -> Vec<String>;

    fn analyze(&self, text: &str) -> Option<(String, Vec<String>)> {
        let code = self.detect_language(text)?;
        let lemmas = self.lemmatize(text, &code);
        Some((code, lemmas))
    }
}

/// Snowball-stemming analyzer for English and Russian text. Detection is by
/// majority script of the letters in the text.
#[derive(Debug, Default, Clone, Copy)]
pub struct StemmingAnalyzer;

fn is_cyrillic(c: char) -> bool { matches!(c, '\u{0400}'..='\u{04FF}') }

fn is_latin(c: char) -> bool { c.is_ascii_alphabetic() || matches!(c, '\u{00C0}'..='\u{024F}') }

fn stemmer_for(language_code: &str) -> Option<&'static Stemmer> {
    match language_code {
        "en" => Some(&*ENGLISH),
        "ru" => Some(&*RUSSIAN),
        _ => None,
    }
}

impl LanguageAnalyzer for StemmingAnalyzer {
    fn detect_language(&self, text: &str) -> Option<String> {
        let (mut cyrillic, mut latin) = (0usize, 0usize);
        for c in text.chars() {
            if is_cyrillic(c) {
                cyrillic += 1;
            } else if is_latin(c) {
                latin += 1;
            }
        }
        match (cyrillic, latin) {
            (0, 0) => None,
            (c, l) if c > l => Some("ru".to_string()),
            _ => Some("en".to_string()),
        }
    }

    fn lemmatize(&self, text: &str, language_code: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let stemmer = stemmer_for(language_code);
        let mut lemmas = Vec::new();
        for mat in RE.find_iter(&normalized) {
            let word = mat.as_str();
            if language_code == "en" && STOPWORDS.contains(word) { continue; }
            let lemma = match stemmer {
                Some(stemmer) => stemmer.stem(word).to_string(),
                None => word.to_string(),
            };
            if !lemma.is_empty() {
                lemmas.push(lemma);
            }
        }
        lemmas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_lemmatize() {
        let t = StemmingAnalyzer.lemmatize("Running, runner's run!", "en");
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn unknown_language_keeps_words() {
        let t = StemmingAnalyzer.lemmatize("Hallo Welt", "de");
        assert_eq!(t, vec!["hallo", "welt"]);
    }
}
