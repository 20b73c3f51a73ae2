use std::collections::HashMap;
use std::fs;
use std::path::Path;

use smallvec::SmallVec;

use crate::errors::CrosswordError;
use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the WordList's `words` field.
pub type WordId = usize;

/// A word that can be chosen for a slot. `glyphs` holds its chars so that cells can be compared
/// by position regardless of how many bytes each letter takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The candidate words for a puzzle, deduplicated and kept in first-occurrence order.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    pub words: Vec<Word>,
    word_ids_by_string: HashMap<String, WordId>,
}

impl WordList {
    /// Build a word list from the given words, verbatim. Repeated words keep their first id.
    pub fn new<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut word_list = WordList::default();
        for word in words {
            word_list.add_word(word.into());
        }
        word_list
    }

    /// Parse a word file: one word per line, surrounding whitespace and blank lines ignored, and
    /// every word uppercased.
    pub fn parse(text: &str) -> WordList {
        WordList::new(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_uppercase),
        )
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<WordList, CrosswordError> {
        let text = fs::read_to_string(path)?;
        Ok(WordList::parse(&text))
    }

    fn add_word(&mut self, string: String) -> WordId {
        if let Some(&word_id) = self.word_ids_by_string.get(&string) {
            return word_id;
        }

        let word_id = self.words.len();
        self.words.push(Word {
            glyphs: string.chars().collect(),
            string: string.clone(),
        });
        self.word_ids_by_string.insert(string, word_id);
        word_id
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn get_id(&self, string: &str) -> Option<WordId> {
        self.word_ids_by_string.get(string).copied()
    }
}
