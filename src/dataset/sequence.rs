//! Character-sequence dataset for language identification
//!
//! Words are encoded as one-hot character vectors over an `Alphabet` and
//! grouped by length, so every batch holds words of a single length `L` and
//! is presented as `L` tensors of shape `batch × alphabet size`. Batches from
//! different length buckets are interleaved round-robin within a pass.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::dataset::{argmax_accuracy, Batch, Batches, Dataset};
use crate::error::{NnError, Result};
use crate::models::Model;
use crate::nn::Tensor;

/// Ordered set of characters with their one-hot column.
#[derive(Debug, Clone, PartialEq)]
pub struct Alphabet {
    chars: Vec<char>,
    index: HashMap<char, usize>,
}

impl Alphabet {
    /// Keeps the first occurrence of every character, in order.
    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        let mut alphabet = Self {
            chars: Vec::new(),
            index: HashMap::new(),
        };
        for c in chars {
            if !alphabet.index.contains_key(&c) {
                alphabet.index.insert(c, alphabet.chars.len());
                alphabet.chars.push(c);
            }
        }
        alphabet
    }

    /// Sorted set of every character used by `words`.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut chars: Vec<char> = words.into_iter().flat_map(str::chars).collect();
        chars.sort_unstable();
        chars.dedup();
        Self::new(chars)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn index_of(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Column index of every character of `word`.
    pub fn encode(&self, word: &str) -> Result<Vec<usize>> {
        word.chars()
            .map(|c| {
                self.index_of(c)
                    .ok_or_else(|| NnError::Dataset(format!("character {c:?} is not in the alphabet")))
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Example {
    chars: Vec<usize>,
    label: usize,
}

type Buckets = BTreeMap<usize, Vec<Example>>;

/// Labelled words bucketed by length.
#[derive(Debug, Clone)]
pub struct SequenceDataset {
    alphabet: Alphabet,
    languages: Vec<String>,
    train: Buckets,
    validation: Buckets,
    len: usize,
}

impl SequenceDataset {
    /// Builds a dataset from `(word, language index)` pairs.
    ///
    /// # Errors
    ///
    /// `NnError::Dataset` for empty words, characters outside the alphabet or
    /// language indices outside `languages`.
    pub fn new(
        alphabet: Alphabet,
        languages: Vec<String>,
        train: &[(&str, usize)],
        validation: &[(&str, usize)],
    ) -> Result<Self> {
        let train_buckets = bucket(&alphabet, languages.len(), train)?;
        let validation = bucket(&alphabet, languages.len(), validation)?;
        debug!(
            train = train.len(),
            validation = validation.values().map(Vec::len).sum::<usize>(),
            lengths = train_buckets.len(),
            "built sequence dataset"
        );
        Ok(Self {
            alphabet,
            languages,
            train: train_buckets,
            validation,
            len: train.len(),
        })
    }

    /// Reads `word<TAB>language` lines from two files. The alphabet is every
    /// character seen in either file; languages must be listed in `languages`.
    pub fn from_tsv(
        train_path: impl AsRef<Path>,
        validation_path: impl AsRef<Path>,
        languages: Vec<String>,
    ) -> Result<Self> {
        let train_text = fs::read_to_string(train_path)?;
        let validation_text = fs::read_to_string(validation_path)?;
        let train = parse_tsv(&train_text, &languages)?;
        let validation = parse_tsv(&validation_text, &languages)?;

        let alphabet = Alphabet::from_words(train.iter().chain(&validation).map(|(w, _)| *w));
        Self::new(alphabet, languages, &train, &validation)
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn num_chars(&self) -> usize {
        self.alphabet.len()
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// One-hot steps for a single word, ready for `LanguageIdModel::run`.
    pub fn encode_word(&self, word: &str) -> Result<Vec<Tensor>> {
        let chars = self.alphabet.encode(word)?;
        chars
            .iter()
            .map(|&c| Tensor::one_hot(&[c], self.alphabet.len()))
            .collect()
    }

    fn encode_batch(&self, examples: &[Example]) -> Batch<Vec<Tensor>> {
        let length = examples.first().map_or(0, |e| e.chars.len());
        let width = self.alphabet.len();
        let steps = (0..length)
            .map(|position| {
                let mut step = Tensor::zeros(examples.len(), width);
                for (row, example) in examples.iter().enumerate() {
                    step.data_mut()[row * width + example.chars[position]] = 1.0;
                }
                step
            })
            .collect();

        let mut labels = Tensor::zeros(examples.len(), self.languages.len());
        let classes = self.languages.len();
        for (row, example) in examples.iter().enumerate() {
            labels.data_mut()[row * classes + example.label] = 1.0;
        }
        (steps, labels)
    }
}

impl Dataset for SequenceDataset {
    type Input = Vec<Tensor>;

    fn len(&self) -> usize {
        self.len
    }

    fn input_width(&self) -> usize {
        self.alphabet.len()
    }

    fn label_width(&self) -> usize {
        self.languages.len()
    }

    fn iterate_once(&self, batch_size: usize) -> Batches<'_, Vec<Tensor>> {
        let batch_size = batch_size.max(1);
        let mut chunks: Vec<std::slice::Chunks<'_, Example>> =
            self.train.values().map(|examples| examples.chunks(batch_size)).collect();

        // Round-robin across length buckets until all are drained.
        let mut plan = Vec::new();
        loop {
            let before = plan.len();
            for bucket in chunks.iter_mut() {
                if let Some(chunk) = bucket.next() {
                    plan.push(chunk);
                }
            }
            if plan.len() == before {
                break;
            }
        }

        Box::new(plan.into_iter().map(move |chunk| self.encode_batch(chunk)))
    }

    fn validation_accuracy<M>(&self, model: &M) -> Result<f32>
    where
        M: Model<Input = Vec<Tensor>>,
    {
        let mut correct = 0;
        let mut total = 0;
        for examples in self.validation.values() {
            let (steps, labels) = self.encode_batch(examples);
            let scores = model.run(&steps)?;
            let (c, t) = argmax_accuracy(&scores, &labels);
            correct += c;
            total += t;
        }
        if total == 0 {
            return Err(NnError::NoValidationData);
        }
        Ok(correct as f32 / total as f32)
    }
}

fn bucket(alphabet: &Alphabet, classes: usize, words: &[(&str, usize)]) -> Result<Buckets> {
    let mut buckets = Buckets::new();
    for &(word, label) in words {
        if word.is_empty() {
            return Err(NnError::Dataset("empty word".into()));
        }
        if label >= classes {
            return Err(NnError::Dataset(format!(
                "language index {label} out of range for {classes} languages"
            )));
        }
        let chars = alphabet.encode(word)?;
        buckets
            .entry(chars.len())
            .or_default()
            .push(Example { chars, label });
    }
    Ok(buckets)
}

fn parse_tsv<'a>(text: &'a str, languages: &[String]) -> Result<Vec<(&'a str, usize)>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            let (word, language) = line.split_once('\t').ok_or_else(|| {
                NnError::Dataset(format!("line {}: expected word<TAB>language", number + 1))
            })?;
            let language = language.trim();
            let label = languages
                .iter()
                .position(|l| l == language)
                .ok_or_else(|| {
                    NnError::Dataset(format!("line {}: unknown language {language:?}", number + 1))
                })?;
            Ok((word, label))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn languages() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    fn sample() -> SequenceDataset {
        let words = ["ab", "ba", "abc", "a", "cc", "bca", "b"];
        let alphabet = Alphabet::from_words(words);
        SequenceDataset::new(
            alphabet,
            languages(),
            &[("ab", 0), ("ba", 1), ("abc", 0), ("a", 0), ("cc", 1), ("bca", 1), ("b", 1)],
            &[("ab", 0), ("c", 1)],
        )
        .unwrap()
    }

    #[test]
    fn test_alphabet_from_words_is_sorted_and_unique() {
        let alphabet = Alphabet::from_words(["hello", "world"]);
        assert_eq!(alphabet.chars(), &['d', 'e', 'h', 'l', 'o', 'r', 'w']);
        assert_eq!(alphabet.index_of('h'), Some(2));
        assert!(alphabet.encode("hex").is_err());
    }

    #[test]
    fn test_batches_share_one_length() {
        let data = sample();
        let batches: Vec<_> = data.iterate_once(2).collect();

        let mut seen = 0;
        for (steps, labels) in &batches {
            assert!(!steps.is_empty());
            for step in steps {
                assert_eq!(step.rows(), labels.rows());
                assert_eq!(step.cols(), data.num_chars());
                // Each row is one-hot.
                for r in 0..step.rows() {
                    assert_eq!(step.row(r).iter().sum::<f32>(), 1.0);
                }
            }
            seen += labels.rows();
        }
        assert_eq!(seen, data.len());
    }

    #[test]
    fn test_buckets_are_interleaved() {
        let data = sample();
        let lengths: Vec<usize> = data.iterate_once(2).map(|(steps, _)| steps.len()).collect();
        // Buckets 1, 2, 3 hold 2, 3, 2 words.
        assert_eq!(lengths, vec![1, 2, 3, 2]);
    }

    #[test]
    fn test_new_rejects_bad_label() {
        let alphabet = Alphabet::new(['a']);
        let result = SequenceDataset::new(alphabet, languages(), &[("a", 2)], &[]);
        assert!(matches!(result, Err(NnError::Dataset(_))));
    }

    #[test]
    fn test_parse_tsv() {
        let parsed = parse_tsv("ab\ta\n\nba\tb\n", &languages()).unwrap();
        assert_eq!(parsed, vec![("ab", 0), ("ba", 1)]);
        assert!(parse_tsv("ab\tc\n", &languages()).is_err());
        assert!(parse_tsv("ab\n", &languages()).is_err());
    }

    #[test]
    fn test_encode_word() {
        let data = sample();
        let steps = data.encode_word("ca").unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].shape(), (1, 3));
        assert_eq!(steps[0].get(0, 2), 1.0);
    }
}
