/**
 * MovieReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::cmp::Ordering;

use fnv::FnvHashMap;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::stopwords;
use crate::topk::{self, Direction};
use crate::types::{ContentMatch, Dataset, Movie, Outcome, SparseVector};

/// Lowercased runs of at least two word characters, without English stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !stopwords::is_stop_word(token))
        .map(|token| token.to_owned())
        .collect()
}

/// The text we describe a movie by: its title followed by its genre tags.
pub fn document(movie: &Movie) -> String {
    let mut document = movie.title.clone();
    for genre in movie.genres.iter() {
        document.push(' ');
        document.push_str(genre.tag());
    }
    document
}

/// TF-IDF weighting with raw term counts, smoothed inverse document frequencies and
/// L2-normalised document vectors.
#[derive(Clone, Debug)]
pub struct TfIdfVectorizer {
    vocabulary: FnvHashMap<String, u32>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {

    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {

        let mut vocabulary: FnvHashMap<String, u32> = FnvHashMap::default();
        let mut document_frequencies: Vec<u32> = Vec::new();

        for document in documents {
            let mut tokens = tokenize(document.as_ref());
            tokens.sort();
            tokens.dedup();

            for token in tokens {
                let next_index = vocabulary.len() as u32;
                let term = *vocabulary.entry(token).or_insert(next_index);
                if term as usize == document_frequencies.len() {
                    document_frequencies.push(0);
                }
                document_frequencies[term as usize] += 1;
            }
        }

        let num_documents = documents.len() as f64;

        let idf = document_frequencies.iter()
            .map(|&df| ((1.0 + num_documents) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        TfIdfVectorizer { vocabulary, idf }
    }

    pub fn num_terms(&self) -> usize {
        self.vocabulary.len()
    }

    /// Weighted vector of a document, sorted by term index. Terms outside of the fitted
    /// vocabulary are ignored, a document without known terms maps to the empty vector.
    pub fn transform(&self, document: &str) -> SparseVector {

        let mut counts: FnvHashMap<u32, f64> = FnvHashMap::default();

        for token in tokenize(document) {
            if let Some(&term) = self.vocabulary.get(&token) {
                *counts.entry(term).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: SparseVector = counts.into_iter()
            .map(|(term, count)| (term, count * self.idf[term as usize]))
            .collect();

        weights.sort_by_key(|&(term, _)| term);

        let norm = weights.iter().map(|&(_, weight)| weight * weight).sum::<f64>().sqrt();
        if norm > 0.0 {
            for entry in weights.iter_mut() {
                entry.1 /= norm;
            }
        }

        weights
    }
}

/// Dot product of two vectors sorted by index.
pub fn dot(a: &SparseVector, b: &SparseVector) -> f64 {

    let mut sum = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    sum
}

/// Movies whose title and genres are textually closest to `title` combined with `genre`. The
/// best match is usually the queried movie itself and is always skipped.
pub fn content_recommendations(
    dataset: &Dataset,
    title: &str,
    genre: &str,
    config: &Config,
) -> Result<Outcome<Vec<ContentMatch>>> {

    config.validate()?;
    dataset.validate()?;

    let documents: Vec<String> = dataset.movies.iter().map(document).collect();
    let vectorizer = TfIdfVectorizer::fit(&documents);

    info!(
        "Vectorised {} movie documents over {} terms",
        documents.len(),
        vectorizer.num_terms(),
    );

    let query = vectorizer.transform(&format!("{} {}", title, genre));

    debug!("Query '{} {}' has {} known terms", title, genre, query.len());

    let candidates = documents.iter()
        .enumerate()
        .map(|(position, document)| {
            (position as u32, dot(&query, &vectorizer.transform(document)))
        });

    let matches = topk::top_k(candidates, config.num_recommendations + 1, Direction::Descending)
        .into_iter()
        .skip(1)
        .map(|scored_item| {
            let movie = &dataset.movies[scored_item.item as usize];
            ContentMatch {
                movie_id: movie.id,
                title: movie.title.clone(),
                similarity: scored_item.score,
            }
        })
        .collect();

    Ok(Outcome::Found(matches))
}
