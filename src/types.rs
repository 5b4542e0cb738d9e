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

use std::fmt;

use fnv::FnvHashMap;
use serde_derive::Serialize;

use crate::error::{MovieRecoError, Result};

/// Sparse row of a rating matrix: (column index, rating), sorted by column index.
pub type SparseVector = Vec<(u32, f64)>;
pub type SparseMatrix = Vec<SparseVector>;

pub type CountTable = FnvHashMap<u32, u32>;

pub fn new_sparse_matrix(num_rows: usize) -> SparseMatrix {
    vec![Vec::new(); num_rows]
}

/// The fixed genre vocabulary of the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Childrens,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

pub const GENRES: [Genre; 18] = [
    Genre::Action,
    Genre::Adventure,
    Genre::Animation,
    Genre::Childrens,
    Genre::Comedy,
    Genre::Crime,
    Genre::Documentary,
    Genre::Drama,
    Genre::Fantasy,
    Genre::FilmNoir,
    Genre::Horror,
    Genre::Musical,
    Genre::Mystery,
    Genre::Romance,
    Genre::SciFi,
    Genre::Thriller,
    Genre::War,
    Genre::Western,
];

impl Genre {

    pub fn tag(&self) -> &'static str {
        match *self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Childrens => "Children's",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::FilmNoir => "Film-Noir",
            Genre::Horror => "Horror",
            Genre::Musical => "Musical",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Genre> {
        GENRES.iter().find(|genre| genre.tag() == tag).cloned()
    }

    /// Position of the genre in the vocabulary, used as one-hot column index.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Movie {
    pub id: u32,
    pub title: String,
    pub genres: Vec<Genre>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rating {
    pub user_id: u32,
    pub movie_id: u32,
    pub rating: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: u32,
    pub gender: String,
    pub age: Option<u32>,
    pub occupation: String,
    pub zip_code: String,
}

/// The three prepared tables every recommender works on.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub movies: Vec<Movie>,
    pub ratings: Vec<Rating>,
    pub users: Vec<User>,
}

impl Dataset {

    pub fn new(movies: Vec<Movie>, ratings: Vec<Rating>, users: Vec<User>) -> Self {
        Dataset { movies, ratings, users }
    }

    /// First movie in catalog order whose title contains `fragment`.
    pub fn find_movie(&self, fragment: &str) -> Option<&Movie> {
        self.movies.iter().find(|movie| movie.title.contains(fragment))
    }

    pub fn movie_by_id(&self, movie_id: u32) -> Option<&Movie> {
        self.movies.iter().find(|movie| movie.id == movie_id)
    }

    /// Catalog titles keyed by movie id.
    pub fn titles(&self) -> FnvHashMap<u32, &str> {
        self.movies.iter()
            .map(|movie| (movie.id, movie.title.as_str()))
            .collect()
    }

    /// Fails on an empty catalog or an empty ratings table. Users are only needed by the rating
    /// predictor, which checks them itself.
    pub fn validate(&self) -> Result<()> {
        if self.movies.is_empty() {
            return Err(MovieRecoError::EmptyDataset("movies"));
        }
        if self.ratings.is_empty() {
            return Err(MovieRecoError::EmptyDataset("ratings"));
        }
        Ok(())
    }
}

/// Outcome of a single recommendation query. Failures that only concern the query at hand are
/// values, never errors, so a caller can tell "no such movie" apart from "nothing to recommend".
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Found(T),
    NotFound { query: String },
    InsufficientData { reason: String },
}

impl<T> Outcome<T> {

    pub fn not_found(query: &str) -> Self {
        Outcome::NotFound { query: query.to_owned() }
    }

    pub fn insufficient_data<S: Into<String>>(reason: S) -> Self {
        Outcome::InsufficientData { reason: reason.into() }
    }

    pub fn is_found(&self) -> bool {
        match *self {
            Outcome::Found(_) => true,
            _ => false,
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Outcome::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// Result record of the item-based neighbour search. Smaller distances are better.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Neighbor {
    pub movie_id: u32,
    pub title: String,
    pub distance: f64,
}

/// Result record of the correlation recommender. Larger correlations are better.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelatedMovie {
    pub title: String,
    pub correlation: f64,
    pub total_reviews: u32,
    pub average_rating: f64,
}

/// Result record of the content recommender. Larger similarities are better.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContentMatch {
    pub movie_id: u32,
    pub title: String,
    pub similarity: f64,
}

/// A user's estimated rating of a movie, with the movies the estimate is based on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingEstimate {
    pub user_id: u32,
    pub movie_id: u32,
    pub estimated_rating: f64,
    pub neighbors: Vec<Neighbor>,
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn genre_tags_round_trip_through_vocabulary() {
        for genre in GENRES.iter() {
            assert_eq!(Genre::from_tag(genre.tag()), Some(*genre));
        }
        assert_eq!(Genre::from_tag("Children's"), Some(Genre::Childrens));
        assert_eq!(Genre::from_tag("Sci-Fi"), Some(Genre::SciFi));
        assert_eq!(Genre::from_tag("Cartoon"), None);
    }

    #[test]
    fn genre_index_follows_vocabulary_order() {
        for (position, genre) in GENRES.iter().enumerate() {
            assert_eq!(genre.index(), position);
        }
    }

    #[test]
    fn find_movie_returns_first_substring_match() {
        let dataset = Dataset::new(
            vec![
                Movie { id: 1, title: String::from("Toy Story (1995)"), genres: vec![] },
                Movie { id: 3114, title: String::from("Toy Story 2 (1999)"), genres: vec![] },
            ],
            vec![],
            vec![],
        );

        assert_eq!(dataset.find_movie("Toy Story").map(|movie| movie.id), Some(1));
        assert_eq!(dataset.find_movie("Story 2").map(|movie| movie.id), Some(3114));
        assert!(dataset.find_movie("toy story").is_none());
    }

    #[test]
    fn empty_tables_are_rejected() {
        let movies = vec![Movie { id: 1, title: String::from("Heat (1995)"), genres: vec![] }];
        let ratings = vec![Rating { user_id: 1, movie_id: 1, rating: 4.0 }];

        assert!(Dataset::new(movies.clone(), ratings.clone(), vec![]).validate().is_ok());

        match Dataset::new(vec![], ratings, vec![]).validate() {
            Err(MovieRecoError::EmptyDataset(table)) => assert_eq!(table, "movies"),
            other => panic!("unexpected result {:?}", other),
        }
        match Dataset::new(movies, vec![], vec![]).validate() {
            Err(MovieRecoError::EmptyDataset(table)) => assert_eq!(table, "ratings"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn outcome_distinguishes_empty_from_missing() {
        let empty: Outcome<Vec<Neighbor>> = Outcome::Found(vec![]);
        let missing: Outcome<Vec<Neighbor>> = Outcome::not_found("Nope");

        assert!(empty.is_found());
        assert!(!missing.is_found());
        assert_ne!(empty, missing);
        assert_eq!(missing.found(), None);
    }
}
