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

use fnv::FnvHashMap;

use crate::types::{CountTable, Movie, Rating};

/// Maps external identifiers to consecutive indices and back. Indices are handed out in
/// ascending key order, so matrices built from the same data always have the same layout.
#[derive(Clone, Debug)]
pub struct Dictionary<K> {
    index: FnvHashMap<K, u32>,
    keys: Vec<K>,
}

impl<K> Dictionary<K> where K: Clone + Ord + ::std::hash::Hash {

    pub fn from_keys<I>(keys: I) -> Self where I: IntoIterator<Item=K> {

        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut index: FnvHashMap<K, u32> =
            FnvHashMap::with_capacity_and_hasher(keys.len(), Default::default());

        for (position, key) in keys.iter().enumerate() {
            index.insert(key.clone(), position as u32);
        }

        Dictionary { index, keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn index_of(&self, key: &K) -> Option<u32> {
        self.index.get(key).cloned()
    }

    pub fn key(&self, index: u32) -> &K {
        &self.keys[index as usize]
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }
}

/// Number of ratings per movie and per user, taken from the raw ratings table.
#[derive(Clone, Debug, Default)]
pub struct VoteTally {
    votes_per_movie: CountTable,
    votes_per_user: CountTable,
    num_ratings: u64,
}

impl VoteTally {

    pub fn from(ratings: &[Rating]) -> Self {

        let mut votes_per_movie: CountTable =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut votes_per_user: CountTable =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        for rating in ratings {
            *votes_per_movie.entry(rating.movie_id).or_insert(0) += 1;
            *votes_per_user.entry(rating.user_id).or_insert(0) += 1;
        }

        VoteTally { votes_per_movie, votes_per_user, num_ratings: ratings.len() as u64 }
    }

    pub fn movie_votes(&self, movie_id: u32) -> u32 {
        self.votes_per_movie.get(&movie_id).cloned().unwrap_or(0)
    }

    pub fn user_votes(&self, user_id: u32) -> u32 {
        self.votes_per_user.get(&user_id).cloned().unwrap_or(0)
    }

    pub fn num_movies(&self) -> usize {
        self.votes_per_movie.len()
    }

    pub fn num_users(&self) -> usize {
        self.votes_per_user.len()
    }

    pub fn num_ratings(&self) -> u64 {
        self.num_ratings
    }

    /// Movies with at least `threshold` votes.
    pub fn popular_movies(&self, threshold: u32) -> usize {
        self.votes_per_movie.values().filter(|&&votes| votes >= threshold).count()
    }

    /// Users with at least `threshold` votes.
    pub fn active_users(&self, threshold: u32) -> usize {
        self.votes_per_user.values().filter(|&&votes| votes >= threshold).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingSummary {
    pub total_reviews: u32,
    pub average_rating: f64,
}

/// Per-title review counts and mean ratings. Movies sharing a title are summarised together.
pub fn summaries_by_title(
    movies: &[Movie],
    ratings: &[Rating],
) -> FnvHashMap<String, RatingSummary> {

    let titles: FnvHashMap<u32, &str> = movies.iter()
        .map(|movie| (movie.id, movie.title.as_str()))
        .collect();

    let mut sums: FnvHashMap<&str, (u32, f64)> =
        FnvHashMap::with_capacity_and_hasher(titles.len(), Default::default());

    for rating in ratings {
        if let Some(title) = titles.get(&rating.movie_id) {
            let entry = sums.entry(*title).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += rating.rating;
        }
    }

    sums.into_iter()
        .map(|(title, (total_reviews, sum))| {
            let summary = RatingSummary {
                total_reviews,
                average_rating: sum / total_reviews as f64,
            };
            (title.to_owned(), summary)
        })
        .collect()
}
