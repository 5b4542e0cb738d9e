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

use std::hash::Hash;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::matrix::RatingMatrix;
use crate::popularity;
use crate::stats::VoteTally;
use crate::topk::{self, Direction, ScoredItem};
use crate::types::{Dataset, Neighbor, Outcome, SparseMatrix};
use crate::utils;

/// Brute force cosine neighbourhoods over the rows of a rating matrix. The matrix is kept in
/// column-major form as well, which allows us to compute the dot products of a query row with
/// all other rows in a single pass over the columns the query row touches.
pub struct NeighborIndex<'a, K> {
    matrix: &'a RatingMatrix<K>,
    postings: SparseMatrix,
    squared_norms: Vec<f64>,
}

impl<'a, K> NeighborIndex<'a, K> where K: Clone + Ord + Hash {

    pub fn new(matrix: &'a RatingMatrix<K>) -> Self {
        NeighborIndex {
            matrix,
            postings: matrix.column_postings(),
            squared_norms: matrix.squared_row_norms(),
        }
    }

    /// Cosine distances of row `row` to every row of the matrix (including itself). Rows without
    /// any rating are at distance 1 from everything.
    pub fn distances(&self, row: u32) -> Vec<f64> {

        let mut dots = vec![0.0; self.matrix.num_rows()];

        for &(column, value) in self.matrix.row(row).iter() {
            for &(other_row, other_value) in self.postings[column as usize].iter() {
                dots[other_row as usize] += value * other_value;
            }
        }

        let query_norm = self.squared_norms[row as usize];

        dots.iter()
            .zip(self.squared_norms.iter())
            .map(|(dot, other_norm)| {
                if query_norm == 0.0 || *other_norm == 0.0 {
                    1.0
                } else {
                    let similarity = dot / (query_norm * other_norm).sqrt();
                    (1.0 - similarity).max(0.0).min(2.0)
                }
            })
            .collect()
    }

    /// The `k` rows closest to `row`, nearest first, never including `row` itself. Rows at the
    /// same distance stay in matrix order.
    pub fn nearest(&self, row: u32, k: usize) -> Vec<ScoredItem> {

        let distances = self.distances(row);

        let candidates = distances.into_iter()
            .enumerate()
            .filter(|&(other_row, _)| other_row as u32 != row)
            .map(|(other_row, distance)| (other_row as u32, distance));

        topk::top_k(candidates, k, Direction::Ascending)
    }
}

/// Item-based recommendations: the movies whose rating vectors are closest to the one of the
/// first catalog movie whose title contains `title`, using only popular movies and active users.
pub fn item_based_recommendations(
    dataset: &Dataset,
    title: &str,
    config: &Config,
) -> Result<Outcome<Vec<Neighbor>>> {

    config.validate()?;
    dataset.validate()?;

    let movie = match dataset.find_movie(title) {
        Some(movie) => movie,
        None => return Ok(Outcome::not_found(title)),
    };

    let start = Instant::now();

    let tally = VoteTally::from(&dataset.ratings);
    let matrix = RatingMatrix::from_ratings(&dataset.ratings);
    let filtered = popularity::filter_popular(
        &matrix,
        &tally,
        config.min_movie_votes,
        config.min_user_votes,
    );

    info!(
        "Rating matrix has {} movies and {} users, {} movies and {} users left after filtering",
        matrix.num_rows(),
        matrix.num_columns(),
        filtered.num_rows(),
        filtered.num_columns(),
    );

    if filtered.is_empty() {
        return Ok(Outcome::insufficient_data(format!(
            "no movie with at least {} votes rated by a user with at least {} votes",
            config.min_movie_votes,
            config.min_user_votes,
        )));
    }

    let row = match filtered.row_index(&movie.id) {
        Some(row) => row,
        None => {
            return Ok(Outcome::insufficient_data(format!(
                "'{}' has {} votes, at least {} are required",
                movie.title,
                tally.movie_votes(movie.id),
                config.min_movie_votes,
            )));
        }
    };

    let index = NeighborIndex::new(&filtered);
    let titles = dataset.titles();

    let neighbors: Vec<Neighbor> = index.nearest(row, config.neighbors)
        .into_iter()
        .take(config.presented_neighbors())
        .map(|scored_item| {
            let movie_id = *filtered.row_key(scored_item.item);
            Neighbor {
                movie_id,
                title: titles.get(&movie_id).map(|title| title.to_string()).unwrap_or_default(),
                distance: scored_item.score,
            }
        })
        .collect();

    debug!(
        "Found {} neighbours for '{}' in {}ms",
        neighbors.len(),
        movie.title,
        utils::to_millis(start.elapsed()),
    );

    Ok(Outcome::Found(neighbors))
}
