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

use crate::error::{MovieRecoError, Result};

/// Parameters shared by all recommenders. The defaults reproduce the thresholds we use on the
/// MovieLens 1M data.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Movies with fewer ratings are dropped before the neighbour search.
    pub min_movie_votes: u32,
    /// Users with fewer ratings are dropped before the neighbour search.
    pub min_user_votes: u32,
    /// Size of the neighbourhood searched per query movie.
    pub neighbors: usize,
    /// Number of results presented per query.
    pub num_recommendations: usize,
    /// Minimum number of ratings a movie needs to show up as a correlated movie.
    pub min_reviews: u32,
    /// Number of similar movies used to estimate a single user rating.
    pub estimate_neighbors: usize,
    /// Features whose absolute correlation with the rating does not exceed this are dropped.
    pub feature_cutoff: f64,
    /// Fraction of the merged rating table held out for evaluation.
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_movie_votes: 40,
            min_user_votes: 90,
            neighbors: 20,
            num_recommendations: 10,
            min_reviews: 80,
            estimate_neighbors: 4,
            feature_cutoff: 0.05,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl Config {

    /// Rejects parameter combinations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {

        if self.neighbors == 0 {
            return Err(MovieRecoError::invalid_config("neighbors", self.neighbors, "must be > 0"));
        }

        if self.num_recommendations == 0 {
            return Err(MovieRecoError::invalid_config(
                "num_recommendations", self.num_recommendations, "must be > 0"));
        }

        if self.estimate_neighbors == 0 {
            return Err(MovieRecoError::invalid_config(
                "estimate_neighbors", self.estimate_neighbors, "must be > 0"));
        }

        if !(self.feature_cutoff >= 0.0 && self.feature_cutoff < 1.0) {
            return Err(MovieRecoError::invalid_config(
                "feature_cutoff", self.feature_cutoff, "must be in [0, 1)"));
        }

        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(MovieRecoError::invalid_config(
                "test_fraction", self.test_fraction, "must be in (0, 1)"));
        }

        Ok(())
    }

    /// Number of results presented by the neighbour search, bounded by the searched neighbourhood.
    pub fn presented_neighbors(&self) -> usize {
        self.num_recommendations.min(self.neighbors)
    }
}
