/*
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

//! Movie recommendations from the MovieLens style `movies`, `ratings` and `users` tables:
//! item-based neighbours over the rating matrix, rating correlations, TF-IDF content
//! similarity, a neighbourhood rating estimate and a linear rating model.

pub mod config;
pub mod content;
pub mod correlation;
pub mod error;
pub mod io;
pub mod matrix;
pub mod neighbors;
pub mod popularity;
pub mod recommend;
pub mod regression;
pub mod stats;
pub mod stopwords;
pub mod topk;
pub mod types;
pub mod utils;


pub use crate::config::Config;
pub use crate::content::content_recommendations;
pub use crate::correlation::correlated_movies;
pub use crate::error::{MovieRecoError, Result};
pub use crate::neighbors::item_based_recommendations;
pub use crate::recommend::estimate_rating;
pub use crate::regression::{predict_ratings, RegressionReport};
pub use crate::types::{
    ContentMatch, CorrelatedMovie, Dataset, Genre, Movie, Neighbor, Outcome, Rating,
    RatingEstimate, User,
};
