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

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::matrix::RatingMatrix;
use crate::neighbors::NeighborIndex;
use crate::types::{Dataset, Neighbor, Outcome, RatingEstimate};

/// Estimates how `user_id` would rate `movie_id` from the user's ratings of the movies most
/// similar to it. Each neighbour contributes its rating weighted by its cosine similarity, movies
/// the user has not rated contribute zero.
pub fn estimate_rating(
    dataset: &Dataset,
    user_id: u32,
    movie_id: u32,
    config: &Config,
) -> Result<Outcome<RatingEstimate>> {

    config.validate()?;
    dataset.validate()?;

    let matrix = RatingMatrix::from_ratings(&dataset.ratings);

    let row = match matrix.row_index(&movie_id) {
        Some(row) => row,
        None => return Ok(Outcome::not_found(&format!("movie {}", movie_id))),
    };

    let column = match matrix.column_index(user_id) {
        Some(column) => column,
        None => return Ok(Outcome::not_found(&format!("user {}", user_id))),
    };

    let index = NeighborIndex::new(&matrix);
    let nearest = index.nearest(row, config.estimate_neighbors);

    let mut weighted_sum = 0.0;
    let mut sum_of_weights = 0.0;

    for scored_item in nearest.iter() {
        let similarity = 1.0 - scored_item.score;
        weighted_sum += similarity * matrix.get(scored_item.item, column);
        sum_of_weights += similarity;
    }

    if sum_of_weights <= 0.0 {
        return Ok(Outcome::insufficient_data(format!(
            "movie {} shares no raters with any other movie",
            movie_id,
        )));
    }

    let titles = dataset.titles();

    let neighbors = nearest.iter()
        .map(|scored_item| {
            let other_movie_id = *matrix.row_key(scored_item.item);
            Neighbor {
                movie_id: other_movie_id,
                title: titles.get(&other_movie_id).map(|title| title.to_string())
                    .unwrap_or_default(),
                distance: scored_item.score,
            }
        })
        .collect();

    let estimated_rating = weighted_sum / sum_of_weights;

    debug!(
        "Estimated rating of user {} for movie {} is {:.3} from {} neighbours",
        user_id,
        movie_id,
        estimated_rating,
        nearest.len(),
    );

    Ok(Outcome::Found(RatingEstimate { user_id, movie_id, estimated_rating, neighbors }))
}
