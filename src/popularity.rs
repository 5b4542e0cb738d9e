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

use crate::matrix::RatingMatrix;
use crate::stats::VoteTally;

/// Removes rarely rated movies and users with few ratings to reduce the sparsity of the matrix.
/// Vote counts always come from the raw ratings, so dropping a user does not lower the count of
/// the movies they rated.
pub fn filter_popular(
    matrix: &RatingMatrix<u32>,
    tally: &VoteTally,
    min_movie_votes: u32,
    min_user_votes: u32,
) -> RatingMatrix<u32> {

    let filtered = matrix.retain(
        |&movie_id| tally.movie_votes(movie_id) >= min_movie_votes,
        |user_id| tally.user_votes(user_id) >= min_user_votes,
    );

    debug!(
        "Popularity filter (movies >= {}, users >= {}) kept {}/{} movies and {}/{} users",
        min_movie_votes,
        min_user_votes,
        filtered.num_rows(),
        matrix.num_rows(),
        filtered.num_columns(),
        matrix.num_columns(),
    );

    filtered
}

#[cfg(test)]
mod tests {

    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    use crate::matrix::RatingMatrix;
    use crate::popularity::filter_popular;
    use crate::stats::VoteTally;
    use crate::types::Rating;

    fn random_ratings(seed: u64, num_ratings: usize) -> Vec<Rating> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..num_ratings)
            .map(|_| Rating {
                user_id: rng.gen_range(0..30),
                movie_id: rng.gen_range(0..50),
                rating: rng.gen_range(1..6) as f64,
            })
            .collect()
    }

    #[test]
    fn retained_rows_and_columns_meet_thresholds() {
        let ratings = random_ratings(7, 600);
        let tally = VoteTally::from(&ratings);
        let matrix = RatingMatrix::from_ratings(&ratings);

        for &(min_movie_votes, min_user_votes) in &[(0, 0), (5, 10), (12, 20), (15, 25), (1000, 1)] {
            let filtered = filter_popular(&matrix, &tally, min_movie_votes, min_user_votes);

            for movie_id in filtered.row_keys() {
                assert!(tally.movie_votes(*movie_id) >= min_movie_votes);
            }
            for user_id in filtered.column_keys() {
                assert!(tally.user_votes(*user_id) >= min_user_votes);
            }

            assert_eq!(filtered.num_rows(), tally.popular_movies(min_movie_votes));
            assert_eq!(filtered.num_columns(), tally.active_users(min_user_votes));
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let ratings = vec![
            Rating { user_id: 1, movie_id: 1, rating: 4.0 },
            Rating { user_id: 2, movie_id: 1, rating: 3.0 },
            Rating { user_id: 1, movie_id: 2, rating: 2.0 },
        ];
        let tally = VoteTally::from(&ratings);
        let matrix = RatingMatrix::from_ratings(&ratings);

        let filtered = filter_popular(&matrix, &tally, 2, 1);

        assert_eq!(filtered.row_keys(), &[1]);
        assert_eq!(filtered.column_keys(), &[1, 2]);
    }

    #[test]
    fn strict_thresholds_can_empty_the_matrix() {
        let ratings = random_ratings(3, 100);
        let tally = VoteTally::from(&ratings);
        let matrix = RatingMatrix::from_ratings(&ratings);

        let filtered = filter_popular(&matrix, &tally, 40, 90);

        assert!(filtered.is_empty());
    }
}
