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

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::matrix::RatingMatrix;
use crate::stats;
use crate::topk::{self, Direction};
use crate::types::{CorrelatedMovie, Dataset, Outcome, SparseVector};
use crate::utils;

/// Ratings of the users who rated both movies, as two aligned samples. Both rows must be sorted
/// by column, which `RatingMatrix` guarantees.
pub fn co_ratings(row_a: &SparseVector, row_b: &SparseVector) -> (Vec<f64>, Vec<f64>) {

    let mut xs = Vec::new();
    let mut ys = Vec::new();

    let mut a = 0;
    let mut b = 0;

    while a < row_a.len() && b < row_b.len() {
        let (column_a, rating_a) = row_a[a];
        let (column_b, rating_b) = row_b[b];

        match column_a.cmp(&column_b) {
            Ordering::Less => a += 1,
            Ordering::Greater => b += 1,
            Ordering::Equal => {
                xs.push(rating_a);
                ys.push(rating_b);
                a += 1;
                b += 1;
            }
        }
    }

    (xs, ys)
}

/// Pairwise complete Pearson correlation of two rating rows. `None` when fewer than two users
/// rated both movies or when one side has no variance among them.
pub fn correlation(row_a: &SparseVector, row_b: &SparseVector) -> Option<f64> {
    let (xs, ys) = co_ratings(row_a, row_b);
    utils::pearson(&xs, &ys)
}

/// Movies whose ratings correlate most with the ratings of the movie titled exactly `title`.
/// Only movies with at least `min_reviews` ratings are eligible, the movie itself never is. If
/// no movie is eligible, the outcome is `InsufficientData`.
pub fn correlated_movies(
    dataset: &Dataset,
    title: &str,
    config: &Config,
) -> Result<Outcome<Vec<CorrelatedMovie>>> {

    config.validate()?;
    dataset.validate()?;

    let matrix = RatingMatrix::by_title(&dataset.movies, &dataset.ratings);

    let target = match matrix.row_index(&title.to_owned()) {
        Some(row) => row,
        None => return Ok(Outcome::not_found(title)),
    };

    let summaries = stats::summaries_by_title(&dataset.movies, &dataset.ratings);
    let target_ratings = matrix.row(target);

    info!(
        "Correlating '{}' ({} ratings) with {} titles",
        title,
        target_ratings.len(),
        matrix.num_rows() - 1,
    );

    let eligible: Vec<u32> = (0..matrix.num_rows() as u32)
        .filter(|&row| row != target)
        .filter(|&row| {
            summaries.get(matrix.row_key(row))
                .map(|summary| summary.total_reviews >= config.min_reviews)
                .unwrap_or(false)
        })
        .collect();

    if eligible.is_empty() {
        return Ok(Outcome::insufficient_data(format!(
            "no title other than '{}' has at least {} reviews",
            title,
            config.min_reviews,
        )));
    }

    let mut num_degenerate = 0;

    let candidates: Vec<(u32, f64)> = eligible.into_iter()
        .filter_map(|row| {
            let similarity = correlation(target_ratings, matrix.row(row));
            if similarity.is_none() {
                num_degenerate += 1;
            }
            similarity.map(|similarity| (row, similarity))
        })
        .collect();

    debug!(
        "{} eligible titles correlate with '{}', {} skipped for too few common raters",
        candidates.len(),
        title,
        num_degenerate,
    );

    let correlated = topk::top_k(candidates, config.num_recommendations, Direction::Descending)
        .into_iter()
        .filter_map(|scored_item| {
            let other_title = matrix.row_key(scored_item.item);
            summaries.get(other_title).map(|summary| CorrelatedMovie {
                title: other_title.clone(),
                correlation: scored_item.score,
                total_reviews: summary.total_reviews,
                average_rating: summary.average_rating,
            })
        })
        .collect();

    Ok(Outcome::Found(correlated))
}

#[cfg(test)]
mod tests {

    use crate::config::Config;
    use crate::correlation::{co_ratings, correlated_movies, correlation};
    use crate::types::{Dataset, Movie, Outcome, Rating};

    fn movie(id: u32, title: &str) -> Movie {
        Movie { id, title: title.to_owned(), genres: vec![] }
    }

    fn rate(ratings: &mut Vec<Rating>, movie_id: u32, values: &[f64]) {
        for (user, value) in values.iter().enumerate() {
            if *value > 0.0 {
                ratings.push(Rating { user_id: user as u32 + 1, movie_id, rating: *value });
            }
        }
    }

    /// Five users and five movies, a zero means "not rated".
    fn synthetic_dataset() -> Dataset {
        let movies = vec![movie(1, "A"), movie(2, "B"), movie(3, "C"), movie(4, "D"), movie(5, "E")];

        let mut ratings = Vec::new();
        rate(&mut ratings, 1, &[5.0, 4.0, 3.0, 2.0, 1.0]);
        rate(&mut ratings, 2, &[5.0, 4.0, 3.0, 2.0, 1.0]);
        rate(&mut ratings, 3, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        rate(&mut ratings, 4, &[4.0, 5.0, 3.0, 1.0, 2.0]);
        rate(&mut ratings, 5, &[0.0, 0.0, 0.0, 0.0, 3.0]);

        Dataset::new(movies, ratings, vec![])
    }

    fn config(min_reviews: u32) -> Config {
        Config { min_reviews, ..Config::default() }
    }

    #[test]
    fn co_ratings_align_common_users() {
        let a = vec![(0, 1.0), (2, 3.0), (5, 4.0)];
        let b = vec![(1, 2.0), (2, 5.0), (5, 1.0), (7, 2.0)];

        assert_eq!(co_ratings(&a, &b), (vec![3.0, 4.0], vec![5.0, 1.0]));
    }

    #[test]
    fn identical_rating_columns_correlate_perfectly() {
        let a = vec![(0, 5.0), (1, 4.0), (2, 3.0), (3, 2.0), (4, 1.0)];
        assert_eq!(correlation(&a, &a.clone()), Some(1.0));

        let dataset = synthetic_dataset();
        let correlated = correlated_movies(&dataset, "A", &config(0)).unwrap().found().unwrap();

        assert_eq!(correlated[0].title, "B");
        assert_eq!(correlated[0].correlation, 1.0);
    }

    #[test]
    fn excludes_target_and_degenerate_pairs() {
        let dataset = synthetic_dataset();
        let correlated = correlated_movies(&dataset, "A", &config(0)).unwrap().found().unwrap();

        let titles: Vec<&str> = correlated.iter().map(|movie| movie.title.as_str()).collect();

        assert!(!titles.contains(&"A"));
        // E shares a single rater with A
        assert!(!titles.contains(&"E"));
        assert_eq!(titles, vec!["B", "D", "C"]);
        assert_eq!(correlated[2].correlation, -1.0);
    }

    #[test]
    fn results_are_ordered_and_respect_review_threshold() {
        let mut dataset = synthetic_dataset();
        // Give D more reviews from additional users.
        for user_id in 10..20 {
            dataset.ratings.push(Rating { user_id, movie_id: 4, rating: 3.0 });
        }

        let correlated = correlated_movies(&dataset, "A", &config(6)).unwrap().found().unwrap();

        assert_eq!(correlated.len(), 1);
        assert_eq!(correlated[0].title, "D");
        assert_eq!(correlated[0].total_reviews, 15);
        assert!(correlated.iter().all(|movie| movie.total_reviews >= 6));

        let all = correlated_movies(&dataset, "A", &config(0)).unwrap().found().unwrap();
        for pair in all.windows(2) {
            assert!(pair[0].correlation >= pair[1].correlation);
        }
    }

    #[test]
    fn review_threshold_excluding_every_title_is_insufficient_data() {
        let dataset = synthetic_dataset();

        match correlated_movies(&dataset, "A", &Config::default()).unwrap() {
            Outcome::InsufficientData { reason } => assert!(reason.contains("80")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn reports_average_rating_of_correlated_movies() {
        let dataset = synthetic_dataset();
        let correlated = correlated_movies(&dataset, "A", &config(0)).unwrap().found().unwrap();

        let d = correlated.iter().find(|movie| movie.title == "D").unwrap();
        assert_eq!(d.total_reviews, 5);
        assert!((d.average_rating - 3.0).abs() < 1e-12);
    }

    #[test]
    fn requires_exact_title() {
        let dataset = synthetic_dataset();

        let outcome = correlated_movies(&dataset, "a", &config(0)).unwrap();
        assert_eq!(outcome, Outcome::NotFound { query: String::from("a") });
    }

    #[test]
    fn repeated_queries_give_identical_results() {
        let dataset = synthetic_dataset();

        let first = correlated_movies(&dataset, "C", &config(0)).unwrap();
        let second = correlated_movies(&dataset, "C", &config(0)).unwrap();

        assert_eq!(first, second);
    }
}
