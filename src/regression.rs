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

use std::time::Instant;

use fnv::FnvHashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_derive::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{MovieRecoError, Result};
use crate::types::{Dataset, Genre, Outcome, GENRES};
use crate::utils;

/// Holdout evaluation of a linear rating model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegressionReport {
    pub mse: f64,
    /// Undefined when all held out ratings are equal.
    pub r_squared: Option<f64>,
    pub selected_features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub n_train: usize,
    pub n_test: usize,
}

/// Numeric features of the ratings joined with their movies and users, stored column-wise.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureTable {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
    pub target: Vec<f64>,
}

impl FeatureTable {

    /// Joins ratings with movies and users (ratings without a known movie or user are dropped)
    /// and encodes age, genres and gender. Genres and genders become one-hot columns, but only
    /// for the values that actually occur.
    pub fn from_dataset(dataset: &Dataset) -> Self {

        let movies: FnvHashMap<u32, &[Genre]> = dataset.movies.iter()
            .map(|movie| (movie.id, movie.genres.as_slice()))
            .collect();

        let users: FnvHashMap<u32, (&str, Option<u32>)> = dataset.users.iter()
            .map(|user| (user.id, (user.gender.as_str(), user.age)))
            .collect();

        let joined: Vec<(&[Genre], &str, Option<u32>, f64)> = dataset.ratings.iter()
            .filter_map(|rating| {
                let genres = movies.get(&rating.movie_id)?;
                let (gender, age) = users.get(&rating.user_id)?;
                Some((*genres, *gender, *age, rating.rating))
            })
            .collect();

        let mut names = Vec::new();
        let mut columns = Vec::new();

        if !joined.is_empty() && joined.iter().all(|&(_, _, age, _)| age.is_some()) {
            names.push(String::from("age"));
            columns.push(joined.iter()
                .map(|&(_, _, age, _)| age.unwrap_or(0) as f64)
                .collect());
        }

        let mut genre_columns = vec![vec![0.0; joined.len()]; GENRES.len()];
        let mut genre_seen = vec![false; GENRES.len()];

        for (row, &(genres, _, _, _)) in joined.iter().enumerate() {
            for genre in genres {
                genre_columns[genre.index()][row] = 1.0;
                genre_seen[genre.index()] = true;
            }
        }

        for (genre, column) in GENRES.iter().zip(genre_columns.into_iter()) {
            if genre_seen[genre.index()] {
                names.push(genre.tag().to_owned());
                columns.push(column);
            }
        }

        let mut genders: Vec<&str> = joined.iter().map(|&(_, gender, _, _)| gender).collect();
        genders.sort();
        genders.dedup();

        for gender in genders {
            names.push(format!("gender_{}", gender));
            columns.push(joined.iter()
                .map(|&(_, other, _, _)| if other == gender { 1.0 } else { 0.0 })
                .collect());
        }

        let target = joined.iter().map(|&(_, _, _, rating)| rating).collect();

        FeatureTable { names, columns, target }
    }

    pub fn num_rows(&self) -> usize {
        self.target.len()
    }

    /// Indices of the features whose absolute Pearson correlation with the target exceeds
    /// `cutoff`. Constant features have no defined correlation and are never selected. This
    /// only prunes features that are unlikely to help, it is not a significance test.
    pub fn select_features(&self, cutoff: f64) -> Vec<usize> {
        self.columns.iter()
            .enumerate()
            .filter_map(|(feature, column)| {
                utils::pearson(column, &self.target)
                    .filter(|correlation| correlation.abs() > cutoff)
                    .map(|_| feature)
            })
            .collect()
    }

    /// The selected features of a single row.
    pub fn row(&self, row: usize, features: &[usize]) -> Vec<f64> {
        features.iter().map(|&feature| self.columns[feature][row]).collect()
    }
}

/// Random holdout split of `num_rows` rows into (train, test) row indices. The test set has
/// `ceil(num_rows * test_fraction)` rows but never all of them. The same seed always yields
/// the same split.
pub fn train_test_split(num_rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {

    let mut rows: Vec<usize> = (0..num_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    let num_test = ((num_rows as f64 * test_fraction).ceil() as usize)
        .min(num_rows.saturating_sub(1));

    let train = rows.split_off(num_test);
    (train, rows)
}

/// Ordinary least squares with an intercept.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegression {

    /// Fits the model on the normal equations. Coefficients of features that are linear
    /// combinations of other features (or of the intercept) are set to zero.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Self {

        let num_features = rows.first().map(|row| row.len()).unwrap_or(0);
        let dimensions = num_features + 1;

        let mut gram = vec![vec![0.0; dimensions]; dimensions];
        let mut moments = vec![0.0; dimensions];

        for (row, target) in rows.iter().zip(targets.iter()) {
            let augmented: Vec<f64> = Some(1.0).into_iter().chain(row.iter().cloned()).collect();
            for i in 0..dimensions {
                moments[i] += augmented[i] * target;
                for j in 0..dimensions {
                    gram[i][j] += augmented[i] * augmented[j];
                }
            }
        }

        let solution = solve(gram, moments);

        LinearRegression {
            intercept: solution[0],
            coefficients: solution[1..].to_vec(),
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept + self.coefficients.iter()
            .zip(row.iter())
            .map(|(coefficient, value)| coefficient * value)
            .sum::<f64>()
    }
}

/// Gauss-Jordan elimination on the (symmetric, positive semi-definite) normal equations,
/// pivoting along the diagonal. After the columns before it are eliminated, a column's diagonal
/// holds the part of its squared norm that those columns do not explain. A column keeping less
/// than `DEPENDENT_FRACTION` of its own original diagonal is a linear combination of earlier
/// columns: it becomes a free variable with value zero. The test is relative to each column's
/// own scale, so a large column like `age` does not mask small one-hot columns.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {

    const DEPENDENT_FRACTION: f64 = 1e-9;

    let n = b.len();
    let original_diagonal: Vec<f64> = (0..n).map(|i| a[i][i]).collect();
    let mut is_pivot = vec![false; n];

    for column in 0..n {

        let pivot = a[column][column];

        if original_diagonal[column] <= 0.0
            || pivot <= DEPENDENT_FRACTION * original_diagonal[column] {
            continue;
        }

        for j in 0..n {
            a[column][j] /= pivot;
        }
        b[column] /= pivot;

        for other in 0..n {
            let factor = a[other][column];
            if other != column && factor != 0.0 {
                for j in 0..n {
                    a[other][j] -= factor * a[column][j];
                }
                b[other] -= factor * b[column];
            }
        }

        is_pivot[column] = true;
    }

    (0..n)
        .map(|column| if is_pivot[column] { b[column] } else { 0.0 })
        .collect()
}

pub fn mean_squared_error(predictions: &[f64], targets: &[f64]) -> f64 {
    let squared_errors: Vec<f64> = predictions.iter()
        .zip(targets.iter())
        .map(|(prediction, target)| (prediction - target) * (prediction - target))
        .collect();
    utils::mean(&squared_errors).unwrap_or(0.0)
}

/// Coefficient of determination, `None` if the targets have no variance.
pub fn r_squared(predictions: &[f64], targets: &[f64]) -> Option<f64> {

    let mean = utils::mean(targets)?;

    let total: f64 = targets.iter().map(|target| (target - mean) * (target - mean)).sum();
    if total == 0.0 {
        return None;
    }

    let residual: f64 = predictions.iter()
        .zip(targets.iter())
        .map(|(prediction, target)| (prediction - target) * (prediction - target))
        .sum();

    Some(1.0 - residual / total)
}

/// Trains a linear model predicting ratings from user demographics and movie genres and
/// evaluates it on a random holdout set.
pub fn predict_ratings(dataset: &Dataset, config: &Config) -> Result<Outcome<RegressionReport>> {

    config.validate()?;
    dataset.validate()?;

    if dataset.users.is_empty() {
        return Err(MovieRecoError::EmptyDataset("users"));
    }

    let start = Instant::now();

    let table = FeatureTable::from_dataset(dataset);

    if table.num_rows() < 2 {
        return Ok(Outcome::insufficient_data(format!(
            "{} ratings could be joined with their movie and user, at least 2 are required",
            table.num_rows(),
        )));
    }

    let selected = table.select_features(config.feature_cutoff);
    let selected_features: Vec<String> = selected.iter()
        .map(|&feature| table.names[feature].clone())
        .collect();

    info!(
        "Selected {} of {} features from {} joined ratings",
        selected.len(),
        table.names.len(),
        table.num_rows(),
    );
    debug!("Selected features: {:?}", selected_features);

    let (train, test) = train_test_split(table.num_rows(), config.test_fraction, config.seed);

    let train_rows: Vec<Vec<f64>> = train.iter().map(|&row| table.row(row, &selected)).collect();
    let train_targets: Vec<f64> = train.iter().map(|&row| table.target[row]).collect();

    let model = LinearRegression::fit(&train_rows, &train_targets);

    let predictions: Vec<f64> = test.iter()
        .map(|&row| model.predict(&table.row(row, &selected)))
        .collect();
    let test_targets: Vec<f64> = test.iter().map(|&row| table.target[row]).collect();

    let report = RegressionReport {
        mse: mean_squared_error(&predictions, &test_targets),
        r_squared: r_squared(&predictions, &test_targets),
        selected_features,
        coefficients: model.coefficients,
        intercept: model.intercept,
        n_train: train.len(),
        n_test: test.len(),
    };

    info!(
        "Trained on {} ratings, holdout MSE {:.4} on {} ratings in {}ms",
        report.n_train,
        report.mse,
        report.n_test,
        utils::to_millis(start.elapsed()),
    );

    Ok(Outcome::Found(report))
}

#[cfg(test)]
mod tests {

    use crate::config::Config;
    use crate::error::MovieRecoError;
    use crate::regression::{
        mean_squared_error, predict_ratings, r_squared, train_test_split, FeatureTable,
        LinearRegression,
    };
    use crate::types::{Dataset, Genre, Movie, Outcome, Rating, User};

    fn user(id: u32, gender: &str, age: Option<u32>) -> User {
        User {
            id,
            gender: gender.to_owned(),
            age,
            occupation: String::from("10"),
            zip_code: String::from("48067"),
        }
    }

    /// Ten users rating two movies, women always give 4 stars and men always give 2.
    fn demographic_dataset() -> Dataset {
        let movies = vec![
            Movie { id: 1, title: String::from("Heat (1995)"), genres: vec![Genre::Action] },
            Movie { id: 2, title: String::from("Babe (1995)"), genres: vec![Genre::Comedy] },
        ];

        let users: Vec<User> = (1..=10)
            .map(|id| user(id, if id % 2 == 0 { "F" } else { "M" }, Some(18 + id * 3)))
            .collect();

        let mut ratings = Vec::new();
        for user in users.iter() {
            for movie_id in 1..=2 {
                let rating = if user.gender == "F" { 4.0 } else { 2.0 };
                ratings.push(Rating { user_id: user.id, movie_id, rating });
            }
        }

        Dataset::new(movies, ratings, users)
    }

    #[test]
    fn encodes_age_genres_and_gender() {
        let table = FeatureTable::from_dataset(&demographic_dataset());

        assert_eq!(table.names, vec!["age", "Action", "Comedy", "gender_F", "gender_M"]);
        assert_eq!(table.num_rows(), 20);
        assert!(table.columns.iter().all(|column| column.len() == 20));
    }

    #[test]
    fn age_is_only_a_feature_if_every_user_has_one() {
        let mut dataset = demographic_dataset();
        dataset.users[0].age = None;

        let table = FeatureTable::from_dataset(&dataset);
        assert!(!table.names.contains(&String::from("age")));
    }

    #[test]
    fn feature_selection_drops_uncorrelated_and_constant_columns() {
        let table = FeatureTable {
            names: vec![String::from("signal"), String::from("noise"), String::from("constant")],
            columns: vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![1.0, -1.0, -1.0, 1.0],
                vec![1.0, 1.0, 1.0, 1.0],
            ],
            target: vec![2.0, 4.0, 6.0, 8.0],
        };

        assert_eq!(table.select_features(0.05), vec![0]);
    }

    #[test]
    fn split_is_seeded_and_partitions_rows() {
        let (train, test) = train_test_split(11, 0.2, 42);
        let (train_again, test_again) = train_test_split(11, 0.2, 42);

        assert_eq!(train, train_again);
        assert_eq!(test, test_again);
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);

        let mut all: Vec<usize> = train.iter().chain(test.iter()).cloned().collect();
        all.sort();
        assert_eq!(all, (0..11).collect::<Vec<usize>>());
    }

    #[test]
    fn split_always_keeps_a_training_row() {
        let (train, test) = train_test_split(2, 0.9, 7);
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 1);
    }

    #[test]
    fn ols_recovers_linear_relationship() {
        let rows: Vec<Vec<f64>> = (0..10).map(|x| vec![x as f64]).collect();
        let targets: Vec<f64> = (0..10).map(|x| 1.5 + 2.0 * x as f64).collect();

        let model = LinearRegression::fit(&rows, &targets);

        assert!((model.intercept - 1.5).abs() < 1e-9);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.predict(&[20.0]) - 41.5).abs() < 1e-9);
    }

    #[test]
    fn ols_handles_collinear_one_hot_columns() {
        // The two columns always sum to one, which makes them collinear with the intercept.
        let rows = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let targets = vec![4.0, 2.0, 4.0, 2.0];

        let model = LinearRegression::fit(&rows, &targets);

        for (row, target) in rows.iter().zip(targets.iter()) {
            assert!((model.predict(row) - target).abs() < 1e-9);
        }
        assert!(model.coefficients.iter().any(|coefficient| *coefficient == 0.0));
    }

    #[test]
    fn ols_detects_collinear_columns_next_to_a_large_scale_column() {
        // The large column dominates the diagonal of the normal equations, the two one-hot
        // columns sum to the intercept column.
        let rows: Vec<Vec<f64>> = (0..12)
            .map(|i| {
                let large = 500.0 + 250.0 * i as f64;
                let odd = (i % 2) as f64;
                vec![large, odd, 1.0 - odd]
            })
            .collect();
        let targets: Vec<f64> = rows.iter()
            .map(|row| 3.0 + 0.001 * row[0] + 2.0 * row[1])
            .collect();

        let model = LinearRegression::fit(&rows, &targets);

        assert!((model.coefficients[0] - 0.001).abs() < 1e-9);
        assert!((model.coefficients[1] - 2.0).abs() < 1e-6);
        assert_eq!(model.coefficients[2], 0.0);
        for (row, target) in rows.iter().zip(targets.iter()) {
            assert!((model.predict(row) - target).abs() < 1e-6);
        }
    }

    #[test]
    fn metrics() {
        let targets = [3.0, 5.0];
        assert_eq!(mean_squared_error(&[4.0, 5.0], &targets), 0.5);
        assert_eq!(r_squared(&[3.0, 5.0], &targets), Some(1.0));
        assert_eq!(r_squared(&[4.0, 4.0], &targets), Some(0.0));
        assert_eq!(r_squared(&[3.0, 3.0], &[3.0, 3.0]), None);
    }

    #[test]
    fn predicts_ratings_explained_by_gender() {
        let report = predict_ratings(&demographic_dataset(), &Config::default())
            .unwrap()
            .found()
            .unwrap();

        assert_eq!(report.n_test, 4);
        assert_eq!(report.n_train, 16);
        assert!(report.selected_features.contains(&String::from("gender_F")));
        assert_eq!(report.coefficients.len(), report.selected_features.len());
        assert!(report.mse < 1e-9);
        if let Some(r_squared) = report.r_squared {
            assert!(r_squared > 0.999);
        }
    }

    #[test]
    fn constant_ratings_leave_r_squared_undefined() {
        let mut dataset = demographic_dataset();
        for rating in dataset.ratings.iter_mut() {
            rating.rating = 3.0;
        }

        let report = predict_ratings(&dataset, &Config::default()).unwrap().found().unwrap();

        assert!(report.selected_features.is_empty());
        assert!((report.intercept - 3.0).abs() < 1e-12);
        assert!(report.mse < 1e-18);
        assert_eq!(report.r_squared, None);
    }

    #[test]
    fn too_few_joined_ratings_are_insufficient() {
        let mut dataset = demographic_dataset();
        dataset.ratings.truncate(1);

        match predict_ratings(&dataset, &Config::default()).unwrap() {
            Outcome::InsufficientData { .. } => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn missing_users_are_a_setup_error() {
        let mut dataset = demographic_dataset();
        dataset.users.clear();

        match predict_ratings(&dataset, &Config::default()) {
            Err(MovieRecoError::EmptyDataset(table)) => assert_eq!(table, "users"),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
