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

use fnv::FnvHashMap;

use crate::stats::Dictionary;
use crate::types::{self, Movie, Rating, SparseMatrix, SparseVector};

/// Sparse rating matrix with one row per movie (or per title) and one column per user. Cells
/// without a rating are implicitly zero, which the cosine based code treats as "no signal".
#[derive(Clone, Debug)]
pub struct RatingMatrix<K> {
    rows: Dictionary<K>,
    columns: Dictionary<u32>,
    data: SparseMatrix,
}

impl RatingMatrix<u32> {

    /// Movie x user matrix. If a user rated the same movie more than once, the last rating wins.
    pub fn from_ratings(ratings: &[Rating]) -> Self {

        let rows = Dictionary::from_keys(ratings.iter().map(|rating| rating.movie_id));
        let columns = Dictionary::from_keys(ratings.iter().map(|rating| rating.user_id));

        let mut cells: FnvHashMap<(u32, u32), f64> =
            FnvHashMap::with_capacity_and_hasher(ratings.len(), Default::default());

        for rating in ratings {
            if let (Some(row), Some(column)) =
                (rows.index_of(&rating.movie_id), columns.index_of(&rating.user_id)) {
                cells.insert((row, column), rating.rating);
            }
        }

        RatingMatrix::assemble(rows, columns, cells)
    }
}

impl RatingMatrix<String> {

    /// Title x user matrix. Movies sharing a title are merged, a user's ratings for them are
    /// averaged. Ratings of movies missing from the catalog are ignored.
    pub fn by_title(movies: &[Movie], ratings: &[Rating]) -> Self {

        let titles: FnvHashMap<u32, &str> = movies.iter()
            .map(|movie| (movie.id, movie.title.as_str()))
            .collect();

        let rated = ratings.iter().filter(|rating| titles.contains_key(&rating.movie_id));

        let rows = Dictionary::from_keys(
            rated.clone().map(|rating| titles[&rating.movie_id].to_owned()));
        let columns = Dictionary::from_keys(rated.clone().map(|rating| rating.user_id));

        let row_of_movie: FnvHashMap<u32, u32> = titles.iter()
            .filter_map(|(movie_id, title)| {
                rows.index_of(&title.to_string()).map(|row| (*movie_id, row))
            })
            .collect();

        let mut sums: FnvHashMap<(u32, u32), (f64, u32)> =
            FnvHashMap::with_capacity_and_hasher(ratings.len(), Default::default());

        for rating in rated {
            if let (Some(row), Some(column)) =
                (row_of_movie.get(&rating.movie_id), columns.index_of(&rating.user_id)) {
                let cell = sums.entry((*row, column)).or_insert((0.0, 0));
                cell.0 += rating.rating;
                cell.1 += 1;
            }
        }

        let cells = sums.into_iter()
            .map(|(position, (sum, count))| (position, sum / count as f64))
            .collect();

        RatingMatrix::assemble(rows, columns, cells)
    }
}

impl<K> RatingMatrix<K> where K: Clone + Ord + Hash {

    fn assemble(
        rows: Dictionary<K>,
        columns: Dictionary<u32>,
        cells: FnvHashMap<(u32, u32), f64>,
    ) -> Self {

        let mut data = types::new_sparse_matrix(rows.len());

        for ((row, column), value) in cells.into_iter() {
            data[row as usize].push((column, value));
        }

        for row in data.iter_mut() {
            row.sort_by_key(|&(column, _)| column);
        }

        RatingMatrix { rows, columns, data }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_entries(&self) -> usize {
        self.data.iter().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn row_index(&self, key: &K) -> Option<u32> {
        self.rows.index_of(key)
    }

    pub fn row_key(&self, row: u32) -> &K {
        self.rows.key(row)
    }

    pub fn row_keys(&self) -> &[K] {
        self.rows.keys()
    }

    pub fn column_index(&self, user_id: u32) -> Option<u32> {
        self.columns.index_of(&user_id)
    }

    pub fn column_key(&self, column: u32) -> u32 {
        *self.columns.key(column)
    }

    pub fn column_keys(&self) -> &[u32] {
        self.columns.keys()
    }

    pub fn row(&self, row: u32) -> &SparseVector {
        &self.data[row as usize]
    }

    /// Looks up the ratings of a row by its key.
    pub fn row_by_key(&self, key: &K) -> Option<&SparseVector> {
        self.row_index(key).map(|row| self.row(row))
    }

    /// Ratings of a single column as (row index, rating) pairs in row order.
    pub fn column(&self, column: u32) -> SparseVector {
        self.data.iter()
            .enumerate()
            .filter_map(|(row, entries)| {
                entries.binary_search_by_key(&column, |&(c, _)| c)
                    .ok()
                    .map(|position| (row as u32, entries[position].1))
            })
            .collect()
    }

    /// Looks up the ratings of a column by user id.
    pub fn column_by_key(&self, user_id: u32) -> Option<SparseVector> {
        self.column_index(user_id).map(|column| self.column(column))
    }

    /// Rating at a cell, zero if unrated.
    pub fn get(&self, row: u32, column: u32) -> f64 {
        let entries = &self.data[row as usize];
        match entries.binary_search_by_key(&column, |&(c, _)| c) {
            Ok(position) => entries[position].1,
            Err(_) => 0.0,
        }
    }

    /// Column-major copy of the matrix: for each column the (row index, rating) pairs in row
    /// order. Used to compute the dot products of one row against all others in a single pass.
    pub fn column_postings(&self) -> SparseMatrix {

        let mut postings = types::new_sparse_matrix(self.columns.len());

        for (row, entries) in self.data.iter().enumerate() {
            for &(column, value) in entries.iter() {
                postings[column as usize].push((row as u32, value));
            }
        }

        postings
    }

    /// Squared Euclidean norm of every row.
    pub fn squared_row_norms(&self) -> Vec<f64> {
        self.data.iter()
            .map(|entries| entries.iter().map(|&(_, value)| value * value).sum::<f64>())
            .collect()
    }

    /// Sub-matrix with the selected rows and columns, in their original order.
    pub fn retain<R, C>(&self, keep_row: R, keep_column: C) -> Self
        where R: Fn(&K) -> bool, C: Fn(u32) -> bool {

        let kept_rows: Vec<u32> = (0..self.rows.len() as u32)
            .filter(|&row| keep_row(self.rows.key(row)))
            .collect();

        let rows = Dictionary::from_keys(kept_rows.iter().map(|&row| self.rows.key(row).clone()));
        let columns = Dictionary::from_keys(
            self.columns.keys().iter().cloned().filter(|&user_id| keep_column(user_id)));

        let data = kept_rows.iter()
            .map(|&row| {
                self.data[row as usize].iter()
                    .filter_map(|&(column, value)| {
                        columns.index_of(self.columns.key(column))
                            .map(|new_column| (new_column, value))
                    })
                    .collect()
            })
            .collect();

        RatingMatrix { rows, columns, data }
    }
}

#[cfg(test)]
mod tests {

    use crate::matrix::RatingMatrix;
    use crate::types::{Movie, Rating};

    fn rating(user_id: u32, movie_id: u32, rating: f64) -> Rating {
        Rating { user_id, movie_id, rating }
    }

    fn movie(id: u32, title: &str) -> Movie {
        Movie { id, title: title.to_owned(), genres: vec![] }
    }

    #[test]
    fn builds_movie_by_user_matrix() {
        let ratings = vec![
            rating(7, 2, 4.0),
            rating(3, 1, 5.0),
            rating(7, 1, 3.0),
            rating(5, 2, 1.0),
        ];

        let matrix = RatingMatrix::from_ratings(&ratings);

        assert_eq!(matrix.num_rows(), 2);
        assert_eq!(matrix.num_columns(), 3);
        assert_eq!(matrix.num_entries(), 4);

        let movie_1 = matrix.row_index(&1).unwrap();
        let user_7 = matrix.column_index(7).unwrap();
        let user_5 = matrix.column_index(5).unwrap();

        assert_eq!(matrix.get(movie_1, user_7), 3.0);
        assert_eq!(matrix.get(movie_1, user_5), 0.0);
        assert_eq!(matrix.row_by_key(&2).unwrap().len(), 2);
        assert_eq!(matrix.column_by_key(7).unwrap().len(), 2);
        assert!(matrix.column_by_key(99).is_none());
    }

    #[test]
    fn last_duplicate_rating_wins() {
        let ratings = vec![rating(1, 1, 2.0), rating(1, 1, 5.0)];
        let matrix = RatingMatrix::from_ratings(&ratings);

        assert_eq!(matrix.num_entries(), 1);
        assert_eq!(matrix.get(0, 0), 5.0);
    }

    #[test]
    fn rows_are_sorted_by_column() {
        let ratings = vec![rating(9, 1, 1.0), rating(2, 1, 2.0), rating(5, 1, 3.0)];
        let matrix = RatingMatrix::from_ratings(&ratings);

        let columns: Vec<u32> = matrix.row(0).iter().map(|&(column, _)| column).collect();
        assert_eq!(columns, vec![0, 1, 2]);
        assert_eq!(matrix.column_keys(), &[2, 5, 9]);
    }

    #[test]
    fn title_matrix_averages_movies_sharing_a_title() {
        let movies = vec![movie(1, "Hamlet (1996)"), movie(2, "Hamlet (1996)"), movie(3, "Heat (1995)")];
        let ratings = vec![rating(1, 1, 4.0), rating(1, 2, 2.0), rating(2, 3, 5.0), rating(2, 42, 1.0)];

        let matrix = RatingMatrix::by_title(&movies, &ratings);

        assert_eq!(matrix.num_rows(), 2);
        assert_eq!(matrix.num_columns(), 2);

        let hamlet = matrix.row_index(&String::from("Hamlet (1996)")).unwrap();
        assert_eq!(matrix.get(hamlet, matrix.column_index(1).unwrap()), 3.0);
    }

    #[test]
    fn column_postings_transpose_rows() {
        let ratings = vec![rating(1, 1, 1.0), rating(2, 1, 2.0), rating(1, 2, 3.0)];
        let matrix = RatingMatrix::from_ratings(&ratings);

        let postings = matrix.column_postings();

        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0], vec![(0, 1.0), (1, 3.0)]);
        assert_eq!(postings[1], vec![(0, 2.0)]);
        assert_eq!(matrix.column(0), postings[0]);
    }

    #[test]
    fn retain_keeps_order_and_reindexes_columns() {
        let ratings = vec![
            rating(1, 10, 1.0),
            rating(2, 10, 2.0),
            rating(3, 10, 3.0),
            rating(3, 20, 4.0),
            rating(1, 30, 5.0),
        ];
        let matrix = RatingMatrix::from_ratings(&ratings);

        let reduced = matrix.retain(|&movie_id| movie_id != 20, |user_id| user_id != 2);

        assert_eq!(reduced.row_keys(), &[10, 30]);
        assert_eq!(reduced.column_keys(), &[1, 3]);
        assert_eq!(reduced.row(0), &vec![(0, 1.0), (1, 3.0)]);
        assert_eq!(reduced.row(1), &vec![(0, 5.0)]);
    }

    #[test]
    fn squared_row_norms() {
        let ratings = vec![rating(1, 1, 3.0), rating(2, 1, 4.0)];
        let matrix = RatingMatrix::from_ratings(&ratings);

        assert_eq!(matrix.squared_row_norms(), vec![25.0]);
    }
}
