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

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{MovieRecoError, Result};
use crate::types::{Dataset, Genre, Movie, Outcome, Rating, User};

/// Reads a `;` separated input with a header line. Rows may carry more columns than we use.
pub fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

/// The input files are latin-1 encoded, every byte is the code point of the same value.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte as char).collect()
}

fn line_of(record: &csv::ByteRecord) -> u64 {
    record.position().map(|position| position.line()).unwrap_or(0)
}

fn field(record: &csv::ByteRecord, index: usize) -> String {
    record.get(index).map(latin1).unwrap_or_default()
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::ByteRecord,
    index: usize,
    table: &'static str,
    name: &str,
) -> Result<T> {
    let value = field(record, index);
    value.trim().parse().map_err(|_| MovieRecoError::MalformedRecord {
        table,
        line: line_of(record),
        message: format!("cannot parse {} from '{}'", name, value),
    })
}

/// Splits the `|` separated genre tags of a movie. Some titles in the raw data spill over into
/// the genre column, so an unknown leading tag is appended to the title instead.
pub fn parse_genres(title: &str, genres: &str) -> (String, Vec<Genre>) {

    let mut title = title.to_owned();
    let mut parsed = Vec::new();

    for (position, tag) in genres.split('|').enumerate() {
        if tag.is_empty() {
            continue;
        }
        match Genre::from_tag(tag) {
            Some(genre) => parsed.push(genre),
            None if position == 0 => title.push_str(tag),
            None => warn!("Dropping unknown genre '{}' of '{}'", tag, title),
        }
    }

    (title, parsed)
}

/// Reads `movieId;title;genres` records.
pub fn read_movies<R: Read>(input: R) -> Result<Vec<Movie>> {

    let mut reader = csv_reader(input);
    let mut movies = Vec::new();

    for result in reader.byte_records() {
        let record = result?;
        let id = parse_field(&record, 0, "movies", "movieId")?;
        let (title, genres) = parse_genres(&field(&record, 1), &field(&record, 2));
        movies.push(Movie { id, title, genres });
    }

    Ok(movies)
}

/// Reads `userId;movieId;rating;timestamp` records, the timestamp is not needed.
pub fn read_ratings<R: Read>(input: R) -> Result<Vec<Rating>> {

    let mut reader = csv_reader(input);
    let mut ratings = Vec::new();

    for result in reader.byte_records() {
        let record = result?;
        ratings.push(Rating {
            user_id: parse_field(&record, 0, "ratings", "userId")?,
            movie_id: parse_field(&record, 1, "ratings", "movieId")?,
            rating: parse_field(&record, 2, "ratings", "rating")?,
        });
    }

    Ok(ratings)
}

/// Reads `userId;gender;age;occupation;zip-code` records. An empty age is treated as unknown.
pub fn read_users<R: Read>(input: R) -> Result<Vec<User>> {

    let mut reader = csv_reader(input);
    let mut users = Vec::new();

    for result in reader.byte_records() {
        let record = result?;

        let age = if field(&record, 2).trim().is_empty() {
            None
        } else {
            Some(parse_field(&record, 2, "users", "age")?)
        };

        users.push(User {
            id: parse_field(&record, 0, "users", "userId")?,
            gender: field(&record, 1),
            age,
            occupation: field(&record, 3),
            zip_code: field(&record, 4),
        });
    }

    Ok(users)
}

/// Loads the movie, rating and (optionally) user tables from disk.
pub fn read_dataset(
    movies_path: &str,
    ratings_path: &str,
    users_path: Option<&str>,
) -> Result<Dataset> {

    let users = match users_path {
        Some(path) => Some(File::open(path)?),
        None => None,
    };

    dataset_from(File::open(movies_path)?, File::open(ratings_path)?, users)
}

/// Reads and validates the tables. An empty table is an error, also for users if they were
/// supplied at all.
pub fn dataset_from<R: Read>(movies: R, ratings: R, users: Option<R>) -> Result<Dataset> {

    let movies = read_movies(movies)?;
    let ratings = read_ratings(ratings)?;
    let users = match users {
        Some(input) => {
            let users = read_users(input)?;
            if users.is_empty() {
                return Err(MovieRecoError::EmptyDataset("users"));
            }
            users
        }
        None => Vec::new(),
    };

    info!(
        "Read {} movies, {} ratings and {} users",
        movies.len(),
        ratings.len(),
        users.len(),
    );

    let dataset = Dataset::new(movies, ratings, users);
    dataset.validate()?;

    Ok(dataset)
}

/// If an `output_path` is supplied, we write to a file at the specified path, otherwise, we
/// output to stdout.
pub fn output(output_path: Option<String>) -> io::Result<Box<dyn Write>> {
    match output_path {
        Some(path) => Ok(Box::new(File::create(&Path::new(&path))?)),
        None => Ok(Box::new(io::stdout())),
    }
}

/// Writes the outcome of a single query as one line of JSON. The `outcome` field tells found
/// results apart from queries that could not be answered.
pub fn write_outcome<T: Serialize>(
    out: &mut dyn Write,
    method: &str,
    query: &str,
    outcome: &Outcome<T>,
) -> Result<()> {

    let outcome_as_json = match outcome {
        Outcome::Found(results) => json!({
            "method": method,
            "query": query,
            "outcome": "found",
            "results": serde_json::to_value(results)?,
        }),
        Outcome::NotFound { query: missing } => json!({
            "method": method,
            "query": query,
            "outcome": "not_found",
            "reason": format!("no match for '{}'", missing),
        }),
        Outcome::InsufficientData { reason } => json!({
            "method": method,
            "query": query,
            "outcome": "insufficient_data",
            "reason": reason,
        }),
    };

    writeln!(out, "{}", serde_json::to_string(&outcome_as_json)?)?;

    Ok(())
}
