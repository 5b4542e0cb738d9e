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

use std::env;
use std::error::Error;
use std::io::Write;

use getopts::{Matches, Options};
use tracing::info;
use tracing_subscriber::EnvFilter;

use moviereco::io;
use moviereco::{
    content_recommendations, correlated_movies, estimate_rating, item_based_recommendations,
    predict_ratings, Config, Dataset,
};

const METHODS: [&str; 6] = ["all", "item", "correlation", "content", "regression", "estimate"];

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("", "movies", "Movies file (required), `movieId;title;genres` per line.", "PATH");
    opts.optopt("", "ratings", "Ratings file (required), `userId;movieId;rating;timestamp` per \
        line.", "PATH");
    opts.optopt("", "users", "Users file (required for the regression method), \
        `userId;gender;age;occupation;zip-code` per line.", "PATH");
    opts.optopt("m", "method", "Recommender to run: all, item, correlation, content, regression \
        or estimate (optional, defaults to all).", "METHOD");
    opts.optopt("t", "title", "Movie title to recommend for. A title fragment for the item and \
        content methods, the exact title for the correlation method.", "TEXT");
    opts.optopt("g", "genre", "Genre tag added to the content query, e.g. Comedy.", "TAG");
    opts.optopt("u", "user", "User id for the estimate method.", "ID");
    opts.optopt("", "movie", "Movie id for the estimate method.", "ID");
    opts.optopt("", "min-movie-votes", "Minimum number of ratings of a movie in the neighbour \
        search (optional, defaults to 40).", "NUMBER");
    opts.optopt("", "min-user-votes", "Minimum number of ratings of a user in the neighbour \
        search (optional, defaults to 90).", "NUMBER");
    opts.optopt("", "min-reviews", "Minimum number of ratings of a correlated movie (optional, \
        defaults to 80).", "NUMBER");
    opts.optopt("n", "num-recommendations", "Number of recommendations per query (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("k", "neighbors", "Size of the searched neighbourhood (optional, defaults to \
        20).", "NUMBER");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to stdout \
        by default).", "PATH");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let (movies_path, ratings_path) = match (matches.opt_str("movies"), matches.opt_str("ratings")) {
        (Some(movies_path), Some(ratings_path)) => (movies_path, ratings_path),
        _ => {
            return print_usage_and_exit(
                &program,
                opts,
                Some("Please specify the input files via --movies and --ratings."),
            );
        }
    };

    let method = matches.opt_str("m").unwrap_or_else(|| String::from("all"));
    if !METHODS.contains(&method.as_str()) {
        let hint = format!("Unknown method '{}'.", method);
        return print_usage_and_exit(&program, opts, Some(&hint));
    }

    let config = match config_from(&matches) {
        Ok(config) => config,
        Err(hint) => return print_usage_and_exit(&program, opts, Some(&hint)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let (user_id, movie_id) = match (optional_id(&matches, "u"), optional_id(&matches, "movie")) {
        (Ok(user_id), Ok(movie_id)) => (user_id, movie_id),
        (Err(hint), _) | (_, Err(hint)) => {
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let query = Query {
        method,
        title: matches.opt_str("t"),
        genre: matches.opt_str("g").unwrap_or_default(),
        user_id,
        movie_id,
    };

    if let Err(failure) = run(
        &movies_path,
        &ratings_path,
        matches.opt_str("users").as_ref().map(|path| path.as_str()),
        &query,
        &config,
        matches.opt_str("o"),
    ) {
        eprintln!("Error: {}", failure);
        std::process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    let brief = format!("Usage: {} --movies PATH --ratings PATH [options]", program);

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
        eprint!("{}", opts.usage(&brief));
        std::process::exit(2);
    }

    eprint!("{}", opts.usage(&brief));
}

fn config_from(matches: &Matches) -> Result<Config, String> {

    let defaults = Config::default();

    let config = Config {
        min_movie_votes: option(matches, "min-movie-votes", defaults.min_movie_votes)?,
        min_user_votes: option(matches, "min-user-votes", defaults.min_user_votes)?,
        min_reviews: option(matches, "min-reviews", defaults.min_reviews)?,
        num_recommendations: option(matches, "n", defaults.num_recommendations)?,
        neighbors: option(matches, "k", defaults.neighbors)?,
        ..defaults
    };

    config.validate().map_err(|failure| failure.to_string())?;

    Ok(config)
}

fn option<T>(matches: &Matches, name: &str, default: T) -> Result<T, String>
    where T: std::str::FromStr, T::Err: std::fmt::Display {

    matches.opt_get_default(name, default)
        .map_err(|failure| format!("Problem with option '{}': {}", name, failure))
}

/// An id option that may be absent but must be a valid id if given.
fn optional_id(matches: &Matches, name: &str) -> Result<Option<u32>, String> {
    matches.opt_get(name)
        .map_err(|failure| format!("Problem with option '{}': {}", name, failure))
}

struct Query {
    method: String,
    title: Option<String>,
    genre: String,
    user_id: Option<u32>,
    movie_id: Option<u32>,
}

impl Query {
    fn runs(&self, method: &str) -> bool {
        self.method == "all" || self.method == method
    }
}

fn run(
    movies_path: &str,
    ratings_path: &str,
    users_path: Option<&str>,
    query: &Query,
    config: &Config,
    output_path: Option<String>,
) -> Result<(), Box<dyn Error>> {

    let dataset: Dataset = io::read_dataset(movies_path, ratings_path, users_path)?;
    let mut out = io::output(output_path)?;

    if let Some(title) = query.title.as_ref() {

        if query.runs("item") {
            info!("Searching movies rated like '{}'", title);
            let outcome = item_based_recommendations(&dataset, title, config)?;
            io::write_outcome(&mut out, "item", title, &outcome)?;
        }

        if query.runs("correlation") {
            info!("Searching movies with ratings correlated to '{}'", title);
            let outcome = correlated_movies(&dataset, title, config)?;
            io::write_outcome(&mut out, "correlation", title, &outcome)?;
        }

        if query.runs("content") {
            info!("Searching movies described like '{}' {}", title, query.genre);
            let outcome = content_recommendations(&dataset, title, &query.genre, config)?;
            let text = format!("{} {}", title, query.genre);
            io::write_outcome(&mut out, "content", text.trim(), &outcome)?;
        }
    } else if query.runs("item") || query.runs("correlation") || query.runs("content") {
        info!("No --title given, skipping the title based recommenders");
    }

    if query.runs("estimate") {
        match (query.user_id, query.movie_id) {
            (Some(user_id), Some(movie_id)) => {
                let outcome = estimate_rating(&dataset, user_id, movie_id, config)?;
                let text = format!("user {} movie {}", user_id, movie_id);
                io::write_outcome(&mut out, "estimate", &text, &outcome)?;
            }
            _ => info!("No --user and --movie given, skipping the rating estimate"),
        }
    }

    if query.runs("regression") {
        if dataset.users.is_empty() {
            info!("No --users given, skipping the rating model");
        } else {
            let outcome = predict_ratings(&dataset, config)?;
            io::write_outcome(&mut out, "regression", "all ratings", &outcome)?;
        }
    }

    out.flush()?;

    Ok(())
}
