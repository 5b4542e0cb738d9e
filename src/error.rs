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

use thiserror::Error;

/// Setup-time failures. Anything that only concerns a single query is reported through
/// `types::Outcome` instead.
#[derive(Debug, Error)]
pub enum MovieRecoError {
    #[error("invalid configuration: {parameter} = {value} ({constraint})")]
    InvalidConfig {
        parameter: &'static str,
        value: String,
        constraint: &'static str,
    },

    #[error("dataset '{0}' is empty")]
    EmptyDataset(&'static str),

    #[error("malformed record in '{table}' at line {line}: {message}")]
    MalformedRecord {
        table: &'static str,
        line: u64,
        message: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MovieRecoError>;

impl MovieRecoError {

    pub(crate) fn invalid_config<V: ToString>(
        parameter: &'static str,
        value: V,
        constraint: &'static str,
    ) -> Self {
        MovieRecoError::InvalidConfig { parameter, value: value.to_string(), constraint }
    }
}
