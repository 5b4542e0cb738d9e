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
use std::collections::BinaryHeap;

/// Whether small or large scores rank first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Candidate for the top-k selection. `position` is the order in which candidates were offered
/// and breaks ties, so that equally scored items keep their original order.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ScoredItem {
    pub item: u32,
    pub score: f64,
    position: usize,
    direction: Direction,
}

/// Ordering for our max-heap: the greatest element is the worst ranked one, so it sits on top of
/// the heap and gets replaced first. We must use a special implementation here as there is no
/// total order on floating point numbers.
fn cmp_rank(scored_item_a: &ScoredItem, scored_item_b: &ScoredItem) -> Ordering {

    let by_score = match scored_item_a.score.partial_cmp(&scored_item_b.score) {
        Some(ordering) => ordering,
        None => Ordering::Equal,
    };

    let by_score = match scored_item_a.direction {
        Direction::Ascending => by_score,
        Direction::Descending => by_score.reverse(),
    };

    by_score.then_with(|| scored_item_a.position.cmp(&scored_item_b.position))
}

impl Eq for ScoredItem {}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_rank(self, other)
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_rank(self, other))
    }
}

/// Selects the `k` best of the `(item, score)` candidates, best first. Candidates with a NaN
/// score are skipped.
pub fn top_k<I>(candidates: I, k: usize, direction: Direction) -> Vec<ScoredItem>
    where I: IntoIterator<Item=(u32, f64)> {

    if k == 0 {
        return Vec::new();
    }

    let mut heap = BinaryHeap::with_capacity(k);

    for (position, (item, score)) in candidates.into_iter().enumerate() {

        if score.is_nan() {
            continue;
        }

        let scored_item = ScoredItem { item, score, position, direction };

        if heap.len() < k {
            heap.push(scored_item);
        } else if let Some(mut top) = heap.peek_mut() {
            if scored_item < *top {
                *top = scored_item;
            }
        }
    }

    heap.into_sorted_vec()
}
