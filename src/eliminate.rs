//! Removal of ε-productions.
//!
//! Every alternative is kept as-is and supplemented with each variant obtained
//! by deleting a non-empty subset of its nullable occurrences. Direct ε
//! alternatives are dropped, and the start symbol gets a single ε back when it
//! is nullable.
//!
//! A variant that loses every symbol becomes an explicit ε alternative, even
//! for a non-start symbol, unlike the textbook construction.

use log::debug;

use crate::grammar::{Grammar, Production};
use crate::nullable::NullableSet;

/// Iterates over every non-empty subset of a list of positions.
///
/// Subsets are produced in binary counting order over the positions, the
/// first position being the least significant bit, so `k` positions give
/// exactly `2^k - 1` subsets.
#[derive(Debug, Clone)]
pub struct NullableSubsets {
    positions: Vec<usize>,
    mask: Vec<bool>,
    done: bool,
}

impl NullableSubsets {
    pub fn new(positions: Vec<usize>) -> Self {
        let mask = vec![false; positions.len()];
        let done = positions.is_empty();
        NullableSubsets {
            positions,
            mask,
            done,
        }
    }
}

impl Iterator for NullableSubsets {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }

        match self.mask.iter().position(|bit| !bit) {
            Some(i) => {
                self.mask[..i].fill(false);
                self.mask[i] = true;
                let subset = self
                    .positions
                    .iter()
                    .zip(&self.mask)
                    .filter(|(_, selected)| **selected)
                    .map(|(pos, _)| *pos)
                    .collect();
                Some(subset)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Every variant of `production` with at least one nullable occurrence deleted
fn reduced_variants<'a>(
    production: &'a Production,
    nullable: &NullableSet,
) -> impl Iterator<Item = Production> + 'a {
    let positions: Vec<usize> = production
        .symbols()
        .iter()
        .enumerate()
        .filter(|(_, symbol)| nullable.contains(*symbol))
        .map(|(pos, _)| pos)
        .collect();

    NullableSubsets::new(positions).map(move |removed| {
        let symbols = production
            .symbols()
            .iter()
            .enumerate()
            .filter(|(pos, _)| !removed.contains(pos))
            .map(|(_, symbol)| *symbol)
            .collect();
        Production::new(symbols)
    })
}

/// Build a new grammar without ε-productions, given the nullable set of
/// `grammar`. The input is left untouched.
pub fn eliminate_epsilon(grammar: &Grammar, nullable: &NullableSet) -> Grammar {
    let mut result = Grammar::new();

    for (lhs, productions) in grammar.rules() {
        let alternatives = result.ensure_rule(*lhs);
        for production in productions {
            if production.is_epsilon() {
                continue;
            }
            alternatives.extend(reduced_variants(production, nullable));
            alternatives.insert(production.clone());
        }
        debug!(
            "{}: {} alternative(s) became {}",
            lhs,
            productions.len(),
            alternatives.len()
        );
    }

    if let Some(start) = grammar.start_symbol() {
        if nullable.contains(&start) {
            result.add_production(start, Production::epsilon());
        }
    }

    result
}
