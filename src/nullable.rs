//! Nullable non-terminals: the symbols that can derive the empty string.
//!
//! The solver runs a repeated full-pass fixpoint over the rules. A
//! non-terminal joins the set when one of its alternatives has only nullable
//! non-terminals; terminals in that alternative are not looked at, so `S → aB`
//! with `B` nullable makes `S` nullable as well.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::grammar::{Grammar, Production, Symbol};
use crate::present::render_nullable;

/// The set of nullable non-terminals
pub type NullableSet = BTreeSet<Symbol>;

/// Hooks called while the nullable set is being computed.
///
/// Every method has an empty default so observers only implement what they
/// care about.
pub trait NullableObserver {
    /// Called once with the non-terminals that have a direct ε alternative
    fn on_seed(&mut self, _nullable: &NullableSet) {}

    /// Called after every full pass over the rules
    fn on_pass(&mut self, _pass: usize, _added: &[Symbol], _nullable: &NullableSet) {}

    /// Called once with the final set
    fn on_complete(&mut self, _nullable: &NullableSet) {}
}

/// An observer that does nothing
#[derive(Debug, Clone, Default)]
pub struct NoopObserver;

impl NullableObserver for NoopObserver {}

/// Reports progress through the `log` facade
#[derive(Debug, Clone, Default)]
pub struct LogObserver;

impl NullableObserver for LogObserver {
    fn on_seed(&mut self, nullable: &NullableSet) {
        debug!("directly nullable: {}", render_nullable(nullable));
    }

    fn on_pass(&mut self, pass: usize, added: &[Symbol], nullable: &NullableSet) {
        debug!(
            "pass {}: added {} symbol(s), {} nullable",
            pass,
            added.len(),
            nullable.len()
        );
    }

    fn on_complete(&mut self, nullable: &NullableSet) {
        info!("nullable symbols: {}", render_nullable(nullable));
    }
}

/// Records a snapshot of the set after the seed step and after every pass
#[derive(Debug, Clone, Default)]
pub struct TraceObserver {
    pub snapshots: Vec<NullableSet>,
}

impl TraceObserver {
    pub fn new() -> Self {
        TraceObserver::default()
    }

    /// Number of passes made, not counting the seed step
    pub fn passes(&self) -> usize {
        self.snapshots.len().saturating_sub(1)
    }
}

impl NullableObserver for TraceObserver {
    fn on_seed(&mut self, nullable: &NullableSet) {
        self.snapshots.push(nullable.clone());
    }

    fn on_pass(&mut self, _pass: usize, _added: &[Symbol], nullable: &NullableSet) {
        self.snapshots.push(nullable.clone());
    }
}

/// Compute the nullable non-terminals of `grammar`, logging the result.
pub fn compute_nullable(grammar: &Grammar) -> NullableSet {
    compute_nullable_with(grammar, &mut LogObserver)
}

/// Compute the nullable non-terminals of `grammar`, reporting to `observer`.
///
/// Terminates after at most one pass per non-terminal plus a final pass that
/// adds nothing.
pub fn compute_nullable_with<O>(grammar: &Grammar, observer: &mut O) -> NullableSet
where
    O: NullableObserver + ?Sized,
{
    let mut nullable: NullableSet = grammar
        .rules()
        .filter(|(_, productions)| productions.iter().any(Production::is_epsilon))
        .map(|(lhs, _)| *lhs)
        .collect();
    observer.on_seed(&nullable);

    let mut pass = 0;
    let mut changed = true;
    while changed {
        changed = false;
        pass += 1;

        let mut added = Vec::new();
        for (lhs, productions) in grammar.rules() {
            if nullable.contains(lhs) {
                continue;
            }

            let derives_empty = productions
                .iter()
                .any(|p| p.non_terminals().all(|s| nullable.contains(s)));
            if derives_empty {
                nullable.insert(*lhs);
                added.push(*lhs);
                changed = true;
            }
        }

        observer.on_pass(pass, &added, &nullable);
    }

    observer.on_complete(&nullable);
    nullable
}
