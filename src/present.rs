use std::collections::BTreeSet;

use serde::Serialize;

use crate::grammar::{EPSILON, Grammar, Production, Symbol};
use crate::nullable::NullableSet;
use crate::utils::Result;

/// Alternatives as text, sorted lexicographically with ε last
pub fn sorted_alternatives(productions: &BTreeSet<Production>) -> Vec<String> {
    let mut alternatives: Vec<String> = productions.iter().map(|p| p.to_string()).collect();
    alternatives.sort_by(|a, b| {
        let a_eps = a.chars().eq([EPSILON]);
        let b_eps = b.chars().eq([EPSILON]);
        a_eps.cmp(&b_eps).then_with(|| a.cmp(b))
    });
    alternatives
}

/// Render a single rule as `S → aSb | ab | ε`
pub fn render_rule(lhs: &Symbol, productions: &BTreeSet<Production>) -> String {
    format!("{} → {}", lhs, sorted_alternatives(productions).join(" | "))
}

/// Render every rule of the grammar, one per line, in rule order
pub fn render_grammar(grammar: &Grammar) -> String {
    grammar
        .rules()
        .map(|(lhs, productions)| render_rule(lhs, productions))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a set of symbols as `{A, B, S}`
pub fn render_symbols(symbols: &BTreeSet<Symbol>) -> String {
    let names: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
    format!("{{{}}}", names.join(", "))
}

pub fn render_nullable(nullable: &NullableSet) -> String {
    render_symbols(nullable)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutput {
    pub lhs: String,
    pub alternatives: Vec<String>,
}

fn rule_outputs(grammar: &Grammar) -> Vec<RuleOutput> {
    grammar
        .rules()
        .map(|(lhs, productions)| RuleOutput {
            lhs: lhs.to_string(),
            alternatives: sorted_alternatives(productions),
        })
        .collect()
}

/// Everything the tool computes for one grammar, ready for JSON output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub start_symbol: Option<String>,
    pub non_terminals: Vec<String>,
    pub terminals: Vec<String>,
    pub original: Vec<RuleOutput>,
    pub nullable: Vec<String>,
    pub eliminated: Vec<RuleOutput>,
}

impl Report {
    pub fn new(original: &Grammar, nullable: &NullableSet, eliminated: &Grammar) -> Self {
        let names = |symbols: &BTreeSet<Symbol>| -> Vec<String> {
            symbols.iter().map(|s| s.to_string()).collect()
        };
        Report {
            start_symbol: original.start_symbol().map(|s| s.to_string()),
            non_terminals: names(&original.non_terminals()),
            terminals: names(&original.terminals()),
            original: rule_outputs(original),
            nullable: names(nullable),
            eliminated: rule_outputs(eliminated),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
