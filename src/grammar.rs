use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::utils::{GrammarError, Result};

/// The marker used for the empty string, both in grammar files and in output.
pub const EPSILON: char = 'ε';

/// A single grammar character.
///
/// Ordering is by kind first (non-terminals, terminals, epsilon) and then by
/// character, which keeps every set of symbols in a stable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// An uppercase letter that can be rewritten
    NonTerminal(char),
    /// A lowercase letter or a digit
    Terminal(char),
    /// The empty string marker
    Epsilon,
}

impl Symbol {
    /// Classify a character, returning `None` for anything that is not a
    /// grammar symbol.
    pub fn classify(c: char) -> Option<Symbol> {
        if c.is_ascii_uppercase() {
            Some(Symbol::NonTerminal(c))
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            Some(Symbol::Terminal(c))
        } else if c == EPSILON {
            Some(Symbol::Epsilon)
        } else {
            None
        }
    }

    /// Build a non-terminal, rejecting anything that is not uppercase.
    pub fn non_terminal(c: char) -> Result<Symbol> {
        match Symbol::classify(c) {
            Some(symbol @ Symbol::NonTerminal(_)) => Ok(symbol),
            _ => Err(GrammarError::InvalidNonTerminal(c)),
        }
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_char(&self) -> char {
        match self {
            Symbol::NonTerminal(c) | Symbol::Terminal(c) => *c,
            Symbol::Epsilon => EPSILON,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One right-hand-side alternative.
///
/// An empty sequence is never stored: it is normalised to a production made
/// of the single epsilon marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Production {
    symbols: Vec<Symbol>,
}

impl Production {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        if symbols.is_empty() {
            Production::epsilon()
        } else {
            Production { symbols }
        }
    }

    /// The production consisting of exactly the epsilon marker
    pub fn epsilon() -> Self {
        Production {
            symbols: vec![Symbol::Epsilon],
        }
    }

    pub fn is_epsilon(&self) -> bool {
        self.symbols == [Symbol::Epsilon]
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate over the non-terminals of this production, in order
    pub fn non_terminals(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.symbols.iter().filter(|s| s.is_non_terminal())
    }

    /// Parse an alternative such as `aSb` or `ε`.
    ///
    /// The epsilon marker is only accepted on its own.
    pub fn parse(text: &str) -> Result<Production> {
        let text = text.trim();
        if text.chars().count() == 1 && text.starts_with(EPSILON) {
            return Ok(Production::epsilon());
        }

        if text.is_empty() {
            return Err(GrammarError::InvalidProduction(
                "empty alternative".to_string(),
            ));
        }

        let symbols = text
            .chars()
            .map(|c| match Symbol::classify(c) {
                Some(Symbol::Epsilon) | None => Err(GrammarError::InvalidProduction(format!(
                    "unexpected '{}' in \"{}\"",
                    c, text
                ))),
                Some(symbol) => Ok(symbol),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Production { symbols })
    }
}

impl FromStr for Production {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        Production::parse(s)
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

/// Configuration options for the grammar loader
#[derive(Debug, Clone)]
pub struct GrammarConfig {
    /// Accept `->` as well as `→` between the left and right-hand sides
    pub allow_ascii_arrow: bool,
    /// Skip lines starting with `#` instead of rejecting them
    pub allow_comments: bool,
    /// Union the alternatives of a non-terminal defined on several lines.
    /// When off, a later line replaces the earlier alternatives.
    pub merge_repeated_rules: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        GrammarConfig {
            allow_ascii_arrow: false,
            allow_comments: false,
            merge_repeated_rules: false,
        }
    }
}

const ALTERNATIVE: &str = r"(?:[A-Za-z0-9]+|ε)";

fn production_regex(allow_ascii_arrow: bool) -> &'static Regex {
    static UNICODE: OnceLock<Regex> = OnceLock::new();
    static ASCII: OnceLock<Regex> = OnceLock::new();

    let (cell, arrow) = if allow_ascii_arrow {
        (&ASCII, "(?:→|->)")
    } else {
        (&UNICODE, "→")
    };
    cell.get_or_init(|| {
        let pattern = format!(
            r"^(?P<lhs>[A-Z])\s*{arrow}\s*(?P<rhs>{alt}(?:\s*\|\s*{alt})*)$",
            arrow = arrow,
            alt = ALTERNATIVE
        );
        Regex::new(&pattern).expect("production pattern is a valid regex")
    })
}

/// A context-free grammar: non-terminals mapped to sets of alternatives.
///
/// Rules keep the order in which their left-hand sides first appeared; the
/// first one is the start symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    order: Vec<Symbol>,
    rules: HashMap<Symbol, BTreeSet<Production>>,
}

impl Grammar {
    /// Create a new empty grammar
    pub fn new() -> Self {
        Grammar::default()
    }

    /// Load a grammar from a file, failing on the first invalid line
    pub fn from_file<P: AsRef<Path>>(path: P, config: &GrammarConfig) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source: io::Error| GrammarError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let reader = io::BufReader::new(file);
        let mut grammar = Grammar::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            grammar.load_line(idx + 1, &line, config)?;
        }

        debug!(
            "loaded {} rule(s) from {}",
            grammar.len(),
            path.display()
        );
        Ok(grammar)
    }

    /// Parse a grammar from text, one rule per line
    pub fn parse(text: &str, config: &GrammarConfig) -> Result<Self> {
        let mut grammar = Grammar::new();
        for (idx, line) in text.lines().enumerate() {
            grammar.load_line(idx + 1, line, config)?;
        }
        Ok(grammar)
    }

    fn load_line(&mut self, line_num: usize, line: &str, config: &GrammarConfig) -> Result<()> {
        let trimmed = line.trim();

        // Skip empty lines and, when enabled, comments
        if trimmed.is_empty() || (config.allow_comments && trimmed.starts_with('#')) {
            return Ok(());
        }

        let captures = production_regex(config.allow_ascii_arrow)
            .captures(trimmed)
            .ok_or_else(|| GrammarError::Syntax {
                line: line_num,
                text: trimmed.to_string(),
            })?;

        let lhs = match captures["lhs"].chars().next().and_then(Symbol::classify) {
            Some(symbol @ Symbol::NonTerminal(_)) => symbol,
            _ => {
                return Err(GrammarError::Syntax {
                    line: line_num,
                    text: trimmed.to_string(),
                });
            }
        };

        let mut productions = BTreeSet::new();
        for alternative in captures["rhs"].split('|').map(str::trim) {
            productions.insert(Self::load_alternative(line_num, alternative)?);
        }

        debug!(
            "line {}: {} with {} alternative(s)",
            line_num,
            lhs,
            productions.len()
        );

        if config.merge_repeated_rules {
            for production in productions {
                self.add_production(lhs, production);
            }
        } else {
            self.insert_rule(lhs, productions);
        }
        Ok(())
    }

    fn load_alternative(line_num: usize, alternative: &str) -> Result<Production> {
        if alternative == EPSILON.to_string() {
            return Ok(Production::epsilon());
        }

        let mut symbols = Vec::with_capacity(alternative.len());
        for c in alternative.chars() {
            match Symbol::classify(c) {
                Some(Symbol::Epsilon) | None => {
                    return Err(GrammarError::InvalidSymbol {
                        line: line_num,
                        symbol: c,
                    });
                }
                Some(symbol) => symbols.push(symbol),
            }
        }
        Ok(Production::new(symbols))
    }

    /// Add alternatives for a non-terminal, e.g. `add_rule('S', &["aSb", "ε"])`.
    ///
    /// Alternatives are merged with any already present for `lhs`.
    pub fn add_rule(&mut self, lhs: char, alternatives: &[&str]) -> Result<&mut Self> {
        let lhs = Symbol::non_terminal(lhs)?;
        let productions = alternatives
            .iter()
            .map(|alt| Production::parse(alt))
            .collect::<Result<Vec<_>>>()?;

        self.ensure_rule(lhs);
        for production in productions {
            self.add_production(lhs, production);
        }
        Ok(self)
    }

    /// Register `lhs` with no alternatives if it is not present yet
    pub(crate) fn ensure_rule(&mut self, lhs: Symbol) -> &mut BTreeSet<Production> {
        if !self.rules.contains_key(&lhs) {
            self.order.push(lhs);
        }
        self.rules.entry(lhs).or_default()
    }

    /// Add one alternative to `lhs`, keeping the set free of duplicates
    pub(crate) fn add_production(&mut self, lhs: Symbol, production: Production) -> bool {
        self.ensure_rule(lhs).insert(production)
    }

    /// Replace the alternatives of `lhs`; a new key goes to the end
    pub(crate) fn insert_rule(&mut self, lhs: Symbol, productions: BTreeSet<Production>) {
        *self.ensure_rule(lhs) = productions;
    }

    /// Iterate over the rules in first-appearance order
    pub fn rules(&self) -> impl Iterator<Item = (&Symbol, &BTreeSet<Production>)> + '_ {
        self.order.iter().map(move |lhs| (lhs, &self.rules[lhs]))
    }

    /// Get the alternatives of a non-terminal
    pub fn productions(&self, lhs: char) -> Option<&BTreeSet<Production>> {
        self.rules.get(&Symbol::NonTerminal(lhs))
    }

    /// Check whether a non-terminal has a rule in this grammar
    pub fn has_non_terminal(&self, lhs: char) -> bool {
        self.rules.contains_key(&Symbol::NonTerminal(lhs))
    }

    /// The first left-hand side added to the grammar
    pub fn start_symbol(&self) -> Option<Symbol> {
        self.order.first().copied()
    }

    /// Every non-terminal mentioned on either side of a rule
    pub fn non_terminals(&self) -> BTreeSet<Symbol> {
        let mut symbols: BTreeSet<Symbol> = self.order.iter().copied().collect();
        symbols.extend(
            self.rules
                .values()
                .flatten()
                .flat_map(|p| p.non_terminals().copied()),
        );
        symbols
    }

    /// Every terminal used in some alternative
    pub fn terminals(&self) -> BTreeSet<Symbol> {
        self.rules
            .values()
            .flatten()
            .flat_map(|p| p.symbols().iter().copied())
            .filter(Symbol::is_terminal)
            .collect()
    }

    /// Number of rules (left-hand sides)
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromStr for Grammar {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        Grammar::parse(s, &GrammarConfig::default())
    }
}

/// Builder for constructing Grammar instances
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    grammar: Grammar,
    error: Option<GrammarError>,
}

impl GrammarBuilder {
    /// Create a new, empty grammar builder
    pub fn new() -> Self {
        GrammarBuilder::default()
    }

    /// Add alternatives for a non-terminal. The first error is kept and
    /// reported by `build`.
    pub fn add_rule(mut self, lhs: char, alternatives: &[&str]) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.grammar.add_rule(lhs, alternatives) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Build the grammar
    pub fn build(self) -> Result<Grammar> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.grammar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternatives(grammar: &Grammar, lhs: char) -> Vec<String> {
        grammar
            .productions(lhs)
            .unwrap()
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(Symbol::classify('S'), Some(Symbol::NonTerminal('S')));
        assert_eq!(Symbol::classify('a'), Some(Symbol::Terminal('a')));
        assert_eq!(Symbol::classify('7'), Some(Symbol::Terminal('7')));
        assert_eq!(Symbol::classify('ε'), Some(Symbol::Epsilon));
        assert_eq!(Symbol::classify('+'), None);
        assert!(Symbol::non_terminal('a').is_err());
    }

    #[test]
    fn test_parse_production() {
        let production = Production::parse("aSb").unwrap();
        assert_eq!(
            production.symbols(),
            &[
                Symbol::Terminal('a'),
                Symbol::NonTerminal('S'),
                Symbol::Terminal('b')
            ]
        );
        assert_eq!(production.non_terminals().count(), 1);

        assert!(Production::parse("ε").unwrap().is_epsilon());
        assert!(Production::parse("").is_err());
        assert!(Production::parse("aε").is_err());
        assert!(Production::parse("a+b").is_err());
    }

    #[test]
    fn test_empty_production_is_epsilon() {
        assert!(Production::new(Vec::new()).is_epsilon());
        assert_eq!(Production::new(Vec::new()).to_string(), "ε");
    }

    #[test]
    fn test_parse_grammar() {
        let grammar: Grammar = "S → aSb | ε\n\nA → B1 | c".parse().unwrap();

        assert_eq!(grammar.len(), 2);
        assert_eq!(grammar.start_symbol(), Some(Symbol::NonTerminal('S')));
        assert_eq!(alternatives(&grammar, 'S'), vec!["aSb", "ε"]);
        assert_eq!(alternatives(&grammar, 'A'), vec!["B1", "c"]);
        assert!(!grammar.has_non_terminal('B'));

        let non_terminals: Vec<char> = grammar.non_terminals().iter().map(Symbol::as_char).collect();
        assert_eq!(non_terminals, vec!['A', 'B', 'S']);
        let terminals: Vec<char> = grammar.terminals().iter().map(Symbol::as_char).collect();
        assert_eq!(terminals, vec!['1', 'a', 'b', 'c']);
    }

    #[test]
    fn test_duplicate_alternatives_collapse() {
        let grammar: Grammar = "S → ab | ab | ab".parse().unwrap();
        assert_eq!(alternatives(&grammar, 'S'), vec!["ab"]);
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = "S → a\n\nS = b".parse::<Grammar>().unwrap_err();
        match err {
            GrammarError::Syntax { line, text } => {
                assert_eq!(line, 3);
                assert_eq!(text, "S = b");
            }
            other => panic!("Expected syntax error, got {:?}", other),
        }

        assert!(matches!(
            "s → a".parse::<Grammar>(),
            Err(GrammarError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            "S → a |".parse::<Grammar>(),
            Err(GrammarError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            "S → aε".parse::<Grammar>(),
            Err(GrammarError::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn test_ascii_arrow_and_comments() {
        let text = "# balanced\nS -> aSb | ε";
        assert!(text.parse::<Grammar>().is_err());

        let config = GrammarConfig {
            allow_ascii_arrow: true,
            allow_comments: true,
            ..GrammarConfig::default()
        };
        let grammar = Grammar::parse(text, &config).unwrap();
        assert_eq!(alternatives(&grammar, 'S'), vec!["aSb", "ε"]);
    }

    #[test]
    fn test_repeated_rules() {
        let text = "S → A\nA → a\nS → b";

        let grammar: Grammar = text.parse().unwrap();
        assert_eq!(grammar.start_symbol(), Some(Symbol::NonTerminal('S')));
        assert_eq!(alternatives(&grammar, 'S'), vec!["b"]);

        let config = GrammarConfig {
            merge_repeated_rules: true,
            ..GrammarConfig::default()
        };
        let grammar = Grammar::parse(text, &config).unwrap();
        assert_eq!(alternatives(&grammar, 'S'), vec!["A", "b"]);
        assert_eq!(grammar.len(), 2);
    }

    #[test]
    fn test_grammar_builder() {
        let grammar = GrammarBuilder::new()
            .add_rule('S', &["AB"])
            .add_rule('A', &["a", "ε"])
            .add_rule('A', &["a"])
            .build()
            .unwrap();

        let order: Vec<char> = grammar.rules().map(|(lhs, _)| lhs.as_char()).collect();
        assert_eq!(order, vec!['S', 'A']);
        assert_eq!(alternatives(&grammar, 'A'), vec!["a", "ε"]);

        let err = GrammarBuilder::new()
            .add_rule('s', &["a"])
            .add_rule('S', &["a"])
            .build()
            .unwrap_err();
        assert!(matches!(err, GrammarError::InvalidNonTerminal('s')));
    }
}
