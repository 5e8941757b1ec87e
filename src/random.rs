use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::grammar::{Grammar, Production, Symbol};

const TERMINALS: [char; 5] = ['a', 'b', 'c', '0', '1'];

/// Shape of the grammars produced by `random_grammar`
#[derive(Debug, Clone)]
pub struct RandomGrammarConfig {
    /// Number of non-terminals, capped at 26 (`A` to `Z`)
    pub non_terminals: usize,
    /// Upper bound on alternatives per non-terminal
    pub max_alternatives: usize,
    /// Upper bound on symbols per alternative
    pub max_length: usize,
    /// Chance that an alternative is ε
    pub epsilon_probability: f64,
    /// Chance that a symbol is a non-terminal rather than a terminal
    pub non_terminal_probability: f64,
    pub seed: u64,
}

impl Default for RandomGrammarConfig {
    fn default() -> Self {
        RandomGrammarConfig {
            non_terminals: 4,
            max_alternatives: 3,
            max_length: 4,
            epsilon_probability: 0.2,
            non_terminal_probability: 0.5,
            seed: 0,
        }
    }
}

/// Generate a grammar from a seed. The same config always gives the same
/// grammar, and every rule has at least one alternative.
pub fn random_grammar(config: &RandomGrammarConfig) -> Grammar {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let epsilon_probability = config.epsilon_probability.clamp(0.0, 1.0);
    let non_terminal_probability = config.non_terminal_probability.clamp(0.0, 1.0);

    let names: Vec<Symbol> = ('A'..='Z')
        .take(config.non_terminals.clamp(1, 26))
        .map(Symbol::NonTerminal)
        .collect();

    let mut grammar = Grammar::new();
    for lhs in &names {
        let count = rng.gen_range(1..=config.max_alternatives.max(1));
        for _ in 0..count {
            let production = if rng.gen_bool(epsilon_probability) {
                Production::epsilon()
            } else {
                let len = rng.gen_range(1..=config.max_length.max(1));
                let symbols = (0..len)
                    .map(|_| {
                        if rng.gen_bool(non_terminal_probability) {
                            *names.choose(&mut rng).unwrap_or(lhs)
                        } else {
                            Symbol::Terminal(*TERMINALS.choose(&mut rng).unwrap_or(&'a'))
                        }
                    })
                    .collect();
                Production::new(symbols)
            };
            grammar.add_production(*lhs, production);
        }
    }

    grammar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::present::render_grammar;

    #[test]
    fn test_same_seed_same_grammar() {
        let config = RandomGrammarConfig {
            seed: 42,
            ..RandomGrammarConfig::default()
        };
        assert_eq!(random_grammar(&config), random_grammar(&config));
    }

    #[test]
    fn test_shape() {
        let config = RandomGrammarConfig {
            non_terminals: 40,
            max_alternatives: 2,
            max_length: 3,
            seed: 7,
            ..RandomGrammarConfig::default()
        };
        let grammar = random_grammar(&config);

        assert_eq!(grammar.len(), 26);
        assert_eq!(grammar.start_symbol(), Some(Symbol::NonTerminal('A')));
        for (_, productions) in grammar.rules() {
            assert!(!productions.is_empty() && productions.len() <= 2);
            assert!(productions.iter().all(|p| p.len() <= 3));
        }
    }

    #[test]
    fn test_output_can_be_loaded_back() {
        let grammar = random_grammar(&RandomGrammarConfig {
            seed: 3,
            ..RandomGrammarConfig::default()
        });
        let reloaded: Grammar = render_grammar(&grammar).parse().unwrap();
        assert_eq!(reloaded, grammar);
    }
}
