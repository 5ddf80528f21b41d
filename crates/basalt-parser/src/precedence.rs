//! Operator precedence groups and the pairwise priority table.
//!
//! The table is built at compile time from a list of "higher-than"
//! edges: the transitive closure is computed, the relation is made
//! symmetric, and the diagonal is filled with per-level associativity.
//! Pairs left untouched are ambiguous and require explicit parentheses.

use basalt_lexer::TokenKind;

/// How two adjacent operators in `a $ b @ c` group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum OperatorPriority {
    /// `(a $ b) @ c`
    LeftFirst = -1,
    /// No relative priority; parenthesise.
    Ambiguous = 0,
    /// `a $ (b @ c)`
    RightFirst = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum Associativity {
    LeftToRight = -1,
    None = 0,
    RightToLeft = 1,
}

/// The precedence ladder. `Highest` and `Lowest` are sentinels that do
/// not correspond to any operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
enum PrecedenceLevel {
    Highest,
    // Terms.
    TermPrefix,
    // Numeric.
    IncrementDecrement,
    NumericPrefix,
    Modulo,
    Multiplicative,
    Additive,
    // Bitwise.
    BitwisePrefix,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitShift,
    // Type formation.
    TypePrefix,
    TypePostfix,
    // Casts.
    As,
    // Logical.
    LogicalPrefix,
    Relational,
    LogicalAnd,
    LogicalOr,
    // Conditional.
    If,
    // Assignment.
    Assignment,
    Lowest,
}

const NUM_PRECEDENCE_LEVELS: usize = PrecedenceLevel::Lowest as usize + 1;

type PriorityTable = [[OperatorPriority; NUM_PRECEDENCE_LEVELS]; NUM_PRECEDENCE_LEVELS];

const fn build_priority_table() -> PriorityTable {
    use OperatorPriority::{Ambiguous, LeftFirst, RightFirst};
    use PrecedenceLevel::*;

    let mut table = [[Ambiguous; NUM_PRECEDENCE_LEVELS]; NUM_PRECEDENCE_LEVELS];

    // Higher-precedence, lower-precedence relationships.
    const EDGES: &[(&[PrecedenceLevel], &[PrecedenceLevel])] = &[
        (&[Highest], &[TermPrefix, LogicalPrefix]),
        (&[TermPrefix], &[NumericPrefix, BitwisePrefix, IncrementDecrement]),
        (
            &[NumericPrefix, BitwisePrefix],
            &[As, Multiplicative, Modulo, BitwiseAnd, BitwiseOr, BitwiseXor, BitShift],
        ),
        (&[Multiplicative], &[Additive]),
        (
            &[As, Additive, Modulo, BitwiseAnd, BitwiseOr, BitwiseXor, BitShift],
            &[Relational],
        ),
        (&[Relational, LogicalPrefix], &[LogicalAnd, LogicalOr]),
        (&[LogicalAnd, LogicalOr], &[If]),
        (&[If], &[Assignment]),
        (&[Assignment, IncrementDecrement], &[Lowest]),
        // Types are mostly a separate precedence graph.
        (&[Highest], &[TypePrefix]),
        (&[TypePrefix], &[TypePostfix]),
        (&[TypePostfix], &[As]),
    ];

    let mut e = 0;
    while e < EDGES.len() {
        let (higher_group, lower_group) = EDGES[e];
        let mut h = 0;
        while h < higher_group.len() {
            let mut l = 0;
            while l < lower_group.len() {
                table[higher_group[h] as usize][lower_group[l] as usize] = LeftFirst;
                l += 1;
            }
            h += 1;
        }
        e += 1;
    }

    // Transitive closure: if we parse `a $ b @ c` as `(a $ b) @ c` and
    // `b @ c % d` as `(b @ c) % d`, we must parse `a $ bc % d` as
    // `(a $ bc) % d`.
    let mut changed = true;
    while changed {
        changed = false;
        let mut a = 0;
        while a < NUM_PRECEDENCE_LEVELS {
            let mut b = 0;
            while b < NUM_PRECEDENCE_LEVELS {
                if matches!(table[a][b], LeftFirst) {
                    let mut c = 0;
                    while c < NUM_PRECEDENCE_LEVELS {
                        if matches!(table[b][c], LeftFirst)
                            && !matches!(table[a][c], LeftFirst)
                        {
                            table[a][c] = LeftFirst;
                            changed = true;
                        }
                        c += 1;
                    }
                }
                b += 1;
            }
            a += 1;
        }
    }

    // Make the relation symmetric.
    let mut a = 0;
    while a < NUM_PRECEDENCE_LEVELS {
        let mut b = 0;
        while b < NUM_PRECEDENCE_LEVELS {
            if matches!(table[a][b], LeftFirst) {
                assert!(
                    !matches!(table[b][a], LeftFirst),
                    "inconsistent lookup table entries"
                );
                table[b][a] = RightFirst;
            }
            b += 1;
        }
        a += 1;
    }

    // Associativity rules occupy the diagonal. Prefix operators chain
    // rightwards; postfix operators leftwards.
    const RIGHT_ASSOC: &[PrecedenceLevel] = &[TermPrefix, If];
    const LEFT_ASSOC: &[PrecedenceLevel] = &[
        TypePostfix,
        Multiplicative,
        Additive,
        BitwiseAnd,
        BitwiseOr,
        BitwiseXor,
        LogicalAnd,
        LogicalOr,
    ];
    let mut i = 0;
    while i < RIGHT_ASSOC.len() {
        table[RIGHT_ASSOC[i] as usize][RIGHT_ASSOC[i] as usize] = RightFirst;
        i += 1;
    }
    let mut i = 0;
    while i < LEFT_ASSOC.len() {
        table[LEFT_ASSOC[i] as usize][LEFT_ASSOC[i] as usize] = LeftFirst;
        i += 1;
    }
    // All other operators require explicit parentheses.

    table
}

static PRIORITY_TABLE: PriorityTable = build_priority_table();

/// The precedence group of an operator or expression context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrecedenceGroup {
    level: u8,
}

/// Trailing (infix or postfix) operator information.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trailing {
    pub level: PrecedenceGroup,
    /// True for binary infix operators, false for unary postfix.
    pub is_binary: bool,
}

impl PrecedenceGroup {
    const fn new(level: PrecedenceLevel) -> Self {
        Self { level: level as u8 }
    }

    /// Sentinel for postfix expressions: all operators bind looser.
    pub fn for_postfix_expression() -> PrecedenceGroup {
        Self::new(PrecedenceLevel::Highest)
    }

    /// Top-level or parenthesised expressions: all operators bind
    /// tighter.
    pub fn for_top_level_expression() -> PrecedenceGroup {
        Self::new(PrecedenceLevel::If)
    }

    /// Expression statements admit statement-level operators such as
    /// assignment.
    pub fn for_expression_statement() -> PrecedenceGroup {
        Self::new(PrecedenceLevel::Lowest)
    }

    /// Type expressions share the top-level expression context.
    pub fn for_type() -> PrecedenceGroup {
        Self::for_top_level_expression()
    }

    /// The prefix operator group for a leading token, if any.
    pub fn for_leading(kind: TokenKind) -> Option<PrecedenceGroup> {
        match kind {
            TokenKind::Star | TokenKind::Amp => {
                Some(Self::new(PrecedenceLevel::TermPrefix))
            }
            TokenKind::Not => Some(Self::new(PrecedenceLevel::LogicalPrefix)),
            TokenKind::Minus => Some(Self::new(PrecedenceLevel::NumericPrefix)),
            TokenKind::MinusMinus | TokenKind::PlusPlus => {
                Some(Self::new(PrecedenceLevel::IncrementDecrement))
            }
            TokenKind::Caret => Some(Self::new(PrecedenceLevel::BitwisePrefix)),
            TokenKind::If => Some(Self::new(PrecedenceLevel::If)),
            TokenKind::Const => Some(Self::new(PrecedenceLevel::TypePrefix)),
            _ => None,
        }
    }

    /// The trailing operator information for a token, if any. `infix`
    /// disambiguates tokens that are valid both as infix and postfix
    /// operators (`*` as multiplication versus pointer type formation).
    pub fn for_trailing(kind: TokenKind, infix: bool) -> Option<Trailing> {
        let binary = |level| Some(Trailing { level: Self::new(level), is_binary: true });
        match kind {
            // Assignment operators.
            TokenKind::Equal
            | TokenKind::PlusEqual
            | TokenKind::MinusEqual
            | TokenKind::StarEqual
            | TokenKind::SlashEqual
            | TokenKind::PercentEqual
            | TokenKind::AmpEqual
            | TokenKind::PipeEqual
            | TokenKind::CaretEqual
            | TokenKind::GreaterGreaterEqual
            | TokenKind::LessLessEqual => binary(PrecedenceLevel::Assignment),

            // Logical operators.
            TokenKind::And => binary(PrecedenceLevel::LogicalAnd),
            TokenKind::Or => binary(PrecedenceLevel::LogicalOr),

            // Bitwise operators.
            TokenKind::Amp => binary(PrecedenceLevel::BitwiseAnd),
            TokenKind::Pipe => binary(PrecedenceLevel::BitwiseOr),
            TokenKind::Caret => binary(PrecedenceLevel::BitwiseXor),
            TokenKind::GreaterGreater | TokenKind::LessLess => {
                binary(PrecedenceLevel::BitShift)
            }

            // Relational operators.
            TokenKind::EqualEqual
            | TokenKind::ExclaimEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::LessEqualGreater => binary(PrecedenceLevel::Relational),

            // Additive operators.
            TokenKind::Plus | TokenKind::Minus => binary(PrecedenceLevel::Additive),

            // Multiplicative operators.
            TokenKind::Slash => binary(PrecedenceLevel::Multiplicative),
            TokenKind::Percent => binary(PrecedenceLevel::Modulo),

            // `*` is multiplication when infix, pointer type formation
            // when postfix.
            TokenKind::Star => {
                if infix {
                    binary(PrecedenceLevel::Multiplicative)
                } else {
                    Some(Trailing {
                        level: Self::new(PrecedenceLevel::TypePostfix),
                        is_binary: false,
                    })
                }
            }

            // Cast operator.
            TokenKind::As => binary(PrecedenceLevel::As),

            _ => None,
        }
    }

    /// The relative priority of two adjacent operator groups.
    pub fn priority(left: PrecedenceGroup, right: PrecedenceGroup) -> OperatorPriority {
        PRIORITY_TABLE[left.level as usize][right.level as usize]
    }

    pub fn associativity(self) -> Associativity {
        match Self::priority(self, self) {
            OperatorPriority::LeftFirst => Associativity::LeftToRight,
            OperatorPriority::Ambiguous => Associativity::None,
            OperatorPriority::RightFirst => Associativity::RightToLeft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(level: PrecedenceLevel) -> PrecedenceGroup {
        PrecedenceGroup::new(level)
    }

    #[test]
    fn sentinels_dominate_everything() {
        for level in 0..NUM_PRECEDENCE_LEVELS as u8 {
            let other = PrecedenceGroup { level };
            if other != PrecedenceGroup::for_postfix_expression() {
                assert_eq!(
                    PrecedenceGroup::priority(
                        PrecedenceGroup::for_postfix_expression(),
                        other
                    ),
                    OperatorPriority::LeftFirst
                );
            }
            let lowest = group(PrecedenceLevel::Lowest);
            if other != lowest {
                assert_eq!(
                    PrecedenceGroup::priority(lowest, other),
                    OperatorPriority::RightFirst
                );
                assert_eq!(
                    PrecedenceGroup::priority(other, lowest),
                    OperatorPriority::LeftFirst
                );
            }
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            PrecedenceGroup::priority(
                group(PrecedenceLevel::Multiplicative),
                group(PrecedenceLevel::Additive)
            ),
            OperatorPriority::LeftFirst
        );
        assert_eq!(
            PrecedenceGroup::priority(
                group(PrecedenceLevel::Additive),
                group(PrecedenceLevel::Multiplicative)
            ),
            OperatorPriority::RightFirst
        );
    }

    #[test]
    fn transitive_closure_reaches_distant_levels() {
        // Multiplicative > Additive > Relational > LogicalAnd.
        assert_eq!(
            PrecedenceGroup::priority(
                group(PrecedenceLevel::Multiplicative),
                group(PrecedenceLevel::LogicalAnd)
            ),
            OperatorPriority::LeftFirst
        );
    }

    #[test]
    fn mixed_bitwise_levels_are_ambiguous() {
        assert_eq!(
            PrecedenceGroup::priority(
                group(PrecedenceLevel::BitwiseAnd),
                group(PrecedenceLevel::BitwiseOr)
            ),
            OperatorPriority::Ambiguous
        );
    }

    #[test]
    fn associativity_on_the_diagonal() {
        assert_eq!(
            group(PrecedenceLevel::Additive).associativity(),
            Associativity::LeftToRight
        );
        assert_eq!(
            group(PrecedenceLevel::Assignment).associativity(),
            Associativity::None
        );
        assert_eq!(
            group(PrecedenceLevel::TermPrefix).associativity(),
            Associativity::RightToLeft
        );
    }

    #[test]
    fn leading_lookups() {
        assert!(PrecedenceGroup::for_leading(TokenKind::Minus).is_some());
        assert!(PrecedenceGroup::for_leading(TokenKind::Not).is_some());
        assert!(PrecedenceGroup::for_leading(TokenKind::Star).is_some());
        assert!(PrecedenceGroup::for_leading(TokenKind::Plus).is_none());
        assert!(PrecedenceGroup::for_leading(TokenKind::Identifier).is_none());
    }

    #[test]
    fn trailing_lookups_disambiguate_star() {
        let infix = PrecedenceGroup::for_trailing(TokenKind::Star, true).unwrap();
        assert!(infix.is_binary);
        let postfix = PrecedenceGroup::for_trailing(TokenKind::Star, false).unwrap();
        assert!(!postfix.is_binary);

        assert!(PrecedenceGroup::for_trailing(TokenKind::Plus, true)
            .unwrap()
            .is_binary);
        assert!(PrecedenceGroup::for_trailing(TokenKind::Semi, true).is_none());
        assert!(PrecedenceGroup::for_trailing(TokenKind::MinusGreater, true).is_none());
    }
}
