//! The closed token kind catalogue and its static property tables.
//!
//! Every kind, its spelling, and its bracket pairing comes from the one
//! declarative list at the bottom of this file. The lexer's symbol
//! matching walks the symbol kinds in declaration order, so symbol
//! entries must stay sorted by descending spelling length within the
//! `symbols` section; the grouping and one-char sections hold only
//! single-byte spellings that are not a prefix of any longer symbol.

use serde::Serialize;

macro_rules! define_token_kinds {
    (
        tokens { $($tok:ident,)* }
        symbols { $($sym:ident = $sym_spelling:literal,)* }
        one_char_symbols { $($one:ident = $one_spelling:literal,)* }
        opening_symbols { $($open:ident = $open_spelling:literal => $closed_by:ident,)* }
        closing_symbols { $($close:ident = $close_spelling:literal => $opened_by:ident,)* }
        keywords { $($kw:ident = $kw_spelling:literal,)* }
    ) => {
        /// Every kind of token in the Basalt language.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
        #[repr(u8)]
        pub enum TokenKind {
            $($tok,)*
            $($sym,)*
            $($one,)*
            $($open,)*
            $($close,)*
            $($kw,)*
        }

        impl TokenKind {
            /// All symbol kinds, in longest-prefix match order.
            pub const SYMBOL_TOKENS: &'static [TokenKind] = &[
                $(TokenKind::$sym,)*
                $(TokenKind::$one,)*
                $(TokenKind::$open,)*
                $(TokenKind::$close,)*
            ];

            /// All keyword kinds.
            pub const KEYWORD_TOKENS: &'static [TokenKind] =
                &[$(TokenKind::$kw,)*];

            /// The enumerator name, used in dumps.
            pub const fn name(self) -> &'static str {
                match self {
                    $(TokenKind::$tok => stringify!($tok),)*
                    $(TokenKind::$sym => stringify!($sym),)*
                    $(TokenKind::$one => stringify!($one),)*
                    $(TokenKind::$open => stringify!($open),)*
                    $(TokenKind::$close => stringify!($close),)*
                    $(TokenKind::$kw => stringify!($kw),)*
                }
            }

            /// The fixed source spelling; empty for content-carrying kinds.
            pub const fn fixed_spelling(self) -> &'static str {
                match self {
                    $(TokenKind::$sym => $sym_spelling,)*
                    $(TokenKind::$one => $one_spelling,)*
                    $(TokenKind::$open => $open_spelling,)*
                    $(TokenKind::$close => $close_spelling,)*
                    $(TokenKind::$kw => $kw_spelling,)*
                    _ => "",
                }
            }

            /// Whether this is a plain symbol sequence, lexable by a
            /// starts-with test.
            pub const fn is_symbol(self) -> bool {
                matches!(
                    self,
                    $(TokenKind::$sym)|* | $(TokenKind::$one)|*
                        | $(TokenKind::$open)|* | $(TokenKind::$close)|*
                )
            }

            /// Whether this is a grouping symbol that must match in the
            /// token stream.
            pub const fn is_grouping_symbol(self) -> bool {
                matches!(self, $(TokenKind::$open)|* | $(TokenKind::$close)|*)
            }

            pub const fn is_opening_symbol(self) -> bool {
                matches!(self, $(TokenKind::$open)|*)
            }

            pub const fn is_closing_symbol(self) -> bool {
                matches!(self, $(TokenKind::$close)|*)
            }

            /// For an opening symbol, its closing counterpart.
            pub const fn closing_symbol(self) -> TokenKind {
                match self {
                    $(TokenKind::$open => TokenKind::$closed_by,)*
                    _ => TokenKind::Error,
                }
            }

            /// For a closing symbol, its opening counterpart.
            pub const fn opening_symbol(self) -> TokenKind {
                match self {
                    $(TokenKind::$close => TokenKind::$opened_by,)*
                    _ => TokenKind::Error,
                }
            }

            /// Whether this is a one-character symbol whose byte is not
            /// part of any longer symbol, allowing a dispatch shortcut.
            pub const fn is_one_char_symbol(self) -> bool {
                matches!(
                    self,
                    $(TokenKind::$one)|* | $(TokenKind::$open)|*
                        | $(TokenKind::$close)|*
                )
            }

            pub const fn is_keyword(self) -> bool {
                matches!(self, $(TokenKind::$kw)|*)
            }

            /// Looks up a keyword kind from its spelling.
            pub fn keyword_from_str(text: &str) -> Option<TokenKind> {
                match text {
                    $($kw_spelling => Some(TokenKind::$kw),)*
                    _ => None,
                }
            }
        }
    };
}

define_token_kinds! {
    tokens {
        EndOfFile,
        Error,
        Identifier,
        IntegerLiteral,
        RealLiteral,
        StringLiteral,
        IntegerTypeLiteral,
        UnsignedIntegerTypeLiteral,
        FloatingPointTypeLiteral,
    }
    symbols {
        GreaterGreaterEqual = ">>=",
        LessEqualGreater = "<=>",
        LessLessEqual = "<<=",
        AmpEqual = "&=",
        CaretEqual = "^=",
        ColonEqual = ":=",
        EqualEqual = "==",
        EqualGreater = "=>",
        ExclaimEqual = "!=",
        GreaterEqual = ">=",
        GreaterGreater = ">>",
        LessEqual = "<=",
        LessGreater = "<>",
        LessLess = "<<",
        LessMinus = "<-",
        MinusEqual = "-=",
        MinusGreater = "->",
        MinusMinus = "--",
        PercentEqual = "%=",
        PipeEqual = "|=",
        PlusEqual = "+=",
        PlusPlus = "++",
        SlashEqual = "/=",
        StarEqual = "*=",
        TildeEqual = "~=",
        Amp = "&",
        Caret = "^",
        Colon = ":",
        Equal = "=",
        Exclaim = "!",
        Greater = ">",
        Less = "<",
        Minus = "-",
        Percent = "%",
        Pipe = "|",
        Plus = "+",
        Slash = "/",
        Star = "*",
        Tilde = "~",
    }
    one_char_symbols {
        At = "@",
        Backslash = "\\",
        Comma = ",",
        Period = ".",
        Question = "?",
        Semi = ";",
    }
    opening_symbols {
        OpenParen = "(" => CloseParen,
        OpenCurlyBrace = "{" => CloseCurlyBrace,
        OpenSquareBracket = "[" => CloseSquareBracket,
    }
    closing_symbols {
        CloseParen = ")" => OpenParen,
        CloseCurlyBrace = "}" => OpenCurlyBrace,
        CloseSquareBracket = "]" => OpenSquareBracket,
    }
    keywords {
        Abstract = "abstract",
        Addr = "addr",
        And = "and",
        Api = "api",
        As = "as",
        Auto = "auto",
        Base = "base",
        Bool = "bool",
        Break = "break",
        Case = "case",
        Class = "class",
        Const = "const",
        Constraint = "constraint",
        Continue = "continue",
        Default = "default",
        Else = "else",
        False = "false",
        Final = "final",
        Fn = "fn",
        For = "for",
        Friend = "friend",
        If = "if",
        Impl = "impl",
        Import = "import",
        In = "in",
        Interface = "interface",
        Is = "is",
        Let = "let",
        Library = "library",
        Match = "match",
        Namespace = "namespace",
        Not = "not",
        Observe = "observe",
        Or = "or",
        Override = "override",
        Package = "package",
        Private = "private",
        Protected = "protected",
        Return = "return",
        Returned = "returned",
        SelfTypeIdentifier = "Self",
        SelfValueIdentifier = "self",
        StringTypeLiteral = "String",
        Template = "template",
        Then = "then",
        True = "true",
        Type = "type",
        Var = "var",
        Virtual = "virtual",
        Where = "where",
        While = "while",
    }
}

impl TokenKind {
    /// Whether this is a sized type literal (`i32`, `u8`, `f64`, ...).
    pub const fn is_sized_type_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntegerTypeLiteral
                | TokenKind::UnsignedIntegerTypeLiteral
                | TokenKind::FloatingPointTypeLiteral
        )
    }

    /// The number of parse tree nodes a token of this kind is expected
    /// to produce. The sum over a buffer sizes the tree's reservation.
    pub const fn expected_parse_tree_size(self) -> usize {
        // A `;` closing an expression statement yields both the
        // statement-end leaf and the statement node itself.
        match self {
            TokenKind::Semi => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let spelling = self.fixed_spelling();
        if spelling.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{spelling}")
        }
    }
}
