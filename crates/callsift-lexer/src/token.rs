//! Token definitions for the Go subset

use logos::{Lexer, Logos};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")] // Newlines are significant, see `tokenize`
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // === Keywords ===
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("select")]
    Select,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&^")]
    AmpCaret,

    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token("&^=")]
    AmpCaretEq,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("<-")]
    Arrow,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("=")]
    Eq,
    #[token(":=")]
    ColonEq,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("...")]
    Ellipsis,

    // === Delimiters ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // === Punctuation ===
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,

    // === Literals ===
    #[regex(r"[0-9][0-9_]*", priority = 3)]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[oO][0-7_]+")]
    #[regex(r"0[bB][01_]+")]
    Int,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    Float,

    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9_]+)?i")]
    Imag,

    #[regex(r"'([^'\\\n]|\\[^\n][^'\n]*)'")]
    Char,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"`[^`]*`")]
    String,

    // === Identifiers ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // === Trivia the tokenizer folds away ===
    #[token("\n")]
    Newline,
    #[token("/*", block_comment)]
    BlockComment,

    // === Special ===
    Error,
    Eof,
}

/// Consume a block comment up to and including `*/`. An unterminated
/// comment swallows the rest of the input as an error token.
fn block_comment(lex: &mut Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Break
                | TokenKind::Case
                | TokenKind::Chan
                | TokenKind::Const
                | TokenKind::Continue
                | TokenKind::Default
                | TokenKind::Defer
                | TokenKind::Else
                | TokenKind::Fallthrough
                | TokenKind::For
                | TokenKind::Func
                | TokenKind::Go
                | TokenKind::Goto
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::Interface
                | TokenKind::Map
                | TokenKind::Package
                | TokenKind::Range
                | TokenKind::Return
                | TokenKind::Select
                | TokenKind::Struct
                | TokenKind::Switch
                | TokenKind::Type
                | TokenKind::Var
        )
    }

    /// Whether a newline right after this token ends the statement
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Imag
                | TokenKind::Char
                | TokenKind::String
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Break => "'break'",
            TokenKind::Case => "'case'",
            TokenKind::Chan => "'chan'",
            TokenKind::Const => "'const'",
            TokenKind::Continue => "'continue'",
            TokenKind::Default => "'default'",
            TokenKind::Defer => "'defer'",
            TokenKind::Else => "'else'",
            TokenKind::Fallthrough => "'fallthrough'",
            TokenKind::For => "'for'",
            TokenKind::Func => "'func'",
            TokenKind::Go => "'go'",
            TokenKind::Goto => "'goto'",
            TokenKind::If => "'if'",
            TokenKind::Import => "'import'",
            TokenKind::Interface => "'interface'",
            TokenKind::Map => "'map'",
            TokenKind::Package => "'package'",
            TokenKind::Range => "'range'",
            TokenKind::Return => "'return'",
            TokenKind::Select => "'select'",
            TokenKind::Struct => "'struct'",
            TokenKind::Switch => "'switch'",
            TokenKind::Type => "'type'",
            TokenKind::Var => "'var'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::Caret => "'^'",
            TokenKind::Shl => "'<<'",
            TokenKind::Shr => "'>>'",
            TokenKind::AmpCaret => "'&^'",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::PercentEq => "'%='",
            TokenKind::AmpEq => "'&='",
            TokenKind::PipeEq => "'|='",
            TokenKind::CaretEq => "'^='",
            TokenKind::ShlEq => "'<<='",
            TokenKind::ShrEq => "'>>='",
            TokenKind::AmpCaretEq => "'&^='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Arrow => "'<-'",
            TokenKind::PlusPlus => "'++'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::EqEq => "'=='",
            TokenKind::Ne => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::Eq => "'='",
            TokenKind::ColonEq => "':='",
            TokenKind::Bang => "'!'",
            TokenKind::Tilde => "'~'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::Imag => "imaginary",
            TokenKind::Char => "rune",
            TokenKind::String => "string",
            TokenKind::Ident => "identifier",
            TokenKind::Newline => "newline",
            TokenKind::BlockComment => "comment",
            TokenKind::Error => "error",
            TokenKind::Eof => "end of file",
        }
    }
}
