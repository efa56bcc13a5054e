//! callsift lexer - tokenization using logos
//!
//! Go terminates statements with newlines. The tokenizer turns a newline
//! into a `;` token when the previous token could end a statement, and drops
//! it otherwise. A block comment containing a newline counts as one.

mod token;

pub use token::*;

use callsift_ast::Span;
use logos::Logos;

/// Tokenize a source string into a vector of tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        let kind = match result {
            Ok(kind) => kind,
            Err(_) => TokenKind::Error,
        };
        match kind {
            TokenKind::Newline => insert_semicolon(&mut tokens, span.start),
            TokenKind::BlockComment => {
                if lexer.slice().contains('\n') {
                    insert_semicolon(&mut tokens, span.start);
                }
            }
            _ => tokens.push(Token { kind, span }),
        }
    }

    let end = source.len();
    insert_semicolon(&mut tokens, end);
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });

    tokens
}

/// Push an automatic semicolon at `at` if the last token ends a statement.
/// Automatic semicolons are zero-width.
fn insert_semicolon(tokens: &mut Vec<Token>, at: usize) {
    if tokens.last().is_some_and(|t| t.kind.ends_statement()) {
        tokens.push(Token {
            kind: TokenKind::Semicolon,
            span: Span::new(at, at),
        });
    }
}

/// A token with its span
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }

    /// Semicolon inserted at a line end rather than written
    pub fn is_implicit(&self) -> bool {
        self.kind == TokenKind::Semicolon && self.span.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("x := 5"),
            vec![
                TokenKind::Ident,
                TokenKind::ColonEq,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_semicolon_after_call() {
        let toks = kinds("f(x)\ng()\n");
        assert_eq!(toks[4], TokenKind::Semicolon);
        assert_eq!(toks.iter().filter(|k| **k == TokenKind::Semicolon).count(), 2);
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        let toks = kinds("a +\nb");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_open_brace() {
        let toks = kinds("func main() {\n}\n");
        assert_eq!(
            toks,
            vec![
                TokenKind::Func,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments() {
        let toks = kinds("x // trailing\n/* inline */ y /* multi\nline */ z");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_block_comment_forms() {
        let toks = kinds("a /**/ b /* * ** */ c /***/");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );

        let toks = tokenize("x /* never closed\ny");
        assert_eq!(toks[1].kind, TokenKind::Error);
        assert_eq!(toks[1].span, Span::new(2, 19));
    }

    #[test]
    fn test_literals() {
        let toks = kinds(r#"42 0x1F 1.5 .5 1e9 2i 'a' '\n' "s\"q" `raw`"#);
        assert_eq!(
            &toks[..10],
            &[
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Imag,
                TokenKind::Char,
                TokenKind::Char,
                TokenKind::String,
                TokenKind::String
            ]
        );
    }

    #[test]
    fn test_operators() {
        let toks = kinds("a &^= b <- c ... d &^ e");
        assert_eq!(toks[1], TokenKind::AmpCaretEq);
        assert_eq!(toks[3], TokenKind::Arrow);
        assert_eq!(toks[5], TokenKind::Ellipsis);
        assert_eq!(toks[7], TokenKind::AmpCaret);
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        let toks = kinds("func funcs go gopher");
        assert_eq!(toks[0], TokenKind::Func);
        assert_eq!(toks[1], TokenKind::Ident);
        assert_eq!(toks[2], TokenKind::Go);
        assert_eq!(toks[3], TokenKind::Ident);
    }

    #[test]
    fn test_implicit_semicolon_is_zero_width() {
        let tokens = tokenize("return\n");
        assert!(tokens[1].is_implicit());
        assert_eq!(tokens[1].span, Span::new(6, 6));
        assert_eq!(tokens[0].text("return\n"), "return");
    }
}
