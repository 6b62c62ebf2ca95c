use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Returns the position of the last brace-delimited group, the function
/// body of an item.
pub(crate) fn body_position(tokens: &[TokenTree]) -> Option<usize> {
    tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
}

/// Removes the first `async` keyword, if present.
///
/// # Returns
///
/// `true` if a keyword was removed.
pub(crate) fn strip_async(tokens: &mut Vec<TokenTree>) -> bool {
    match tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        Some(pos) => {
            tokens.remove(pos);
            true
        }
        None => false,
    }
}

/// Returns the position of the first identifier equal to `name`,
/// starting at `from`.
pub(crate) fn find_ident(tokens: &[TokenTree], from: usize, name: &str) -> Option<usize> {
    tokens
        .iter()
        .skip(from)
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == name))
        .map(|p| p + from)
}

/// Returns the position of the parameter list of the function whose `fn`
/// keyword is at `fn_pos`.
///
/// Parenthesized groups nested in generic parameters (such as the
/// arguments of an `Fn(..)` bound) are skipped.
pub(crate) fn params_position(tokens: &[TokenTree], fn_pos: usize) -> Option<usize> {
    let mut depth = 0usize;

    for (i, t) in tokens.iter().enumerate().skip(fn_pos + 1) {
        match t {
            TokenTree::Punct(p) if p.as_char() == '<' => depth += 1,
            TokenTree::Punct(p) if p.as_char() == '>' => {
                // `->` inside a bound, not a closing angle bracket.
                let arrow = i > 0
                    && matches!(&tokens[i - 1], TokenTree::Punct(prev) if prev.as_char() == '-');

                if !arrow {
                    depth = depth.saturating_sub(1);
                }
            }
            TokenTree::Group(g) if g.delimiter() == Delimiter::Parenthesis && depth == 0 => {
                return Some(i);
            }
            _ => {}
        }
    }

    None
}

/// Returns `true` if the tokens at position `i` form a `->` arrow.
pub(crate) fn is_arrow(tokens: &[TokenTree], i: usize) -> bool {
    if i + 1 >= tokens.len() {
        return false;
    }

    matches!(
        (&tokens[i], &tokens[i + 1]),
        (TokenTree::Punct(p1), TokenTree::Punct(p2))
            if p1.as_char() == '-' && p2.as_char() == '>'
    )
}

/// Renders a slice of tokens back into source text.
pub(crate) fn to_source(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

/// Replaces the token at `pos` with a brace-delimited group holding
/// `source`.
pub(crate) fn replace_body(tokens: &mut [TokenTree], pos: usize, source: &str) -> Result<(), String> {
    let stream = source
        .parse::<TokenStream>()
        .map_err(|e| format!("generated body does not parse: {e}"))?;

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    Ok(())
}

/// Expands to a `compile_error!` invocation carrying `message`.
pub(crate) fn compile_error(message: &str) -> TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
