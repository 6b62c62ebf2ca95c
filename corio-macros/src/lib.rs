mod utils;

use proc_macro::{TokenStream, TokenTree};

/// Turns an `async fn` into a routine: a plain `fn` returning
/// `corio::Task<T>`.
///
/// Calling the function only captures its arguments; the body runs when
/// the returned task is awaited, detached, or spawned.
///
/// ```rust,ignore
/// #[corio::routine]
/// async fn double(x: u32) -> u32 {
///     x * 2
/// }
///
/// // expands to
/// fn double(x: u32) -> ::corio::Task<u32> {
///     ::corio::Task::new(async move { x * 2 })
/// }
/// ```
#[proc_macro_attribute]
pub fn routine(_attr: TokenStream, item: TokenStream) -> TokenStream {
    match expand_routine(item) {
        Ok(ts) => ts,
        Err(msg) => utils::compile_error(&format!("routine macro error: {msg}")),
    }
}

fn expand_routine(item: TokenStream) -> Result<TokenStream, String> {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    if !utils::strip_async(&mut tokens) {
        return Err(String::from("expected an `async fn`"));
    }

    let fn_pos = utils::find_ident(&tokens, 0, "fn").ok_or("expected a function")?;
    let params = utils::params_position(&tokens, fn_pos).ok_or("missing parameter list")?;
    let body_pos = utils::body_position(&tokens).ok_or("missing function body")?;

    let tail_end = utils::find_ident(&tokens, params + 1, "where")
        .filter(|&w| w < body_pos)
        .unwrap_or(body_pos);

    let output = if utils::is_arrow(&tokens, params + 1) {
        utils::to_source(&tokens[params + 3..tail_end])
    } else {
        String::from("()")
    };

    let body = match &tokens[body_pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let signature = utils::to_source(&tokens[..=params]);
    let where_clause = utils::to_source(&tokens[tail_end..body_pos]);

    let source = format!(
        "{signature} -> ::corio::Task<{output}> {where_clause} {{
            ::corio::Task::new(async move {{ {body} }})
        }}"
    );

    source
        .parse()
        .map_err(|e| format!("generated item does not parse: {e}"))
}

/// Runs an `async fn main` on a `corio::Runtime`.
///
/// Accepts `worker_threads = N` to size the runtime.
///
/// ```rust,ignore
/// #[corio::main(worker_threads = 2)]
/// async fn main() {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let attr_str = attr.to_string();
    let mut worker_threads: Option<usize> = None;

    if !attr_str.is_empty() {
        for part in attr_str.split(',') {
            let part = part.trim();
            if let Some(v) = part.strip_prefix("worker_threads") {
                let v = v.trim().trim_start_matches('=').trim();
                match v.parse::<usize>() {
                    Ok(n) => worker_threads = Some(n),
                    Err(_) => {
                        return utils::compile_error("main macro error: invalid `worker_threads`");
                    }
                }
            }
        }
    }

    utils::strip_async(&mut tokens);

    let Some(pos) = utils::body_position(&tokens) else {
        return utils::compile_error("main macro error: missing function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let mut builder = String::from("::corio::RuntimeBuilder::new()");

    if let Some(n) = worker_threads {
        builder.push_str(&format!(".worker_threads({n})"));
    }

    builder.push_str(".build()");

    let new_block = format!(
        "{{
            let runtime = {builder};
            runtime
                .block_on(async move {{
                    {block}
                }})
        }}"
    );

    if let Err(msg) = utils::replace_body(&mut tokens, pos, &new_block) {
        return utils::compile_error(&format!("main macro error: {msg}"));
    }

    tokens.into_iter().collect()
}

/// Runs an `async` test body on a fresh `corio::IoContext` driven by the
/// test thread.
///
/// ```rust,ignore
/// #[corio::test]
/// async fn it_works() {
///     assert_eq!(2 + 2, 4);
/// }
/// ```
#[proc_macro_attribute]
pub fn test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    utils::strip_async(&mut tokens);

    let Some(pos) = utils::body_position(&tokens) else {
        return utils::compile_error("test macro error: missing function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let new_block = format!(
        "{{
        ::corio::IoContext::new()
            .block_on(async move {{ {block} }})
    }}"
    );

    if let Err(msg) = utils::replace_body(&mut tokens, pos, &new_block) {
        return utils::compile_error(&format!("test macro error: {msg}"));
    }

    let test_attr: TokenStream = "#[test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
