//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution chains, shorten fully
//! qualified class names, and suggest close matches for names that
//! could not be resolved.

/// Renders a resolution chain as a readable string, in push order.
///
/// # Examples
/// ```
/// use rabita_support::rendering::render_chain;
///
/// let chain = vec!["App\\UserService", "App\\UserRepo", "App\\UserService"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "App\\UserService → App\\UserRepo → App\\UserService");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified class name for display.
///
/// Both Rust paths (`a::b::C`) and backslash namespaces (`App\Http\Kernel`)
/// are reduced to their last segment; generic arguments are shortened
/// recursively.
///
/// ```
/// use rabita_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::UserService"), "UserService");
/// assert_eq!(shorten_type_name("App\\Services\\Mailer"), "Mailer");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>"),
///     "Arc<dyn Logger>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '\\' => current_segment.clear(),
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Generates "did you mean?" suggestions for a name that failed to resolve.
///
/// Compares the requested name against the available ones and returns at
/// most `max_suggestions` close matches, best first.
pub fn suggest_similar<'a>(
    requested: &str,
    available: impl IntoIterator<Item = &'a str>,
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .into_iter()
        .filter(|&name| name != requested)
        .filter_map(|name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            if is_close_match(&requested_short, &name_short) {
                return Some((name, 60));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored.dedup_by(|a, b| a.0 == b.0);
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Quick "close enough" check for typos: lengths within 3 and at least
/// 60% of positions agree.
pub fn is_close_match(a: &str, b: &str) -> bool {
    let len_diff = a.len().abs_diff(b.len());
    if len_diff > 3 {
        return false;
    }

    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return true;
    }

    let common = a.chars().zip(b.chars()).filter(|(ca, cb)| ca == cb).count();
    common * 100 / max_len >= 60
}
