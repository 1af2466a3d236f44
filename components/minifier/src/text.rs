//! Literal text forms
//!
//! Shortest source spellings for numbers and strings, shared by the literal
//! folding pass (to judge whether a fold pays off) and the emitter.

/// Shortest JavaScript spelling of a number.
///
/// Picks the shorter of the plain decimal form and an integer-mantissa
/// exponent form; ties go to the plain form. `ryu` supplies the shortest
/// round-tripping digits.
///
/// # Examples
///
/// ```
/// use minifier::text::format_number;
///
/// assert_eq!(format_number(0.5), ".5");
/// assert_eq!(format_number(1000.0), "1e3");
/// assert_eq!(format_number(123.0), "123");
/// assert_eq!(format_number(-1.5e-7), "-15e-8");
/// ```
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        // `Infinity` is an ordinary global a program may shadow
        return if value < 0.0 { "-1/0" } else { "1/0" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let mut buffer = ryu::Buffer::new();
    let (digits, exponent) = decompose(buffer.format_finite(value.abs()));
    let body = shortest(&digits, exponent);
    if value < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Splits ryu output into significant digits and a power of ten, so that
/// the value is `digits * 10^exponent`.
fn decompose(printed: &str) -> (String, i32) {
    let (mantissa, exponent) = match printed.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (printed, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let mut exponent = exponent - frac_part.len() as i32;
    let joined = format!("{}{}", int_part, frac_part);
    let mut digits = joined.trim_start_matches('0').to_string();
    while digits.ends_with('0') {
        digits.pop();
        exponent += 1;
    }
    (digits, exponent)
}

fn shortest(digits: &str, exponent: i32) -> String {
    let len = digits.len() as i32;
    let plain = if exponent >= 0 {
        format!("{}{}", digits, "0".repeat(exponent as usize))
    } else {
        let point = len + exponent;
        if point > 0 {
            format!("{}.{}", &digits[..point as usize], &digits[point as usize..])
        } else {
            format!(".{}{}", "0".repeat((-point) as usize), digits)
        }
    };
    if exponent == 0 {
        return plain;
    }
    let scientific = format!("{}e{}", digits, exponent);
    if scientific.len() < plain.len() {
        scientific
    } else {
        plain
    }
}

/// Quotes a string with whichever delimiter needs fewer escapes; ties go to
/// double quotes. With `inline_safe` set, `</` is written as `<\/` so the
/// text can sit inside an HTML script block.
///
/// # Examples
///
/// ```
/// use minifier::text::quote_string;
///
/// assert_eq!(quote_string("plain", false), "\"plain\"");
/// assert_eq!(quote_string("say \"hi\"", false), "'say \"hi\"'");
/// assert_eq!(quote_string("</script>", true), "\"<\\/script>\"");
/// ```
pub fn quote_string(value: &str, inline_safe: bool) -> String {
    let doubles = value.chars().filter(|c| *c == '"').count();
    let singles = value.chars().filter(|c| *c == '\'').count();
    let quote = if doubles <= singles { '"' } else { '\'' };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\0' => match chars.peek() {
                Some(next) if next.is_ascii_digit() => out.push_str("\\x00"),
                _ => out.push_str("\\0"),
            },
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '\u{feff}' => out.push_str("\\ufeff"),
            '/' if inline_safe && out.ends_with('<') => out.push_str("\\/"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Double-quoted JSON string.
pub fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
