use std::borrow::Cow;

use crate::number;
use crate::template::{ArgRef, Conversion, Directive, FormatTemplate, Pad, Segment};
use crate::value::Value;
use crate::RenderError;

const ZEROS: [&str; 8] = ["", "0", "00", "000", "0000", "00000", "000000", "0000000"];
const SPACES: [&str; 8] = ["", " ", "  ", "   ", "    ", "     ", "      ", "       "];
/// Widest field a directive may pad to.
pub const MAX_WIDTH: usize = 1 << 16;

const UNDERSCORES: [&str; 8] = ["", "_", "__", "___", "____", "_____", "______", "_______"];

fn padding(ch: char, len: usize) -> Cow<'static, str> {
    let table = match ch {
        '0' => Some(&ZEROS),
        ' ' => Some(&SPACES),
        '_' => Some(&UNDERSCORES),
        _ => None,
    };
    match table {
        Some(t) if len < t.len() => Cow::Borrowed(t[len]),
        _ => Cow::Owned(std::iter::repeat(ch).take(len).collect()),
    }
}

impl FormatTemplate {
    /// Render against `args`. Unindexed directives consume arguments left to right.
    pub fn render(&self, args: &[Value]) -> Result<String, RenderError> {
        let mut out = String::new();
        let mut cursor = 0;
        for segment in self.segments() {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Directive(d) => render_directive(d, args, &mut cursor, &mut out)?,
            }
        }
        Ok(out)
    }
}

fn resolve<'a>(d: &Directive, args: &'a [Value], cursor: &mut usize) -> Result<Cow<'a, Value>, RenderError> {
    match &d.arg {
        ArgRef::Named(path) => {
            let root = args.first().ok_or(RenderError::MissingArgument { index: 1 })?;
            root.get(path).map(Cow::Owned)
        }
        ArgRef::Position(n) => args
            .get(n - 1)
            .map(Cow::Borrowed)
            .ok_or(RenderError::MissingArgument { index: *n }),
        ArgRef::Next => {
            let index = *cursor;
            *cursor += 1;
            args.get(index)
                .map(Cow::Borrowed)
                .ok_or(RenderError::MissingArgument { index: index + 1 })
        }
    }
}

fn render_directive(d: &Directive, args: &[Value], cursor: &mut usize, out: &mut String) -> Result<(), RenderError> {
    if let Some(width) = d.width.filter(|&w| w > MAX_WIDTH) {
        return Err(RenderError::WidthTooLarge { width, limit: MAX_WIDTH });
    }
    let mut value = resolve(d, args, cursor)?;

    let invoked = match value.as_ref() {
        Value::Lazy(f) if d.conversion.resolves_lazy() => Some(f()),
        _ => None,
    };
    if let Some(result) = invoked {
        value = Cow::Owned(result);
    }
    let value = value.as_ref();

    if d.conversion.requires_number() && !matches!(value, Value::Number(_)) && value.to_number().is_nan() {
        return Err(RenderError::TypeMismatch {
            found: value.type_name(),
        });
    }

    // NaN counts as negative.
    let positive = !d.conversion.is_signed() || value.to_number() >= 0.0;

    let precision = d.precision;
    let text = match d.conversion {
        Conversion::Binary => number::to_radix_string(int_arg(value), 2),
        Conversion::Char => char_from_code(int_arg(value)),
        Conversion::Decimal | Conversion::Integer => number::to_js_string(int_arg(value)),
        Conversion::Json => {
            out.push_str(&value.to_json(precision.unwrap_or(0))?);
            return Ok(());
        }
        Conversion::Exponential => number::to_exponential(float_arg(value), precision),
        Conversion::Fixed => match precision {
            Some(p) => number::to_fixed(float_arg(value), p),
            None => number::to_js_string(float_arg(value)),
        },
        Conversion::General => match precision {
            Some(p) => number::to_precision(float_arg(value), p),
            None => number::to_js_string(float_arg(value)),
        },
        Conversion::Octal => match value {
            Value::Number(n) => number::to_radix_string(*n, 8),
            other => other.to_js_string(),
        },
        Conversion::String => truncate(value.to_js_string(), precision),
        Conversion::Bool => truncate(value.is_truthy().to_string(), precision),
        Conversion::TypeName => truncate(value.type_name().to_string(), precision),
        Conversion::Unsigned => number::to_js_string(number::to_uint32(int_arg(value))),
        Conversion::Primitive => match value {
            Value::String(s) => truncate(s.clone(), precision),
            other => other.to_js_string(),
        },
        Conversion::Hex => number::to_radix_string(int_arg(value), 16),
        Conversion::HexUpper => number::to_radix_string(int_arg(value), 16).to_uppercase(),
    };

    let (sign, body) = if d.conversion.is_signed() && (!positive || d.force_sign) {
        let stripped = text.strip_prefix(['+', '-']).unwrap_or(&text);
        (if positive { "+" } else { "-" }, stripped)
    } else {
        ("", text.as_str())
    };

    let pad_char = match d.pad {
        Some(Pad::Zero) => '0',
        Some(Pad::Custom(c)) => c,
        None => ' ',
    };
    let used = sign.len() + body.chars().count();
    let pad = padding(pad_char, d.width.unwrap_or(0).saturating_sub(used));

    if d.left_align {
        out.push_str(sign);
        out.push_str(body);
        out.push_str(&pad);
    } else if pad_char == '0' {
        out.push_str(sign);
        out.push_str(&pad);
        out.push_str(body);
    } else {
        out.push_str(&pad);
        out.push_str(sign);
        out.push_str(body);
    }
    Ok(())
}

/// `parseInt(value, 10)`, truncating numbers toward zero.
fn int_arg(value: &Value) -> f64 {
    match value {
        Value::Number(n) if n.is_finite() => n.trunc(),
        Value::Number(_) => f64::NAN,
        other => number::parse_int(&other.to_js_string()),
    }
}

/// `parseFloat(value)`.
fn float_arg(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        other => number::parse_float(&other.to_js_string()),
    }
}

fn char_from_code(code: f64) -> String {
    char::from_u32(number::to_uint16(code) as u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
        .to_string()
}

fn truncate(s: String, precision: Option<usize>) -> String {
    match precision {
        Some(p) => s.chars().take(p).collect(),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str, args: &[Value]) -> String {
        FormatTemplate::parse(source).unwrap().render(args).unwrap()
    }

    fn render_err(source: &str, args: &[Value]) -> RenderError {
        FormatTemplate::parse(source).unwrap().render(args).unwrap_err()
    }

    #[test]
    fn literal_only_template_is_identity() {
        assert_eq!(render("plain text, no directives", &[]), "plain text, no directives");
        assert_eq!(render("", &[]), "");
    }

    #[test]
    fn width_sign_and_padding() {
        assert_eq!(render("%05d", &[42.into()]), "00042");
        assert_eq!(render("%+d", &[7.into()]), "+7");
        assert_eq!(render("%-5d|", &[3.into()]), "3    |");
        assert_eq!(render("%5d|", &[3.into()]), "    3|");
        assert_eq!(render("%05d", &[(-42).into()]), "-0042");
        assert_eq!(render("%+05d", &[42.into()]), "+0042");
        assert_eq!(render("%5d", &[(-42).into()]), "  -42");
        assert_eq!(render("%'*6s", &["ab".into()]), "****ab");
        assert_eq!(render("%'_-4s|", &["ab".into()]), "ab__|");
        assert_eq!(render("%2d", &[12345.into()]), "12345");
    }

    #[test]
    fn zero_pad_with_left_align_pads_right() {
        assert_eq!(render("%0-5d", &[3.into()]), "30000");
    }

    #[test]
    fn long_padding_is_built_on_demand() {
        assert_eq!(render("%012d", &[7.into()]), "000000000007");
        assert_eq!(render("%'#9s", &["x".into()]), "########x");
    }

    #[test]
    fn integer_conversions() {
        assert_eq!(render("%x", &[255.into()]), "ff");
        assert_eq!(render("%X", &[255.into()]), "FF");
        assert_eq!(render("%b", &[5.into()]), "101");
        assert_eq!(render("%o", &[8.into()]), "10");
        assert_eq!(render("%d", &[3.9.into()]), "3");
        assert_eq!(render("%i", &[(-3.9).into()]), "-3");
        assert_eq!(render("%u", &[(-1).into()]), "4294967295");
        assert_eq!(render("%c", &[65.into()]), "A");
        assert_eq!(render("%x", &["255".into()]), "ff");
    }

    #[test]
    fn float_conversions() {
        assert_eq!(render("%.2f", &[0.5.into()]), "0.50");
        assert_eq!(render("%f", &[1.25.into()]), "1.25");
        assert_eq!(render("%.1e", &[12345.into()]), "1.2e+4");
        assert_eq!(render("%e", &[1.5.into()]), "1.5e+0");
        assert_eq!(render("%.3g", &[3.14159.into()]), "3.14");
        assert_eq!(render("%g", &[0.25.into()]), "0.25");
        assert_eq!(render("%+.1f", &[(-0.26).into()]), "-0.3");
        assert_eq!(render("%+.1f", &[2.into()]), "+2.0");
    }

    #[test]
    fn float_conversions_round_ties_up() {
        assert_eq!(render("%.0f", &[0.5.into()]), "1");
        assert_eq!(render("%.0f", &[2.5.into()]), "3");
        assert_eq!(render("%.0f", &[(-0.5).into()]), "-1");
        assert_eq!(render("%05.0f", &[(-2.5).into()]), "-0003");
        assert_eq!(render("%.1f", &[0.25.into()]), "0.3");
        assert_eq!(render("%.1e", &[1.25.into()]), "1.3e+0");
        assert_eq!(render("%+.1e", &[(-1.25).into()]), "-1.3e+0");
        assert_eq!(render("%.1g", &[2.5.into()]), "3");
        assert_eq!(render("%.2g", &[(-0.125).into()]), "-0.13");
    }

    #[test]
    fn oversized_width_is_an_error() {
        let err = render_err("%9999999999999d", &[1.into()]);
        assert_eq!(
            err,
            RenderError::WidthTooLarge {
                width: 9_999_999_999_999,
                limit: MAX_WIDTH
            }
        );
        assert_eq!(render(&format!("%{MAX_WIDTH}d"), &[1.into()]).len(), MAX_WIDTH);
    }

    #[test]
    fn string_like_conversions() {
        assert_eq!(render("%s", &[1.into()]), "1");
        assert_eq!(render("%.3s", &["abcdef".into()]), "abc");
        assert_eq!(render("%.0s|", &["abc".into()]), "|");
        assert_eq!(render("%t", &[0.into()]), "false");
        assert_eq!(render("%.1t", &["x".into()]), "t");
        assert_eq!(render("%T", &[Value::Array(vec![])]), "array");
        assert_eq!(render("%T", &[Value::Null]), "null");
        assert_eq!(render("%v", &[Value::Bool(true)]), "true");
        assert_eq!(render("%.2v", &["hello".into()]), "he");
        assert_eq!(render("%s", &[Value::Array(vec![1.into(), 2.into()])]), "1,2");
    }

    #[test]
    fn json_ignores_width_and_sign() {
        let v = Value::object([("a", Value::Array(vec![1.into(), Value::Null]))]);
        assert_eq!(render("%+10j", &[v.clone()]), r#"{"a":[1,null]}"#);
        assert_eq!(render("%.1j", &[Value::Array(vec![1.into()])]), "[\n 1\n]");
        assert_eq!(render("%j", &["x".into()]), r#""x""#);
    }

    #[test]
    fn positional_and_implicit_arguments() {
        let args = [Value::from("a"), Value::from("b")];
        assert_eq!(render("%2$s %1$s %2$s", &args), "b a b");
        assert_eq!(render("%s%s", &args), "ab");
        assert_eq!(render("%1$s%s%s", &args), "aab");
    }

    #[test]
    fn named_arguments_walk_the_first_argument() {
        let user = Value::object([
            ("name", Value::from("ada")),
            ("langs", Value::Array(vec![Value::from("rust"), Value::from("ml")])),
        ]);
        assert_eq!(render("%(name)s likes %(langs[0])s", &[user.clone()]), "ada likes rust");
        let err = render_err("%(age)d", &[user]);
        assert_eq!(err, RenderError::MissingProperty { key: "age".to_string() });
    }

    #[test]
    fn missing_arguments_are_reported() {
        assert_eq!(render_err("%s %s", &["a".into()]), RenderError::MissingArgument { index: 2 });
        assert_eq!(render_err("%3$s", &["a".into()]), RenderError::MissingArgument { index: 3 });
        assert_eq!(render_err("%(a)s", &[]), RenderError::MissingArgument { index: 1 });
    }

    #[test]
    fn numeric_conversions_check_argument_type() {
        assert_eq!(render_err("%d", &["abc".into()]), RenderError::TypeMismatch { found: "string" });
        assert_eq!(render_err("%x", &[Value::object([("a", Value::Null)])]), RenderError::TypeMismatch { found: "object" });
        assert_eq!(render("%d", &["42".into()]), "42");
        assert_eq!(render("%d", &[Value::Bool(true)]), "NaN");
        assert_eq!(render("%s", &["abc".into()]), "abc");
    }

    #[test]
    fn lazy_values_are_invoked_except_for_type_and_raw() {
        let lazy = Value::lazy(|| Value::from(41));
        assert_eq!(render("%d", &[lazy.clone()]), "41");
        assert_eq!(render("%T", &[lazy.clone()]), "function");
        assert_eq!(render("%T", &[Value::lazy(|| Value::from("s"))]), "function");
        assert_eq!(render("%v", &[lazy]), "[function]");
    }

    #[test]
    fn padding_table_and_fallback_agree() {
        for ch in ['0', ' ', '_', '#'] {
            for len in 0..12 {
                assert_eq!(padding(ch, len), ch.to_string().repeat(len));
            }
        }
    }
}
