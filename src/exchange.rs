//! Currency display. Engines return plain numbers; this turns them into
//! USD or KRW text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd { decimals: usize },
    Krw,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd { .. } => "USD",
            Currency::Krw => "KRW",
        }
    }

    pub fn format(self, amount: f64) -> String {
        match self {
            Currency::Usd { decimals } => format_usd(amount, decimals),
            Currency::Krw => format_krw(amount),
        }
    }
}

/// Convert at `rate` and round to a whole won.
pub fn to_krw(amount: f64, rate: f64) -> f64 {
    let v = amount * rate;
    if v.is_finite() {
        v.round()
    } else {
        0.0
    }
}

/// `$1,234.567` style. Non-finite amounts show as zero.
pub fn format_usd(amount: f64, decimals: usize) -> String {
    signed(amount, "$", grouped(amount.abs(), decimals))
}

/// `₩1,234,568` style, rounded half away from zero to a whole won.
pub fn format_krw(amount: f64) -> String {
    signed(amount, "₩", grouped(amount.abs().round(), 0))
}

/// Plain quantity with thousands separators; fractions only when present.
pub fn format_count(n: f64) -> String {
    let decimals = if n.fract() == 0.0 { 0 } else { 2 };
    signed(n, "", grouped(n.abs(), decimals))
}

/// Prefix `symbol`, and a minus sign unless the digits are all zero.
fn signed(amount: f64, symbol: &str, digits: String) -> String {
    let nonzero = digits.chars().any(|c| c.is_ascii_digit() && c != '0');
    if amount < 0.0 && nonzero {
        format!("-{symbol}{digits}")
    } else {
        format!("{symbol}{digits}")
    }
}

fn grouped(amount: f64, decimals: usize) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{amount:.decimals$}");
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
