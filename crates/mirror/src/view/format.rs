pub const PROFIT_CLASS: &str = "profit-cell";
pub const LOSS_CLASS: &str = "loss-cell";

/// 1234567 → "1,234,567"
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// 원 단위 금액. 소수점 이하는 버린다.
pub fn won(value: f64) -> String {
    group_thousands(truncate(value))
}

/// "+1,234" / "-1,234"
pub fn signed_won(value: f64) -> String {
    let value = truncate(value);
    if value >= 0 {
        format!("+{}", group_thousands(value))
    } else {
        group_thousands(value)
    }
}

/// "+1.50%" / "-0.42%"
pub fn signed_percent(value: f64, decimals: usize) -> String {
    let value = normalize_zero(value);
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{}{:.*}%", sign, decimals, value)
}

pub fn percent(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, normalize_zero(value))
}

/// 0 이상이면 수익
pub fn profit_class(value: f64) -> &'static str {
    if value >= 0.0 {
        PROFIT_CLASS
    } else {
        LOSS_CLASS
    }
}

pub fn truncate(value: f64) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(-1234567), "-1,234,567");
    }

    #[test]
    fn test_signed_values() {
        assert_eq!(signed_won(1500.9), "+1,500");
        assert_eq!(signed_won(-20000.0), "-20,000");
        assert_eq!(signed_percent(1.5, 2), "+1.50%");
        assert_eq!(signed_percent(-0.0, 2), "+0.00%");
        assert_eq!(signed_percent(-0.424, 2), "-0.42%");
        assert_eq!(percent(66.666, 1), "66.7%");
    }
}
