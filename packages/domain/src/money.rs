//! # 金額
//!
//! 残高の加算・立替・精算で受け付ける金額の値オブジェクト。
//!
//! 入力は JSON の数値（`f64`）で届くが、永続化先の DynamoDB の数値型は
//! 絶対値と有効桁数に上限がある。ここで範囲と精度（小数第 2 位まで）を
//! 検証しておき、ストアに書けない値をユースケースの入口で弾く。

use crate::DomainError;

/// 金額（値オブジェクト）
///
/// 有限で、絶対値が [`Money::MAX_ABS`] 以下、小数第 2 位までの値だけを保持する。
///
/// ```rust
/// use roomiez_domain::money::Money;
///
/// assert_eq!(Money::new(-12.5).unwrap().value(), -12.5);
/// assert!(Money::new(1e130).is_err());
/// assert!(Money::new(0.125).is_err());
/// assert!(Money::positive(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Money(f64);

impl Money {
    /// 受け付ける金額の絶対値の上限
    pub const MAX_ABS: f64 = 1_000_000_000_000.0;

    /// 符号を問わない金額を作成する
    ///
    /// # バリデーション
    ///
    /// - NaN・無限大ではない
    /// - 絶対値が [`Money::MAX_ABS`] 以下
    /// - 小数第 2 位まで
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::Validation(
                "Amount must be a finite number".to_string(),
            ));
        }

        if value.abs() > Self::MAX_ABS {
            return Err(DomainError::Validation(format!(
                "Amount must be between -{max} and {max}",
                max = Self::MAX_ABS
            )));
        }

        // 小数第 2 位までの入力は、100 倍して丸めて戻すと元の値と一致する
        if (value * 100.0).round() / 100.0 != value {
            return Err(DomainError::Validation(
                "Amount must have at most 2 decimal places".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 正の金額を作成する（立替・精算用）
    pub fn positive(value: f64) -> Result<Self, DomainError> {
        let money = Self::new(value)?;
        if money.0 <= 0.0 {
            return Err(DomainError::Validation(
                "Amount must be a positive number".to_string(),
            ));
        }
        Ok(money)
    }

    /// 数値を取得する
    pub fn value(self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::整数(100.0)]
    #[case::小数第1位(12.5)]
    #[case::小数第2位(0.07)]
    #[case::負の値(-2.5)]
    #[case::ゼロ(0.0)]
    #[case::上限(1_000_000_000_000.0)]
    #[case::下限(-1_000_000_000_000.0)]
    fn test_範囲内で小数第2位までの金額を受け入れる(#[case] value: f64) {
        assert_eq!(Money::new(value).unwrap().value(), value);
    }

    #[rstest]
    #[case::nan(f64::NAN, "Amount must be a finite number")]
    #[case::無限大(f64::INFINITY, "Amount must be a finite number")]
    #[case::ストアの上限超過(1e130, "Amount must be between -1000000000000 and 1000000000000")]
    #[case::上限超過(1_000_000_000_000.01, "Amount must be between -1000000000000 and 1000000000000")]
    #[case::負の上限超過(-1e13, "Amount must be between -1000000000000 and 1000000000000")]
    #[case::小数第3位(0.125, "Amount must have at most 2 decimal places")]
    #[case::極小値(1e-200, "Amount must have at most 2 decimal places")]
    fn test_範囲外や精度超過の金額を拒否する(#[case] value: f64, #[case] expected: &str) {
        let result = Money::new(value);

        assert!(matches!(result, Err(DomainError::Validation(ref m)) if m == expected));
    }

    #[rstest]
    #[case::ゼロ(0.0)]
    #[case::負の値(-5.0)]
    fn test_positiveは0以下を拒否する(#[case] value: f64) {
        let result = Money::positive(value);

        assert!(
            matches!(result, Err(DomainError::Validation(ref m)) if m == "Amount must be a positive number")
        );
    }
}
