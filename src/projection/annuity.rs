//! Annuity payment and monthly compounding helpers

/// Fixed monthly payment that amortizes `loan_amount` over `months` at an
/// annual nominal rate given in percent.
///
/// A zero rate falls back to straight-line repayment `loan_amount / months`.
pub fn monthly_annuity_payment(loan_amount: f64, annual_rate_pct: f64, months: usize) -> f64 {
    if months == 0 {
        return 0.0;
    }

    let r = annual_rate_pct / 100.0 / 12.0;
    if r == 0.0 {
        return loan_amount / months as f64;
    }

    let discount = match i32::try_from(months) {
        Ok(n) => (1.0 + r).powi(-n),
        Err(_) => (1.0 + r).powf(-(months as f64)),
    };
    loan_amount * r / (1.0 - discount)
}

/// Monthly interest on a balance at an annual rate in percent
pub fn monthly_interest(balance: f64, annual_rate_pct: f64) -> f64 {
    balance * (annual_rate_pct / 12.0 / 100.0)
}

/// Growth factor after `month` months of monthly compounding at an annual
/// percentage: (1 + pct/12/100)^month
pub fn compound_factor(annual_pct: f64, month: u32) -> f64 {
    let base = 1.0 + annual_pct / 12.0 / 100.0;
    match i32::try_from(month) {
        Ok(n) => base.powi(n),
        Err(_) => base.powf(f64::from(month)),
    }
}
