//! Legendre polynomial evaluation.
//!
//! Legendre polynomials P_n(x) are orthogonal on [-1, 1] with weight 1:
//! ∫_{-1}^{1} P_m(x) P_n(x) dx = 2/(2n+1) δ_{mn}

/// Evaluate Legendre polynomial P_n(x) using the three-term recurrence.
///
/// P_0(x) = 1, P_1(x) = x,
/// (n+1) P_{n+1}(x) = (2n+1) x P_n(x) - n P_{n-1}(x)
pub fn legendre(n: usize, x: f64) -> f64 {
    if n == 0 {
        return 1.0;
    }
    if n == 1 {
        return x;
    }

    let mut p_prev = 1.0; // P_{n-2}
    let mut p_curr = x; // P_{n-1}

    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }

    p_curr
}

/// Evaluate the derivative P'_n(x).
///
/// P'_n(x) = n (x P_n(x) - P_{n-1}(x)) / (x² - 1) for |x| != 1, with the
/// boundary values P'_n(±1) = (±1)^{n+1} n(n+1)/2.
pub fn legendre_derivative(n: usize, x: f64) -> f64 {
    if n == 0 {
        return 0.0;
    }

    if (x - 1.0).abs() < 1e-14 {
        return (n * (n + 1)) as f64 / 2.0;
    }
    if (x + 1.0).abs() < 1e-14 {
        let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
        return sign * (n * (n + 1)) as f64 / 2.0;
    }

    let p_n = legendre(n, x);
    let p_n_minus_1 = legendre(n - 1, x);

    n as f64 * (x * p_n - p_n_minus_1) / (x * x - 1.0)
}

/// Evaluate both P_n(x) and P'_n(x) from a single recurrence pass.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    if n == 1 {
        return (x, 1.0);
    }

    let mut p_prev = 1.0; // P_0
    let mut p_curr = x; // P_1

    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }

    let p_n = p_curr;
    let p_n_minus_1 = p_prev;

    let dp_n = if (x - 1.0).abs() < 1e-14 {
        (n * (n + 1)) as f64 / 2.0
    } else if (x + 1.0).abs() < 1e-14 {
        let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
        sign * (n * (n + 1)) as f64 / 2.0
    } else {
        n as f64 * (x * p_n - p_n_minus_1) / (x * x - 1.0)
    };

    (p_n, dp_n)
}

/// Antiderivative ∫_{-1}^{x} P_n(s) ds.
///
/// From the recurrence (2n+1) P_n = P'_{n+1} - P'_{n-1}:
/// ∫ P_n = (P_{n+1} - P_{n-1}) / (2n+1) for n ≥ 1, and ∫ P_0 = x + 1.
/// The lower limit contributes nothing for n ≥ 1 since P_{n+1}(-1) = P_{n-1}(-1).
pub fn legendre_antiderivative(n: usize, x: f64) -> f64 {
    if n == 0 {
        return x + 1.0;
    }
    (legendre(n + 1, x) - legendre(n - 1, x)) / (2 * n + 1) as f64
}
