use matrixcompare::assert_scalar_eq;
use surfem_quadrature::integrate;
use surfem_quadrature::univariate::gauss;

fn monomial_integral(alpha: i32) -> f64 {
    (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0)
}

#[test]
fn gauss_rules_integrate_monomials_exactly() {
    for n in 1..=20 {
        let rule = gauss(n);
        assert_eq!(rule.0.len(), n);
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=(2 * n as i32 - 1) {
            let estimated = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(estimated, monomial_integral(alpha), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn two_point_rule() {
    let (weights, points) = gauss(2);
    assert_eq!(weights, vec![1.0, 1.0]);
    assert_scalar_eq!(points[1][0], 1.0 / 3f64.sqrt(), comp = abs, tol = 1e-16);
    assert_eq!(points[0][0], -points[1][0]);
}

#[test]
fn gauss_rules_are_sorted_and_symmetric() {
    for n in [3, 5, 8, 13] {
        let (weights, points) = gauss(n);
        for i in 0..n {
            assert_eq!(points[i][0], -points[n - 1 - i][0]);
            assert_eq!(weights[i], weights[n - 1 - i]);
        }
        assert!(points.windows(2).all(|p| p[0][0] < p[1][0]));
    }
}

#[test]
fn gauss_rules_converge_for_smooth_integrands() {
    let exact = 2.0 * 1f64.sin();
    assert_scalar_eq!(integrate(&gauss(8), |x| x[0].cos()), exact, comp = abs, tol = 1e-14);
    let exp_exact = 1f64.exp() - (-1f64).exp();
    assert_scalar_eq!(integrate(&gauss(10), |x| x[0].exp()), exp_exact, comp = abs, tol = 1e-14);
}

#[test]
#[should_panic]
fn empty_rule_panics() {
    gauss(0);
}
