//! Symmetric rules for the reference triangle `(0, 0), (1, 0), (0, 1)`.

use crate::{Error, Rule};

/// Returns a triangle rule that integrates polynomials of total degree `strength` exactly.
///
/// Strengths 0 through 4 are available.
pub fn triangle(strength: usize) -> Result<Rule<2>, Error> {
    match strength {
        0 | 1 => Ok((vec![0.5], vec![[1.0 / 3.0, 1.0 / 3.0]])),
        2 => {
            let w = 1.0 / 6.0;
            Ok((
                vec![w, w, w],
                vec![[1.0 / 6.0, 1.0 / 6.0], [2.0 / 3.0, 1.0 / 6.0], [1.0 / 6.0, 2.0 / 3.0]],
            ))
        }
        3 | 4 => {
            // Dunavant's 6-point rule, weights scaled to the reference area 1/2
            let a = 0.445948490915965;
            let wa = 0.5 * 0.223381589678011;
            let b = 0.091576213509771;
            let wb = 0.5 * 0.109951743655322;
            Ok((
                vec![wa, wa, wa, wb, wb, wb],
                vec![
                    [a, a],
                    [1.0 - 2.0 * a, a],
                    [a, 1.0 - 2.0 * a],
                    [b, b],
                    [1.0 - 2.0 * b, b],
                    [b, 1.0 - 2.0 * b],
                ],
            ))
        }
        _ => Err(Error::NoRuleAvailable),
    }
}
