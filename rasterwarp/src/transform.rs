//! Capacité de transformation de coordonnées entre deux CRS

use crate::WarpError;

/// Transformation ponctuelle (x, y) d'un CRS vers un autre
pub trait CoordinateTransform {
    /// Transforme un point, en échec hors du domaine de validité
    fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), WarpError>;

    /// Transforme un lot de points en place.
    ///
    /// Les points en échec sont remplacés par `(NaN, NaN)`.
    fn transform_batch(&self, coords: &mut [(f64, f64)]) {
        for c in coords.iter_mut() {
            *c = self
                .transform_point(c.0, c.1)
                .unwrap_or((f64::NAN, f64::NAN));
        }
    }

    /// Vrai si la transformation ne modifie aucune coordonnée
    fn is_identity(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shift(f64);

    impl CoordinateTransform for Shift {
        fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), WarpError> {
            if x < 0.0 {
                return Err(WarpError::transform(x, y, "negative"));
            }
            Ok((x + self.0, y))
        }
    }

    #[test]
    fn test_default_batch() {
        let mut coords = vec![(1.0, 2.0), (-1.0, 2.0)];
        Shift(10.0).transform_batch(&mut coords);
        assert_eq!(coords[0], (11.0, 2.0));
        assert!(coords[1].0.is_nan() && coords[1].1.is_nan());
        assert!(!Shift(0.0).is_identity());
    }
}
