/// Folds one more rating into a running mean.
///
/// The result is kept at full precision; rounding is a presentation concern.
pub fn fold_rating(average: f64, count: i32, rating: u8) -> f64 {
    let count = f64::from(count.max(0));
    (average * count + f64::from(rating)) / (count + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold_all(ratings: &[u8]) -> (f64, i32) {
        ratings
            .iter()
            .fold((0.0, 0), |(avg, count), &r| (fold_rating(avg, count, r), count + 1))
    }

    #[test]
    fn test_fold_is_order_independent() {
        for order in [[5, 3, 4], [3, 4, 5], [4, 5, 3], [5, 4, 3], [3, 5, 4], [4, 3, 5]] {
            let (avg, count) = fold_all(&order);
            assert_eq!(count, 3);
            assert!((avg - 4.0).abs() < f64::EPSILON, "order {:?} gave {}", order, avg);
        }
    }

    #[test]
    fn test_fold_keeps_precision() {
        let (avg, _) = fold_all(&[5, 4, 4]);
        assert!((avg - 13.0 / 3.0).abs() < 1e-12);
    }
}
