//! Generic genetic operators over fixed-length chromosomes.
//!
//! # Crossover Operators
//!
//! - [`two_point_crossover`]: swap an inclusive segment between two parents
//!
//! # References
//!
//! - De Jong (1975), *An Analysis of the Behavior of a Class of Genetic
//!   Adaptive Systems*
//! - Spears & De Jong (1991), "An Analysis of Multi-Point Crossover"

use rand::Rng;

/// Two-point crossover.
///
/// Picks two cut points, orders them, and swaps the inclusive gene range
/// between the parents. Genes outside the range are inherited unchanged, so
/// both children keep the parents' length.
///
/// # Complexity
/// O(n) time, O(n) space
///
/// # Panics
/// Panics if parents have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use u_timetable::ga::operators::two_point_crossover;
/// use u_timetable::random::create_rng;
///
/// let mut rng = create_rng(7);
/// let (a, b) = two_point_crossover(&[0; 6], &[1; 6], &mut rng);
/// assert_eq!(a.len(), 6);
/// assert!(a.iter().zip(&b).all(|(x, y)| x + y == 1));
/// ```
pub fn two_point_crossover<T: Clone, R: Rng>(
    parent1: &[T],
    parent2: &[T],
    rng: &mut R,
) -> (Vec<T>, Vec<T>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    assert!(n > 0, "parents must not be empty");

    let (start, end) = random_segment(n, rng);
    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();
    child1[start..=end].clone_from_slice(&parent2[start..=end]);
    child2[start..=end].clone_from_slice(&parent1[start..=end]);
    (child1, child2)
}

/// Random inclusive segment `[start, end]` of a length-`n` chromosome.
///
/// # Panics
/// Panics if `n == 0`.
pub fn random_segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    (a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_segment_ordered_and_in_range() {
        let mut rng = create_rng(42);
        for _ in 0..500 {
            let (s, e) = random_segment(20, &mut rng);
            assert!(s <= e);
            assert!(e < 20);
        }
    }

    #[test]
    fn test_children_complementary() {
        let p1: Vec<u32> = (0..20).collect();
        let p2: Vec<u32> = (100..120).collect();
        let mut rng = create_rng(42);
        for _ in 0..100 {
            let (c1, c2) = two_point_crossover(&p1, &p2, &mut rng);
            assert_eq!(c1.len(), 20);
            assert_eq!(c2.len(), 20);
            for i in 0..20 {
                // Each position comes from one parent and its sibling got the other.
                assert!(
                    (c1[i] == p1[i] && c2[i] == p2[i]) || (c1[i] == p2[i] && c2[i] == p1[i])
                );
            }
        }
    }

    #[test]
    fn test_swapped_range_is_contiguous() {
        let p1 = vec![0u8; 10];
        let p2 = vec![1u8; 10];
        let mut rng = create_rng(3);
        for _ in 0..100 {
            let (c1, _) = two_point_crossover(&p1, &p2, &mut rng);
            let first = c1.iter().position(|&g| g == 1).unwrap();
            let last = c1.iter().rposition(|&g| g == 1).unwrap();
            assert!(c1[first..=last].iter().all(|&g| g == 1));
        }
    }

    #[test]
    fn test_single_gene() {
        let mut rng = create_rng(1);
        let (c1, c2) = two_point_crossover(&["a"], &["b"], &mut rng);
        assert_eq!(c1, vec!["b"]);
        assert_eq!(c2, vec!["a"]);
    }

    #[test]
    #[should_panic(expected = "parents must have equal length")]
    fn test_length_mismatch_panics() {
        let mut rng = create_rng(1);
        two_point_crossover(&[1, 2], &[1], &mut rng);
    }
}
