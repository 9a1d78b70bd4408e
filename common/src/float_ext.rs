/// Tolerance-based comparison for values produced by reordered floating-point summation.
pub trait FloatExt: Copy {
    /// True when `self` and `other` differ by at most `rel_tol` relative to the larger
    /// magnitude, or by at most `rel_tol` absolutely when both are near zero.
    fn relative_eq(self, other: Self, rel_tol: Self) -> bool;
}

impl FloatExt for f32 {
    fn relative_eq(self, other: Self, rel_tol: Self) -> bool {
        let scale = self.abs().max(other.abs()).max(1.0);
        (self - other).abs() <= rel_tol * scale
    }
}

impl FloatExt for f64 {
    fn relative_eq(self, other: Self, rel_tol: Self) -> bool {
        let scale = self.abs().max(other.abs()).max(1.0);
        (self - other).abs() <= rel_tol * scale
    }
}
