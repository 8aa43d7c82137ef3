//! Convolution kernels
//!
//! One-dimensional kernels for separable filtering. A kernel of length
//! `2 * radius + 1` is centred on its middle element; position `i` of the
//! kernel weights the input sample at offset `i - radius`.

use crate::{FilterError, FilterResult};

/// A 1-D symmetric-support convolution kernel
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    /// Half-width; the kernel holds `2 * radius + 1` values
    radius: u32,
    /// Kernel weights, offset `-radius` first
    data: Vec<f64>,
}

impl Kernel {
    /// Create a zero kernel with the given half-width.
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            data: vec![0.0; 2 * radius as usize + 1],
        }
    }

    /// Create a kernel from its weights.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidKernel` if the length is even or any
    /// weight is not finite.
    pub fn from_slice(data: &[f64]) -> FilterResult<Self> {
        if data.len() % 2 == 0 {
            return Err(FilterError::InvalidKernel(format!(
                "kernel length must be odd, got {}",
                data.len()
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(FilterError::InvalidKernel(
                "kernel weights must be finite".into(),
            ));
        }
        Ok(Self {
            radius: (data.len() / 2) as u32,
            data: data.to_vec(),
        })
    }

    /// Identity kernel (single weight 1).
    pub fn identity() -> Self {
        Self {
            radius: 0,
            data: vec![1.0],
        }
    }

    /// Create a normalized Gaussian kernel.
    ///
    /// Weights are `exp(-i² / 2σ²)` for `i` in `-radius..=radius`, scaled to
    /// sum to 1.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidParameters` if `sigma` is not a positive
    /// finite number.
    pub fn gaussian(sigma: f64, radius: u32) -> FilterResult<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(FilterError::InvalidParameters(format!(
                "gaussian sigma must be positive and finite, got {sigma}"
            )));
        }
        let denom = 2.0 * sigma * sigma;
        let r = radius as i64;
        let data = (-r..=r)
            .map(|i| (-((i * i) as f64) / denom).exp())
            .collect();
        let mut kernel = Self { radius, data };
        kernel.normalize();
        Ok(kernel)
    }

    /// Gaussian kernel truncated at `ceil(3σ)`.
    pub fn gaussian_auto(sigma: f64) -> FilterResult<Self> {
        let radius = if sigma.is_finite() && sigma > 0.0 {
            (3.0 * sigma).ceil().max(1.0) as u32
        } else {
            0
        };
        Self::gaussian(sigma, radius)
    }

    /// Half-width of the kernel.
    #[inline]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Number of weights.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: a kernel has at least one weight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Kernel weights, offset `-radius` first.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Weight at signed offset from the centre.
    #[inline]
    pub fn get(&self, offset: i32) -> Option<f64> {
        let i = offset as i64 + self.radius as i64;
        if i < 0 {
            return None;
        }
        self.data.get(i as usize).copied()
    }

    /// Set the weight at signed offset from the centre.
    ///
    /// Offsets beyond the radius are ignored.
    #[inline]
    pub fn set(&mut self, offset: i32, value: f64) {
        let i = offset as i64 + self.radius as i64;
        if i >= 0 {
            if let Some(v) = self.data.get_mut(i as usize) {
                *v = value;
            }
        }
    }

    /// Normalize the kernel so that values sum to 1.
    ///
    /// A kernel whose sum is near zero is left unchanged.
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum.abs() < 1e-12 {
            return;
        }
        for v in &mut self.data {
            *v /= sum;
        }
    }

    /// Sum of all kernel values.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_normalized_and_symmetric() {
        let k = Kernel::gaussian(1.5, 4).unwrap();
        assert_eq!(k.len(), 9);
        assert!((k.sum() - 1.0).abs() < 1e-12);
        for i in 1..=4 {
            assert_eq!(k.get(i), k.get(-i));
        }
        assert!(k.get(0).unwrap() > k.get(1).unwrap());
        assert_eq!(k.get(5), None);
    }

    #[test]
    fn test_gaussian_auto_radius() {
        assert_eq!(Kernel::gaussian_auto(1.0).unwrap().radius(), 3);
        assert_eq!(Kernel::gaussian_auto(0.1).unwrap().radius(), 1);
        assert!(Kernel::gaussian_auto(0.0).is_err());
        assert!(Kernel::gaussian(f64::NAN, 2).is_err());
    }

    #[test]
    fn test_from_slice() {
        assert!(Kernel::from_slice(&[1.0, 1.0]).is_err());
        let mut k = Kernel::from_slice(&[1.0, 2.0, 1.0]).unwrap();
        assert_eq!(k.radius(), 1);
        k.normalize();
        assert_eq!(k.get(0), Some(0.5));
        k.set(-1, 0.0);
        assert_eq!(k.data(), &[0.0, 0.5, 0.25]);
    }
}
