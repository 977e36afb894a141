//! Conversions between [`DynamicArray`] and `ndarray::ArrayD`.

use ndarray::{ArrayD, IxDyn};

use super::dynamic::{DynamicArray, DynamicElement};
use super::errors::{Error, Result};

impl DynamicArray {
    /// Copy a numeric array of element type `T` into an `ArrayD<T>` of the
    /// same shape.
    pub fn to_ndarray<T: DynamicElement>(&self) -> Result<ArrayD<T>> {
        let values = self.as_slice::<T>().ok_or_else(|| {
            Error::TypeMismatch(format!("expected {} elements, found {}", T::TYPE, self.element_type()))
        })?;
        ArrayD::from_shape_vec(IxDyn(self.shape()), values.to_vec()).map_err(|e| Error::TypeMismatch(e.to_string()))
    }
}

impl<T: DynamicElement> TryFrom<ArrayD<T>> for DynamicArray {
    type Error = Error;

    /// Elements are taken in logical (row-major) order whatever the
    /// array's memory layout.
    fn try_from(array: ArrayD<T>) -> Result<Self> {
        let shape = array.shape().to_vec();
        let values: Vec<T> = array.iter().copied().collect();
        DynamicArray::from_shape_vec(shape, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::dynamic::DynamicType;

    #[test]
    fn image_shaped_round_trip() {
        let a = DynamicArray::from_shape_vec(vec![2, 3, 4], (0..24).map(|i| i as f64).collect()).unwrap();
        let nd = a.to_ndarray::<f64>().unwrap();
        assert_eq!(nd.shape(), &[2, 3, 4]);
        assert_eq!(nd[[1, 2, 3]], 23.0);
        assert_eq!(DynamicArray::try_from(nd).unwrap(), a);
    }

    #[test]
    fn transposed_view_keeps_logical_order() {
        let nd = ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1i32, 2, 3, 4, 5, 6]).unwrap();
        let t = nd.t().to_owned();
        let a = DynamicArray::try_from(t).unwrap();
        assert_eq!(a.shape(), &[3, 2]);
        assert_eq!(a.as_slice::<i32>().unwrap(), &[1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn wrong_element_type() {
        let a = DynamicArray::from_vec(vec![1u16, 2]);
        assert!(matches!(a.to_ndarray::<i16>(), Err(Error::TypeMismatch(_))));
        let nested = DynamicArray::nested(DynamicType::Int16, Vec::new());
        assert!(nested.to_ndarray::<i16>().is_err());
    }
}
