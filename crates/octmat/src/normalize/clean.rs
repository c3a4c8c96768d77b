//! Dtype cleanup: rewrites an array so its element type has a MAT
//! representation, or rejects it.

use tracing::debug;

use super::{normalize, NormalizeError};
use crate::array::{ArrayData, ArrayError, DType, DTypeKind, NdArray, TimeUnit};
use crate::mat_value::{CellArray, MatObject, MatValue};

/// Imaginary part given to all-real complex arrays so the encoder keeps
/// them complex.
const IMAG_EPSILON: f64 = 1e-9;

fn unsupported(dtype: &DType) -> NormalizeError {
    NormalizeError::UnsupportedDatatype(*dtype)
}

/// Cleans up `array` for the MAT encoder.
///
/// Extended-precision floats and complex, untagged records, `float128` and
/// `complex256` fail with [`NormalizeError::UnsupportedDatatype`]. Booleans
/// become int8, microsecond timestamps become uint64, strings become object
/// arrays, all-real complex arrays get a tiny imaginary part, object arrays
/// with more than one dimension are transposed, and with
/// `convert_to_float` integer and boolean arrays become float64.
pub fn clean_array(array: NdArray, convert_to_float: bool) -> Result<MatValue, NormalizeError> {
    let dtype = *array.dtype();
    match (dtype.kind(), dtype.itemsize()) {
        (DTypeKind::Complex, 24) | (DTypeKind::Float, 12) => return Err(unsupported(&dtype)),
        (DTypeKind::Void, _) if array.class_name().is_none() => return Err(unsupported(&dtype)),
        _ => {}
    }

    // Storage is native-endian, so these rules match every byte order.
    let mut array = match dtype.kind() {
        DTypeKind::Bool => array.astype(DType::int(1))?,
        DTypeKind::DateTime | DTypeKind::TimeDelta
            if dtype.unit() == Some(TimeUnit::Microsecond) =>
        {
            array.astype(DType::uint(8))?
        }
        DTypeKind::Bytes | DTypeKind::Unicode => array.astype(DType::object())?,
        DTypeKind::Complex if all_real(&array) => {
            let mut array = array;
            array.set_imag(IMAG_EPSILON);
            array
        }
        _ => array,
    };

    if array.dtype().is_quad_precision() {
        return Err(unsupported(array.dtype()));
    }
    if array.dtype().kind() == DTypeKind::Object && array.ndim() > 1 {
        array = array.transpose();
    }
    if convert_to_float
        && matches!(
            array.dtype().kind(),
            DTypeKind::UInt | DTypeKind::Int | DTypeKind::Bool
        )
    {
        array = array.astype(DType::float(8))?;
    }
    if array.dtype() != &dtype {
        debug!(from = %dtype, to = %array.dtype(), "array dtype rewritten");
    }

    into_mat_value(array, convert_to_float)
}

fn all_real(array: &NdArray) -> bool {
    match array.data() {
        ArrayData::Complex(values) => values.iter().all(|c| c.im == 0.0),
        _ => false,
    }
}

/// Object arrays become cells and tagged records become objects; their
/// elements are normalized in turn.
fn into_mat_value(array: NdArray, convert_to_float: bool) -> Result<MatValue, NormalizeError> {
    let (dtype, shape, data, class_name) = array.into_parts();
    match data {
        ArrayData::Object(values) => {
            let cells = values
                .iter()
                .map(|v| normalize(v, convert_to_float))
                .collect::<Result<Vec<_>, _>>()?;
            let count = cells.len();
            let expected = shape.iter().product();
            match CellArray::with_shape(shape.clone(), cells) {
                Some(cell) => Ok(MatValue::Cell(cell)),
                None => Err(ArrayError::ShapeMismatch {
                    shape,
                    expected,
                    actual: count,
                }
                .into()),
            }
        }
        ArrayData::Record { fields, rows } => {
            let class_name = class_name.ok_or_else(|| unsupported(&dtype))?;
            let elements = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|v| normalize(v, convert_to_float))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MatValue::Object(MatObject {
                class_name,
                fields,
                shape,
                elements,
            }))
        }
        data => Ok(MatValue::Array(NdArray::new(dtype, shape, data)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{ByteOrder, Complex64};
    use crate::Value;

    fn clean(array: NdArray) -> Result<MatValue, NormalizeError> {
        clean_array(array, false)
    }

    fn cleaned_array(array: NdArray, convert_to_float: bool) -> NdArray {
        match clean_array(array, convert_to_float).unwrap() {
            MatValue::Array(array) => array,
            other => panic!("expected array, got {other:?}"),
        }
    }

    fn float_array(itemsize: usize) -> NdArray {
        NdArray::new(DType::float(itemsize), vec![2], ArrayData::Float(vec![1.0, 2.0])).unwrap()
    }

    fn complex_array(itemsize: usize, values: Vec<Complex64>) -> NdArray {
        let len = values.len();
        NdArray::new(DType::complex(itemsize), vec![len], ArrayData::Complex(values)).unwrap()
    }

    #[test]
    fn extended_precision_fails() {
        for array in [
            float_array(12),
            float_array(16),
            complex_array(24, vec![Complex64::new(1.0, 1.0)]),
            complex_array(32, vec![Complex64::new(1.0, 1.0)]),
        ] {
            let dtype = *array.dtype();
            assert_eq!(clean(array.clone()), Err(NormalizeError::UnsupportedDatatype(dtype)));
            assert_eq!(
                clean_array(array, true),
                Err(NormalizeError::UnsupportedDatatype(dtype))
            );
        }
    }

    #[test]
    fn float128_error_names_the_dtype() {
        let err = clean(float_array(16)).unwrap_err();
        assert_eq!(err.to_string(), "Datatype not supported: float128");
    }

    #[test]
    fn untagged_record_fails_and_tagged_record_is_object() {
        let record = NdArray::new(
            DType::void(16),
            vec![1],
            ArrayData::Record {
                fields: vec!["a".into(), "b".into()],
                rows: vec![vec![Value::Int(1), Value::from("x")]],
            },
        )
        .unwrap();
        assert!(matches!(
            clean(record.clone()),
            Err(NormalizeError::UnsupportedDatatype(_))
        ));

        let MatValue::Object(object) = clean(record.with_class_name("Point")).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(object.class_name, "Point");
        assert_eq!(object.fields, vec!["a", "b"]);
        assert_eq!(object.elements[0][1], MatValue::Char("x".into()));
    }

    #[test]
    fn bool_becomes_int8() {
        let out = cleaned_array(NdArray::from_bools(vec![true, false, true]), false);
        assert_eq!(out.dtype(), &DType::int(1));
        assert_eq!(out.data(), &ArrayData::Int(vec![1, 0, 1]));
    }

    #[test]
    fn bool_with_float_flag_becomes_float64() {
        let out = cleaned_array(NdArray::from_bools(vec![true, false]), true);
        assert_eq!(out.dtype(), &DType::float(8));
        assert_eq!(out.data(), &ArrayData::Float(vec![1.0, 0.0]));
    }

    #[test]
    fn microsecond_timestamps_become_uint64() {
        for dtype in [
            DType::datetime(TimeUnit::Microsecond),
            DType::timedelta(TimeUnit::Microsecond),
        ] {
            let data = if dtype.kind() == DTypeKind::DateTime {
                ArrayData::DateTime(vec![1_000_000, 2])
            } else {
                ArrayData::TimeDelta(vec![1_000_000, 2])
            };
            let out = cleaned_array(NdArray::new(dtype, vec![2], data).unwrap(), false);
            assert_eq!(out.dtype(), &DType::uint(8));
            assert_eq!(out.data(), &ArrayData::UInt(vec![1_000_000, 2]));
        }
    }

    #[test]
    fn nanosecond_timestamps_are_left_alone() {
        let array = NdArray::new(
            DType::datetime(TimeUnit::Nanosecond),
            vec![1],
            ArrayData::DateTime(vec![5]),
        )
        .unwrap();
        let out = cleaned_array(array, true);
        assert_eq!(out.dtype(), &DType::datetime(TimeUnit::Nanosecond));
    }

    #[test]
    fn strings_become_cells() {
        let out = clean(NdArray::from_strings(vec!["ab".into(), "c".into()])).unwrap();
        let cell = out.as_cell().unwrap();
        assert_eq!(cell.shape(), &[2]);
        assert_eq!(cell.cells()[0], MatValue::Char("ab".into()));
    }

    #[test]
    fn byte_strings_become_cells() {
        let array = NdArray::new(
            DType::bytes(2),
            vec![1],
            ArrayData::Bytes(vec![b"ok".to_vec()]),
        )
        .unwrap();
        let out = clean(array).unwrap();
        assert_eq!(out.as_cell().unwrap().cells()[0], MatValue::Char("ok".into()));
    }

    #[test]
    fn all_real_complex_gets_tiny_imaginary_part() {
        let array = complex_array(16, vec![Complex64::new(1.0, 0.0), Complex64::new(-2.0, 0.0)]);
        let out = cleaned_array(array, false);
        let ArrayData::Complex(values) = out.data() else {
            panic!("expected complex storage");
        };
        for (c, re) in values.iter().zip([1.0, -2.0]) {
            assert_eq!(c.re, re);
            assert!(c.im != 0.0);
            assert!((c.im - 0.0).abs() <= 1e-9);
        }
    }

    #[test]
    fn big_endian_all_real_complex_is_perturbed_too() {
        let array = NdArray::new(
            DType::complex(16).with_byte_order(ByteOrder::Big),
            vec![1],
            ArrayData::Complex(vec![Complex64::new(3.0, 0.0)]),
        )
        .unwrap();
        let out = cleaned_array(array, false);
        assert_eq!(out.data(), &ArrayData::Complex(vec![Complex64::new(3.0, 1e-9)]));
    }

    #[test]
    fn big_endian_microsecond_timestamps_become_uint64() {
        let dtype = DType::datetime(TimeUnit::Microsecond).with_byte_order(ByteOrder::Big);
        let array = NdArray::new(dtype, vec![1], ArrayData::DateTime(vec![42])).unwrap();
        let out = cleaned_array(array, false);
        assert_eq!(out.dtype(), &DType::uint(8));
        assert_eq!(out.data(), &ArrayData::UInt(vec![42]));
    }

    #[test]
    fn complex_with_imaginary_part_is_untouched() {
        let values = vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 2.0)];
        let out = cleaned_array(complex_array(16, values.clone()), false);
        assert_eq!(out.data(), &ArrayData::Complex(values));
    }

    #[test]
    fn object_matrix_is_transposed() {
        let values = (0..6).map(Value::Int).collect();
        let array = NdArray::from_objects(values).reshape(vec![2, 3]).unwrap();
        let out = clean(array).unwrap();
        let cell = out.as_cell().unwrap();
        assert_eq!(cell.shape(), &[3, 2]);
        assert_eq!(
            cell.cells()[1].as_array().unwrap().data(),
            &ArrayData::Int(vec![3])
        );
    }

    #[test]
    fn integer_arrays_follow_the_float_flag() {
        let ints = NdArray::from_i64(vec![1, 2]);
        assert_eq!(cleaned_array(ints.clone(), false).dtype(), &DType::int(8));
        assert_eq!(cleaned_array(ints, true).dtype(), &DType::float(8));
        let uints = NdArray::from_u64(vec![7]);
        assert_eq!(cleaned_array(uints, true).data(), &ArrayData::Float(vec![7.0]));
    }

    #[test]
    fn float32_is_kept() {
        let out = cleaned_array(float_array(4), true);
        assert_eq!(out.dtype(), &DType::float(4));
    }
}
